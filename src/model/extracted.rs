//! LLM-extractable models for classification and analysis
//!
//! Doc comments on these types become field descriptions in the response
//! schema sent to the model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Classification of a submitted document
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedClassification {
    /// True if the document is a legal contract, false otherwise.
    pub is_contract: bool,
    /// The specific type of the contract (e.g. 'Employment Contract', 'Lease Agreement'),
    /// written in the document's language. If it is not a contract, a short label
    /// describing what the document is instead.
    pub contract_type: String,
    /// The detected primary language of the document (e.g. 'Italian', 'English', 'Spanish').
    pub language: String,
}

/// Legal-risk analysis of a contract from the signatory's point of view
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedAnalysis {
    /// A brief, neutral summary of what the contract is about, in the document's language.
    pub summary: String,
    /// A synthetic evaluation of whether the contract is generally favorable or
    /// unfavorable for the signatory, in the document's language.
    pub evaluation: String,
    /// Advantages for the signatory.
    pub pros: Vec<ExtractedPoint>,
    /// Risks or disadvantages for the signatory.
    pub cons: Vec<ExtractedPoint>,
}

/// A single pro or con
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedPoint {
    /// A clear and concise summary of the point.
    pub description: String,
    /// The exact, verbatim quote from the contract that justifies the point.
    pub source: String,
    /// Importance of a benefit, or risk level of a disadvantage.
    pub score: ExtractedScore,
}

/// Three-level rating; the Italian labels are accepted on input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub enum ExtractedScore {
    #[serde(alias = "Basso")]
    Low,
    #[serde(alias = "Medio")]
    Medium,
    #[serde(alias = "Alto")]
    High,
}
