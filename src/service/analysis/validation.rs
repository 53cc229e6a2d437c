//! Quality checks for LLM-produced analyses
//!
//! Runs after the response has been parsed into the required shape. Findings
//! are warnings only: they are logged and never fail the analysis.

use crate::model::{AnalysisResult, ScoredPoint};

/// Result of analysis validation
#[derive(Debug, Default)]
pub struct AnalysisValidationResult {
    pub warnings: Vec<String>,
}

impl AnalysisValidationResult {
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Check an analysis against the document it was produced from
///
/// `document_text` is `None` for binary documents, in which case quotes
/// cannot be checked.
pub fn validate_analysis(
    analysis: &AnalysisResult,
    document_text: Option<&str>,
) -> AnalysisValidationResult {
    let mut result = AnalysisValidationResult::default();

    if analysis.summary.trim().is_empty() {
        result.add_warning("Analysis summary is empty".to_string());
    }
    if analysis.evaluation.trim().is_empty() {
        result.add_warning("Analysis evaluation is empty".to_string());
    }

    let normalized_document = document_text.map(normalize_whitespace);

    for (label, points) in [("Pro", &analysis.pros), ("Con", &analysis.cons)] {
        for (i, point) in points.iter().enumerate() {
            check_point(label, i, point, normalized_document.as_deref(), &mut result);
        }
    }

    result
}

fn check_point(
    label: &str,
    index: usize,
    point: &ScoredPoint,
    document: Option<&str>,
    result: &mut AnalysisValidationResult,
) {
    if point.description.trim().is_empty() {
        result.add_warning(format!("{} {} has an empty description", label, index + 1));
    }

    if point.source.trim().is_empty() {
        result.add_warning(format!("{} {} has no source quote", label, index + 1));
        return;
    }

    if let Some(document) = document
        && !document.contains(&normalize_whitespace(&point.source))
    {
        result.add_warning(format!(
            "{} {} source '{}' not found in document",
            label,
            index + 1,
            point.source.chars().take(80).collect::<String>()
        ));
    }
}

/// Lowercase and collapse whitespace runs so line wrapping does not matter
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
