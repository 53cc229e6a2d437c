//! Prompts for document classification

/// Instruction placed before the document content
pub const CLASSIFICATION_PROMPT: &str = r#"Analyze the following document.
1. Detect the primary language of the document (e.g. 'Italian', 'English').
2. Decide whether it is a legal contract.
3. If it is a contract, name its specific type in the detected language, for example
   "Employment Contract", "Contratto di Locazione", "Accord de Non-Divulgation (NDA)".
4. If it is not a legal contract, say so and describe briefly what the document is instead.
Respond ONLY with the requested JSON object."#;
