pub mod analysis;
pub mod chat;
pub mod classification;
pub mod docx;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod normalizer;
pub mod pipeline;
pub mod registry;

#[cfg(test)]
pub mod testing;

pub use analysis::ContractAnalyzer;
pub use chat::ChatSession;
pub use classification::DocumentClassifier;
pub use error::AnalysisError;
pub use gemini::GeminiClient;
pub use llm::{ModelClient, ModelError};
pub use normalizer::ContentNormalizer;
pub use pipeline::{PipelineController, PipelineError, PipelineSnapshot, PipelineState};
pub use registry::{RegistryConfigError, RegistryError, SessionHandle, SessionRegistry};
