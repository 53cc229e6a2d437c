pub mod analysis;
pub mod chat;
pub mod config;
pub mod content;
pub mod extracted;

pub use analysis::{AnalysisResult, Classification, PointSide, Score, ScoredPoint};
pub use chat::{AskOutcome, ChatRole, ChatTurn, GroundingSource, PendingEscalation};
pub use config::{Config, LimitsConfig, ModelConfig, SessionConfig};
pub use content::{CanonicalContent, ContentPart, DocumentInput, UploadedFile};
