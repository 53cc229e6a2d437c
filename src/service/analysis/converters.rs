//! Converters from extracted LLM models to domain models

use crate::model::extracted::{ExtractedAnalysis, ExtractedPoint, ExtractedScore};
use crate::model::{AnalysisResult, Score, ScoredPoint};

pub fn convert_analysis(extracted: ExtractedAnalysis) -> AnalysisResult {
    AnalysisResult {
        summary: extracted.summary,
        evaluation: extracted.evaluation,
        pros: extracted.pros.into_iter().map(convert_point).collect(),
        cons: extracted.cons.into_iter().map(convert_point).collect(),
    }
}

pub fn convert_point(extracted: ExtractedPoint) -> ScoredPoint {
    ScoredPoint {
        description: extracted.description,
        source: extracted.source,
        score: convert_score(extracted.score),
    }
}

pub fn convert_score(extracted: ExtractedScore) -> Score {
    match extracted {
        ExtractedScore::Low => Score::Low,
        ExtractedScore::Medium => Score::Medium,
        ExtractedScore::High => Score::High,
    }
}
