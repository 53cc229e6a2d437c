//! Classification and analysis results

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of the document classification step
///
/// When `is_contract` is false, `contract_type` holds a free-form negative
/// label in the detected language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Classification {
    pub is_contract: bool,
    pub contract_type: String,
    pub language: String,
}

/// Three-level severity (for cons) or benefit (for pros) rating
///
/// Variants are declared in ascending order so `Ord` follows severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum Score {
    Low,
    Medium,
    High,
}

/// A single pro or con with its verbatim supporting quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoredPoint {
    pub description: String,
    /// Verbatim quote from the document
    pub source: String,
    pub score: Score,
}

/// Which list of an analysis a point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PointSide {
    Pros,
    Cons,
}

/// Structured verdict produced by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    pub summary: String,
    pub evaluation: String,
    pub pros: Vec<ScoredPoint>,
    pub cons: Vec<ScoredPoint>,
}

impl AnalysisResult {
    /// Copy of the result with both lists ordered for display
    pub fn sorted_for_display(&self) -> Self {
        let mut sorted = self.clone();
        sort_by_severity(&mut sorted.pros);
        sort_by_severity(&mut sorted.cons);
        sorted
    }

    /// Look up a point by list and position
    pub fn point(&self, side: PointSide, index: usize) -> Option<&ScoredPoint> {
        match side {
            PointSide::Pros => self.pros.get(index),
            PointSide::Cons => self.cons.get(index),
        }
    }
}

/// Order points High > Medium > Low, keeping the original order among equals
pub fn sort_by_severity(points: &mut [ScoredPoint]) {
    // slice::sort_by is stable
    points.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(description: &str, score: Score) -> ScoredPoint {
        ScoredPoint {
            description: description.to_string(),
            source: format!("quote for {}", description),
            score,
        }
    }

    #[test]
    fn test_sort_is_non_increasing_and_stable() {
        let mut points = vec![
            point("a", Score::Low),
            point("b", Score::High),
            point("c", Score::Medium),
            point("d", Score::High),
            point("e", Score::Low),
            point("f", Score::Medium),
        ];

        sort_by_severity(&mut points);

        let order: Vec<&str> = points.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "c", "f", "a", "e"]);
        assert!(points.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_sorted_for_display_leaves_original_untouched() {
        let result = AnalysisResult {
            summary: "s".to_string(),
            evaluation: "e".to_string(),
            pros: vec![point("p1", Score::Low), point("p2", Score::High)],
            cons: vec![],
        };

        let sorted = result.sorted_for_display();

        assert_eq!(sorted.pros[0].description, "p2");
        assert_eq!(result.pros[0].description, "p1");
        assert!(sorted.cons.is_empty());
    }

    #[test]
    fn test_point_lookup() {
        let result = AnalysisResult {
            summary: String::new(),
            evaluation: String::new(),
            pros: vec![point("p", Score::Medium)],
            cons: vec![point("c", Score::High)],
        };

        assert_eq!(result.point(PointSide::Cons, 0).map(|p| p.description.as_str()), Some("c"));
        assert!(result.point(PointSide::Pros, 1).is_none());
    }
}
