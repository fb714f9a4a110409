/// Qualification threshold for the score aggregator.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub minimum_score: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { minimum_score: 2 }
    }
}
