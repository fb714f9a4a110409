mod config;
mod criterion;

pub use config::EvaluationConfig;
pub use criterion::{
    AvailabilityTarget, Comparison, LocationTarget, ParsedRule, RuleCriterion, RuleParseError,
};

use serde::{Deserialize, Serialize};

use super::domain::{CanonicalApplicantRecord, ShortlistRule};
use super::duration;

const US_TOKENS: [&str; 4] = ["us", "usa", "united states", "america"];
const EUROPE_TOKENS: [&str; 8] = [
    "uk",
    "germany",
    "france",
    "spain",
    "italy",
    "netherlands",
    "belgium",
    "poland",
];
const FULL_TIME_HOURS: f64 = 35.0;

/// Evaluate one rule against a canonical record.
///
/// Classification and parsing happen in a dedicated step; a rejected or
/// otherwise malformed rule evaluates false without disturbing the rest of
/// the batch.
pub fn evaluate(record: &CanonicalApplicantRecord, criterion: &str, expression: &str) -> bool {
    let category = RuleCriterion::classify(criterion);
    match criterion::parse(&category, expression) {
        Ok(parsed) => apply(record, &parsed),
        Err(error) => {
            tracing::warn!(criterion, expression, %error, "rule rejected, counting as failed");
            false
        }
    }
}

fn apply(record: &CanonicalApplicantRecord, parsed: &ParsedRule) -> bool {
    match parsed {
        ParsedRule::Experience {
            required_years,
            technology,
        } => {
            let required = f64::from(*required_years);
            match technology {
                Some(tech) => duration::tech_years(&record.experience, tech) >= required,
                None => duration::total_years(&record.experience) >= required,
            }
        }
        ParsedRule::Compensation { op, threshold } => op.holds(
            record.compensation.preferred_rate,
            f64::from(*threshold),
        ),
        ParsedRule::Location(target) => {
            let location = record.personal.location.to_lowercase();
            match target {
                LocationTarget::UsOnly => {
                    US_TOKENS.iter().any(|token| location.contains(token))
                }
                LocationTarget::Remote => {
                    location.contains("remote") || location.contains("anywhere")
                }
                LocationTarget::Europe => {
                    EUROPE_TOKENS.iter().any(|token| location.contains(token))
                }
                LocationTarget::Contains(needle) => location.contains(needle),
            }
        }
        ParsedRule::Technology { needle } => record
            .experience
            .iter()
            .flat_map(|entry| entry.technologies.iter())
            .any(|tech| tech.to_lowercase().contains(needle)),
        ParsedRule::Availability(target) => {
            let hours = record.compensation.availability_hours;
            match target {
                AvailabilityTarget::Hours { op, hours: required } => {
                    op.holds(hours, f64::from(*required))
                }
                AvailabilityTarget::FullTime => hours >= FULL_TIME_HOURS,
                AvailabilityTarget::PartTime => hours < FULL_TIME_HOURS,
            }
        }
    }
}

/// Stateless aggregator applying every active rule and building the rationale.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    config: EvaluationConfig,
}

/// Aggregated outcome of one scoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: u32,
    pub possible_score: u32,
    pub matched: usize,
    pub failed: usize,
    pub rationale: String,
    pub qualified: bool,
}

impl ScoreEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    /// Score every active rule. `total_score` is the sum of matched rule
    /// points; `possible_score` sums points across all evaluated rules.
    pub fn score(&self, record: &CanonicalApplicantRecord, rules: &[ShortlistRule]) -> ScoreResult {
        let mut total_score = 0u32;
        let mut possible_score = 0u32;
        let mut matched_lines = Vec::new();
        let mut failed_lines = Vec::new();

        for rule in rules.iter().filter(|rule| rule.active) {
            possible_score += rule.points;
            let criterion = rule.criterion.to_lowercase();
            if evaluate(record, &rule.criterion, &rule.rule) {
                total_score += rule.points;
                matched_lines.push(format!("{} ({}): +{} points", criterion, rule.rule, rule.points));
            } else {
                failed_lines.push(format!("{} ({}): 0 points", criterion, rule.rule));
            }
        }

        let matched = matched_lines.len();
        let failed = failed_lines.len();
        let rationale = build_rationale(matched_lines, failed_lines, total_score, possible_score);

        ScoreResult {
            total_score,
            possible_score,
            matched,
            failed,
            rationale,
            qualified: total_score >= self.config.minimum_score,
        }
    }
}

fn build_rationale(
    matched: Vec<String>,
    failed: Vec<String>,
    total_score: u32,
    possible_score: u32,
) -> String {
    let mut parts = Vec::new();
    if !matched.is_empty() {
        parts.push("Passed criteria:".to_string());
        parts.extend(matched.into_iter().map(|line| format!("  • {line}")));
    }
    if !failed.is_empty() {
        parts.push("Failed criteria:".to_string());
        parts.extend(failed.into_iter().map(|line| format!("  • {line}")));
    }
    parts.push(format!("\nTotal Score: {total_score}/{possible_score}"));
    parts.join("\n")
}
