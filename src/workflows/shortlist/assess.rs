use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::domain::{ApplicantId, CanonicalApplicantRecord};
use super::repository::{tables, Filter, RecordStore, StoreError};

/// Transport to the external text-completion service. Implementations take a
/// finished prompt and return the raw response body.
pub trait CandidateEvaluator: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, EvaluatorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("evaluator transport error: {0}")]
    Transport(String),
}

/// Retry schedule for evaluator calls: `attempts` tries with exponential
/// backoff (base, 2x base, 4x base, ...). Tests inject a zero base delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Validated structured assessment returned by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAssessment {
    pub summary: String,
    pub score: f64,
    pub follow_ups: Vec<String>,
}

/// Assessment plus call bookkeeping for history records.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentOutcome {
    pub assessment: CandidateAssessment,
    pub attempts: u32,
    pub tokens_estimated: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("evaluator call failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: EvaluatorError,
    },
    #[error("invalid evaluator response: {0}")]
    InvalidResponse(String),
    #[error("prompt serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Wraps a [`CandidateEvaluator`] with prompt construction, retry, and strict
/// response validation.
pub struct AssessmentClient<E> {
    evaluator: Arc<E>,
    policy: RetryPolicy,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    summary: String,
    score: f64,
    #[serde(default)]
    follow_ups: Vec<String>,
}

impl<E: CandidateEvaluator> AssessmentClient<E> {
    pub fn new(evaluator: Arc<E>, policy: RetryPolicy, provider: String, model: String) -> Self {
        Self {
            evaluator,
            policy,
            provider,
            model,
        }
    }

    pub fn assess(
        &self,
        record: &CanonicalApplicantRecord,
    ) -> Result<AssessmentOutcome, AssessmentError> {
        let prompt = build_prompt(record);
        let (content, attempts) = self.complete_with_retry(&prompt)?;
        let assessment = parse_response(&content)?;

        Ok(AssessmentOutcome {
            assessment,
            attempts,
            tokens_estimated: estimate_tokens(&prompt, &content),
        })
    }

    fn complete_with_retry(&self, prompt: &str) -> Result<(String, u32), AssessmentError> {
        let mut attempt = 0;
        loop {
            match self.evaluator.complete(prompt) {
                Ok(content) => return Ok((content, attempt + 1)),
                Err(source) => {
                    attempt += 1;
                    if attempt >= self.policy.attempts {
                        return Err(AssessmentError::Exhausted {
                            attempts: attempt,
                            source,
                        });
                    }
                    let delay = self.policy.delay(attempt - 1);
                    tracing::warn!(%source, attempt, ?delay, "evaluator call failed, retrying");
                    thread::sleep(delay);
                }
            }
        }
    }
}

/// Structured prompt over the canonical record, limited to the five most
/// recent experience entries.
fn build_prompt(record: &CanonicalApplicantRecord) -> String {
    let mut experience_text = String::new();
    for (index, entry) in record.experience.iter().take(5).enumerate() {
        experience_text.push_str(&format!(
            "{}. {} at {} ({} - {})\n",
            index + 1,
            entry.title,
            entry.company,
            entry.start,
            if entry.end.is_empty() {
                "Present"
            } else {
                &entry.end
            }
        ));
        if !entry.technologies.is_empty() {
            experience_text.push_str(&format!(
                "   Technologies: {}\n",
                entry.technologies.join(", ")
            ));
        }
    }
    if experience_text.is_empty() {
        experience_text = "No work experience provided.".to_string();
    }

    format!(
        "Analyze the following job applicant profile and provide a structured evaluation.\n\n\
         APPLICANT PROFILE:\n\
         Name: {}\n\
         Location: {}\n\
         Email: {}\n\
         LinkedIn: {}\n\n\
         WORK EXPERIENCE:\n{}\n\
         SALARY PREFERENCES:\n\
         - Preferred Rate: ${}/hr ({})\n\
         - Minimum Rate: ${}/hr\n\
         - Availability: {} hours/week\n\n\
         EVALUATION INSTRUCTIONS:\n\
         1. Write a concise 100-word summary of the applicant's qualifications\n\
         2. Assign a score from 0-10 based on experience, skills, and market fit\n\
         3. Generate up to 3 relevant follow-up questions to ask this applicant\n\n\
         Return your evaluation as JSON with keys \"summary\", \"score\", and \"follow_ups\".",
        record.personal.full_name,
        record.personal.location,
        record.personal.email,
        record.personal.linkedin,
        experience_text,
        record.compensation.preferred_rate,
        record.compensation.currency,
        record.compensation.min_rate,
        record.compensation.availability_hours,
    )
}

fn parse_response(content: &str) -> Result<CandidateAssessment, AssessmentError> {
    let raw: RawAssessment = serde_json::from_str(content.trim())
        .map_err(|error| AssessmentError::InvalidResponse(error.to_string()))?;

    if raw.summary.len() < 10 {
        return Err(AssessmentError::InvalidResponse(
            "summary must be at least 10 characters".to_string(),
        ));
    }
    if !(0.0..=10.0).contains(&raw.score) {
        return Err(AssessmentError::InvalidResponse(
            "score must be between 0 and 10".to_string(),
        ));
    }
    if raw.follow_ups.len() > 3 {
        return Err(AssessmentError::InvalidResponse(
            "follow_ups must contain at most 3 items".to_string(),
        ));
    }

    Ok(CandidateAssessment {
        summary: raw.summary,
        score: raw.score,
        follow_ups: raw.follow_ups,
    })
}

/// Rough usage estimate: one token per four characters.
fn estimate_tokens(prompt: &str, response: &str) -> usize {
    (prompt.len() + response.len()) / 4
}

/// Versioned assessment history backed by the record store.
pub struct AssessmentHistory<S> {
    store: Arc<S>,
}

impl<S: RecordStore> AssessmentHistory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist one successful assessment alongside its change-detection digest
    /// and usage bookkeeping.
    pub fn record(
        &self,
        applicant_id: &ApplicantId,
        outcome: &AssessmentOutcome,
        digest: &str,
        provider: &str,
        model: &str,
    ) -> Result<String, StoreError> {
        let mut fields_map = Map::new();
        fields_map.insert(
            "Applicant ID".to_string(),
            json!([applicant_id.0.clone()]),
        );
        fields_map.insert(
            "Summary".to_string(),
            Value::String(outcome.assessment.summary.clone()),
        );
        fields_map.insert("Score".to_string(), json!(outcome.assessment.score));
        fields_map.insert(
            "Follow Up Questions".to_string(),
            json!(outcome.assessment.follow_ups),
        );
        fields_map.insert("Data Hash".to_string(), Value::String(digest.to_string()));
        fields_map.insert("Provider".to_string(), Value::String(provider.to_string()));
        fields_map.insert("Model".to_string(), Value::String(model.to_string()));
        fields_map.insert("Tokens Used".to_string(), json!(outcome.tokens_estimated));
        fields_map.insert("Success".to_string(), Value::Bool(true));
        fields_map.insert(
            "Timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let created = self.store.create(tables::EVALUATION_HISTORY, fields_map)?;
        Ok(created.id)
    }

    /// Most recent successful assessment for an applicant, if any.
    pub fn latest(&self, applicant_id: &ApplicantId) -> Result<Option<StoredAssessment>, StoreError> {
        let filter = Filter::and(vec![
            Filter::equals("Applicant ID", applicant_id.0.clone()),
            Filter::equals("Success", true),
        ]);
        let mut records = self
            .store
            .list(tables::EVALUATION_HISTORY, Some(&filter), None)?;

        records.sort_by(|a, b| {
            let a_ts = a.field_str("Timestamp").unwrap_or_default();
            let b_ts = b.field_str("Timestamp").unwrap_or_default();
            b_ts.cmp(a_ts)
        });

        Ok(records.into_iter().next().map(|record| StoredAssessment {
            summary: record.field_str("Summary").unwrap_or_default().to_string(),
            score: record
                .fields
                .get("Score")
                .and_then(Value::as_f64)
                .unwrap_or_default(),
            digest: record.field_str("Data Hash").unwrap_or_default().to_string(),
            timestamp: record.field_str("Timestamp").unwrap_or_default().to_string(),
        }))
    }
}

/// Historical assessment snapshot as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAssessment {
    pub summary: String,
    pub score: f64,
    pub digest: String,
    pub timestamp: String,
}
