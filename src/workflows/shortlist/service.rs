use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::config::AppConfig;

use super::assess::{
    AssessmentClient, AssessmentHistory, AssessmentOutcome, CandidateEvaluator, RetryPolicy,
};
use super::canonical::canonicalize;
use super::compression::{BoundedCompressor, CompressError, CompressionOutcome};
use super::domain::{
    ApplicantBundle, ApplicantId, ExperienceFields, IntakeSubmission, PersonalFields, RuleFields,
    SalaryFields, ShortlistRule,
};
use super::evaluation::{EvaluationConfig, ScoreEngine, ScoreResult};
use super::repository::{fields, tables, Filter, RecordStore, StoreError};
use super::restore::{RestoreOrchestrator, RestoreReport};

/// Tunables for the service facade, normally derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ShortlistSettings {
    pub max_payload_bytes: usize,
    pub minimum_score: u32,
    pub retry: RetryPolicy,
    pub provider: String,
    pub model: String,
}

impl Default for ShortlistSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 102_400,
            minimum_score: 2,
            retry: RetryPolicy::default(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl From<&AppConfig> for ShortlistSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_payload_bytes: config.pipeline.max_payload_bytes,
            minimum_score: config.pipeline.minimum_score,
            retry: RetryPolicy {
                attempts: config.evaluator.max_retries,
                base_delay: config.evaluator.retry_base_delay,
            },
            provider: config.evaluator.provider.clone(),
            model: config.evaluator.model.clone(),
        }
    }
}

/// Facade composing canonicalization, the change gate, bounded compression,
/// external assessment, and rule-based shortlisting over one applicant.
///
/// Stateless between invocations; the change gate and write-back are separate
/// store calls, so concurrent processing of one applicant may do redundant
/// (but not corrupting) work.
pub struct ShortlistService<S, E> {
    store: Arc<S>,
    assessor: AssessmentClient<E>,
    history: AssessmentHistory<S>,
    compressor: BoundedCompressor,
    engine: ScoreEngine,
}

/// Structured outcome of one processing request.
#[derive(Debug)]
pub struct ProcessingReport {
    pub applicant_id: ApplicantId,
    pub changed: bool,
    pub compression: CompressionOutcome,
    pub assessment: Option<AssessmentOutcome>,
    pub assessment_error: Option<String>,
    pub shortlist: Option<ShortlistOutcome>,
}

/// Scoring outcome plus the created lead, when the score qualified.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortlistOutcome {
    pub score: ScoreResult,
    pub lead_id: Option<String>,
    pub rules_evaluated: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("no compressed payload stored for applicant {0}")]
    NoStoredPayload(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Compress(#[from] CompressError),
    #[error(transparent)]
    Restore(#[from] super::restore::RestoreError),
    #[error("stored record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl<S, E> ShortlistService<S, E>
where
    S: RecordStore + 'static,
    E: CandidateEvaluator + 'static,
{
    pub fn new(store: Arc<S>, evaluator: Arc<E>, settings: ShortlistSettings) -> Self {
        let assessor = AssessmentClient::new(
            evaluator,
            settings.retry.clone(),
            settings.provider.clone(),
            settings.model.clone(),
        );
        Self {
            history: AssessmentHistory::new(store.clone()),
            store,
            assessor,
            compressor: BoundedCompressor::new(settings.max_payload_bytes),
            engine: ScoreEngine::new(EvaluationConfig {
                minimum_score: settings.minimum_score,
            }),
        }
    }

    /// Create the applicant record and its personal-details child.
    pub fn intake(&self, submission: &IntakeSubmission) -> Result<ApplicantId, ProcessingError> {
        if submission.full_name.is_empty() {
            return Err(ProcessingError::MissingField("full_name"));
        }
        if submission.email.is_empty() {
            return Err(ProcessingError::MissingField("email"));
        }

        let mut applicant = Map::new();
        applicant.insert("Name".to_string(), json!(submission.full_name));
        applicant.insert(fields::STATUS.to_string(), json!("Pending"));
        applicant.insert(fields::STORED_DIGEST.to_string(), json!(""));
        let created = self.store.create(tables::APPLICANTS, applicant)?;
        let applicant_id = ApplicantId(created.id);

        let mut personal = Map::new();
        personal.insert(
            fields::APPLICANT_LINK.to_string(),
            json!([applicant_id.0.clone()]),
        );
        personal.insert("Full Name".to_string(), json!(submission.full_name));
        personal.insert("Email".to_string(), json!(submission.email));
        personal.insert("Location".to_string(), json!(submission.location));
        personal.insert("LinkedIn".to_string(), json!(submission.linkedin));
        self.store.create(tables::PERSONAL_DETAILS, personal)?;

        tracing::info!(applicant = %applicant_id, "applicant intake complete");
        Ok(applicant_id)
    }

    /// Run the full pipeline for one applicant: canonicalize, gate on the
    /// stored digest, compress, assess, and score. Assessment failures are
    /// reported but never fail the request.
    pub fn process(&self, applicant_id: &ApplicantId) -> Result<ProcessingReport, ProcessingError> {
        let applicant = self.store.get(tables::APPLICANTS, &applicant_id.0)?;
        let stored_digest = applicant
            .field_str(fields::STORED_DIGEST)
            .unwrap_or_default()
            .to_string();

        let bundle = self.load_bundle(applicant_id)?;
        let record = canonicalize(&bundle);

        let compression = self.compressor.compress(
            &record,
            (!stored_digest.is_empty()).then_some(stored_digest.as_str()),
        )?;

        if !compression.changed {
            tracing::debug!(applicant = %applicant_id, "content unchanged, skipping downstream work");
            return Ok(ProcessingReport {
                applicant_id: applicant_id.clone(),
                changed: false,
                compression,
                assessment: None,
                assessment_error: None,
                shortlist: None,
            });
        }

        let payload = compression.payload.clone().unwrap_or_default();
        let mut updates = Map::new();
        updates.insert(fields::COMPRESSED_PAYLOAD.to_string(), json!(payload));
        updates.insert(fields::STORED_DIGEST.to_string(), json!(compression.digest));
        updates.insert(fields::STATUS.to_string(), json!("Processed"));
        self.store
            .update(tables::APPLICANTS, &applicant_id.0, updates)?;

        let (assessment, assessment_error) = match self.assessor.assess(&record) {
            Ok(outcome) => {
                let mut updates = Map::new();
                updates.insert(
                    "LLM Summary".to_string(),
                    json!(outcome.assessment.summary),
                );
                updates.insert("LLM Score".to_string(), json!(outcome.assessment.score));
                self.store
                    .update(tables::APPLICANTS, &applicant_id.0, updates)?;
                self.history.record(
                    applicant_id,
                    &outcome,
                    &compression.digest,
                    &self.assessor.provider,
                    &self.assessor.model,
                )?;
                (Some(outcome), None)
            }
            Err(error) => {
                tracing::warn!(applicant = %applicant_id, %error, "assessment failed, continuing");
                (None, Some(error.to_string()))
            }
        };

        let rules = self.active_rules()?;
        let shortlist = if rules.is_empty() {
            tracing::warn!(applicant = %applicant_id, "no active shortlisting rules found");
            None
        } else {
            let score = self.engine.score(&record, &rules);
            let lead_id = if score.qualified {
                Some(self.create_lead(applicant_id, &payload, &score)?)
            } else {
                None
            };
            Some(ShortlistOutcome {
                rules_evaluated: rules.len(),
                score,
                lead_id,
            })
        };

        Ok(ProcessingReport {
            applicant_id: applicant_id.clone(),
            changed: true,
            compression,
            assessment,
            assessment_error,
            shortlist,
        })
    }

    /// Rebuild linked child records from the stored compressed payload.
    pub fn restore(&self, applicant_id: &ApplicantId) -> Result<RestoreReport, ProcessingError> {
        let applicant = self.store.get(tables::APPLICANTS, &applicant_id.0)?;
        let payload = applicant
            .field_str(fields::COMPRESSED_PAYLOAD)
            .filter(|payload| !payload.is_empty())
            .ok_or_else(|| ProcessingError::NoStoredPayload(applicant_id.0.clone()))?;

        let orchestrator = RestoreOrchestrator::new(self.store.clone());
        Ok(orchestrator.restore(applicant_id, payload)?)
    }

    fn load_bundle(&self, applicant_id: &ApplicantId) -> Result<ApplicantBundle, ProcessingError> {
        let link = Filter::equals(fields::APPLICANT_LINK, applicant_id.0.clone());

        let personal_details = self
            .store
            .list(tables::PERSONAL_DETAILS, Some(&link), None)?
            .into_iter()
            .next()
            .map(|record| serde_json::from_value::<PersonalFields>(Value::Object(record.fields)))
            .transpose()?;

        let work_experience = self
            .store
            .list(tables::WORK_EXPERIENCE, Some(&link), None)?
            .into_iter()
            .map(|record| serde_json::from_value::<ExperienceFields>(Value::Object(record.fields)))
            .collect::<Result<Vec<_>, _>>()?;

        let salary_preferences = self
            .store
            .list(tables::SALARY_PREFERENCES, Some(&link), None)?
            .into_iter()
            .next()
            .map(|record| serde_json::from_value::<SalaryFields>(Value::Object(record.fields)))
            .transpose()?;

        Ok(ApplicantBundle {
            personal_details,
            work_experience,
            salary_preferences,
        })
    }

    /// Active rules from the external store; malformed rule records are
    /// skipped with a warning rather than failing the evaluation.
    fn active_rules(&self) -> Result<Vec<ShortlistRule>, ProcessingError> {
        let filter = Filter::equals(fields::ACTIVE, true);
        let records = self
            .store
            .list(tables::SHORTLIST_RULES, Some(&filter), None)?;

        let mut rules = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<RuleFields>(Value::Object(record.fields)) {
                Ok(rule_fields) => rules.push(ShortlistRule::from_fields(record.id, rule_fields)),
                Err(error) => {
                    tracing::warn!(rule = %record.id, %error, "skipping malformed rule record");
                }
            }
        }
        Ok(rules)
    }

    fn create_lead(
        &self,
        applicant_id: &ApplicantId,
        payload: &str,
        score: &ScoreResult,
    ) -> Result<String, ProcessingError> {
        let mut lead = Map::new();
        lead.insert("Applicant".to_string(), json!([applicant_id.0.clone()]));
        lead.insert(fields::COMPRESSED_PAYLOAD.to_string(), json!(payload));
        lead.insert("Score".to_string(), json!(score.total_score));
        lead.insert("Score Reason".to_string(), json!(score.rationale));
        lead.insert("Created At".to_string(), json!(Utc::now().to_rfc3339()));

        let created = self.store.create(tables::SHORTLISTED_LEADS, lead)?;
        tracing::info!(
            applicant = %applicant_id,
            lead = %created.id,
            total_score = score.total_score,
            "applicant shortlisted"
        );
        Ok(created.id)
    }
}
