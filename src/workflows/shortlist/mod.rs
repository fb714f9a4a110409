//! Applicant shortlisting workflow: canonicalization, change detection,
//! bounded compression, restore, and rule-based qualification scoring.
//!
//! Durable state lives in the external store behind [`repository::RecordStore`];
//! every operation here is synchronous and stateless between invocations.

pub mod assess;
pub mod canonical;
pub mod compression;
pub mod domain;
pub mod duration;
pub mod evaluation;
pub mod fingerprint;
pub mod repository;
pub mod restore;
pub mod service;

#[cfg(test)]
mod tests;

pub use assess::{
    AssessmentClient, AssessmentError, AssessmentHistory, AssessmentOutcome, CandidateAssessment,
    CandidateEvaluator, EvaluatorError, RetryPolicy,
};
pub use canonical::canonicalize;
pub use compression::{
    decompress, BoundedCompressor, CompressError, CompressionOutcome, DecodeError,
};
pub use domain::{
    ApplicantBundle, ApplicantId, CanonicalApplicantRecord, CompensationPreferences,
    ExperienceEntry, IntakeSubmission, PersonalDetails, RecordMetadata, ShortlistRule,
};
pub use evaluation::{EvaluationConfig, RuleCriterion, ScoreEngine, ScoreResult};
pub use fingerprint::fingerprint;
pub use repository::{fields, tables, Filter, RecordStore, RecordUpdate, StoreError, StoredRecord};
pub use restore::{RestoreError, RestoreOrchestrator, RestoreReport};
pub use service::{
    ProcessingError, ProcessingReport, ShortlistOutcome, ShortlistService, ShortlistSettings,
};
