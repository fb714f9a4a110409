use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for applicants in the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single normalized view every core component operates on.
///
/// Field order is fixed; the experience list is sorted most-recent-first with
/// `"present"` end dates treated as greater than any dated end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalApplicantRecord {
    pub personal: PersonalDetails,
    pub experience: Vec<ExperienceEntry>,
    pub compensation: CompensationPreferences,
    pub metadata: RecordMetadata,
}

/// Contact fields; always present, defaulting to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub linkedin: String,
}

/// A single employment entry. Dates use `YYYY-MM`; `end` may be the literal
/// `"present"` (case-insensitive). Technologies are deduplicated and sorted
/// during canonicalization so their input order never affects the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// Compensation preferences; numeric fields default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationPreferences {
    #[serde(default)]
    pub preferred_rate: f64,
    #[serde(default)]
    pub min_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub availability_hours: f64,
}

impl Default for CompensationPreferences {
    fn default() -> Self {
        Self {
            preferred_rate: 0.0,
            min_rate: 0.0,
            currency: default_currency(),
            availability_hours: 0.0,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Volatile bookkeeping excluded from fingerprinting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_experience_entries: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated_entries: Option<usize>,
}

/// Loosely structured applicant bundle as read back from the external store.
///
/// Field names mirror the store's schema; any section may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantBundle {
    #[serde(default)]
    pub personal_details: Option<PersonalFields>,
    #[serde(default)]
    pub work_experience: Vec<ExperienceFields>,
    #[serde(default)]
    pub salary_preferences: Option<SalaryFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonalFields {
    #[serde(rename = "Full Name", default)]
    pub full_name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "LinkedIn", default)]
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceFields {
    #[serde(rename = "Company", default)]
    pub company: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Start", default)]
    pub start: String,
    #[serde(rename = "End", default)]
    pub end: String,
    #[serde(rename = "Technologies", default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalaryFields {
    #[serde(rename = "Preferred Rate", default)]
    pub preferred_rate: f64,
    #[serde(rename = "Min Rate", default)]
    pub min_rate: f64,
    #[serde(rename = "Currency", default)]
    pub currency: Option<String>,
    #[serde(rename = "Availability", default)]
    pub availability: f64,
}

/// Shortlisting rule as supplied by the external store. Immutable for the
/// duration of one evaluation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortlistRule {
    pub id: String,
    pub criterion: String,
    pub rule: String,
    pub points: u32,
    pub active: bool,
    pub description: String,
}

/// Rule fields as stored externally; the record id is attached separately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFields {
    #[serde(rename = "Criterion", default)]
    pub criterion: String,
    #[serde(rename = "Rule", default)]
    pub rule: String,
    #[serde(rename = "Points", default)]
    pub points: u32,
    #[serde(rename = "Active", default)]
    pub active: bool,
    #[serde(rename = "Description", default)]
    pub description: String,
}

impl ShortlistRule {
    pub fn from_fields(id: String, fields: RuleFields) -> Self {
        Self {
            id,
            criterion: fields.criterion,
            rule: fields.rule,
            points: fields.points,
            active: fields.active,
            description: fields.description,
        }
    }
}

/// Intake form payload for creating a new applicant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeSubmission {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub linkedin: String,
}
