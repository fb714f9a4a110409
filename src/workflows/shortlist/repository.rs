use serde_json::{Map, Value};

/// Table names in the external store's base schema.
pub mod tables {
    pub const APPLICANTS: &str = "Applicants";
    pub const PERSONAL_DETAILS: &str = "Personal Details";
    pub const WORK_EXPERIENCE: &str = "Work Experience";
    pub const SALARY_PREFERENCES: &str = "Salary Preferences";
    pub const SHORTLIST_RULES: &str = "Shortlist Rules";
    pub const SHORTLISTED_LEADS: &str = "Shortlisted Leads";
    pub const EVALUATION_HISTORY: &str = "Evaluation History";

    /// Child tables linked to an applicant, in restore order.
    pub const APPLICANT_CHILDREN: [&str; 3] =
        [PERSONAL_DETAILS, WORK_EXPERIENCE, SALARY_PREFERENCES];
}

/// Well-known field names shared across tables.
pub mod fields {
    pub const APPLICANT_LINK: &str = "Applicant ID";
    pub const INACTIVE: &str = "Inactive";
    pub const STATUS: &str = "Status";
    pub const STORED_DIGEST: &str = "Last Hash";
    pub const COMPRESSED_PAYLOAD: &str = "Compressed JSON";
    pub const ACTIVE: &str = "Active";
}

/// Opaque record handed back by the external store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Typed filter tree replacing free-text store formulas.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(String, Value),
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals(field.into(), value.into())
    }

    pub fn and(clauses: Vec<Filter>) -> Self {
        Self::And(clauses)
    }

    /// Reference matching semantics for in-memory store implementations.
    /// Link fields stored as arrays match when they contain the value.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Self::Equals(field, expected) => match fields.get(field) {
                Some(Value::Array(items)) => items.contains(expected),
                Some(actual) => actual == expected,
                None => false,
            },
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(fields)),
        }
    }
}

/// Batched field update addressed by record id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Narrow contract over the external record store. Treated as opaque,
/// possibly slow, possibly failing I/O; the core holds no cross-request state.
pub trait RecordStore: Send + Sync {
    fn create(&self, table: &str, fields: Map<String, Value>) -> Result<StoredRecord, StoreError>;
    fn get(&self, table: &str, id: &str) -> Result<StoredRecord, StoreError>;
    fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<StoredRecord, StoreError>;
    fn list(
        &self,
        table: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> Result<Vec<StoredRecord>, StoreError>;
    fn batch_update(
        &self,
        table: &str,
        updates: Vec<RecordUpdate>,
    ) -> Result<Vec<StoredRecord>, StoreError>;
}

/// Store failure taxonomy; retried or surfaced as structured failures, never
/// allowed past the core boundary as a panic.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record {id} not found in {table}")]
    NotFound { table: String, id: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected request: {0}")]
    Rejected(String),
}
