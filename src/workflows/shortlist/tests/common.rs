use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Map, Value};

use crate::workflows::shortlist::assess::{CandidateEvaluator, EvaluatorError, RetryPolicy};
use crate::workflows::shortlist::canonical::canonicalize;
use crate::workflows::shortlist::domain::{
    ApplicantBundle, ApplicantId, CanonicalApplicantRecord, ExperienceFields, PersonalFields,
    SalaryFields, ShortlistRule,
};
use crate::workflows::shortlist::repository::{
    fields, tables, Filter, RecordStore, RecordUpdate, StoreError, StoredRecord,
};
use crate::workflows::shortlist::service::{ShortlistService, ShortlistSettings};

pub(super) fn sample_bundle() -> ApplicantBundle {
    ApplicantBundle {
        personal_details: Some(PersonalFields {
            full_name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            location: "New York, NY".to_string(),
            linkedin: "https://linkedin.com/in/johndoe".to_string(),
        }),
        work_experience: vec![
            ExperienceFields {
                company: "Startup Inc".to_string(),
                title: "Full Stack Developer".to_string(),
                start: "2021-03".to_string(),
                end: "2021-12".to_string(),
                technologies: vec![
                    "Node.js".to_string(),
                    "MongoDB".to_string(),
                    "Vue.js".to_string(),
                ],
            },
            ExperienceFields {
                company: "Tech Corp".to_string(),
                title: "Software Engineer".to_string(),
                start: "2022-01".to_string(),
                end: "2023-12".to_string(),
                technologies: vec![
                    "Python".to_string(),
                    "JavaScript".to_string(),
                    "React".to_string(),
                ],
            },
        ],
        salary_preferences: Some(SalaryFields {
            preferred_rate: 95.0,
            min_rate: 75.0,
            currency: Some("USD".to_string()),
            availability: 40.0,
        }),
    }
}

pub(super) fn canonical_record() -> CanonicalApplicantRecord {
    canonicalize(&sample_bundle())
}

pub(super) fn large_bundle(entries: usize) -> ApplicantBundle {
    let mut bundle = sample_bundle();
    bundle.work_experience = (0..entries)
        .map(|index| ExperienceFields {
            company: format!("Company {index} {}", "x".repeat(400)),
            title: format!("Position {index} {}", "y".repeat(400)),
            start: format!("20{:02}-01", index % 20),
            end: format!("20{:02}-12", index % 20),
            technologies: (0..8).map(|tech| format!("Technology-{index}-{tech}")).collect(),
        })
        .collect();
    bundle
}

pub(super) fn rule(id: &str, criterion: &str, expression: &str, points: u32) -> ShortlistRule {
    ShortlistRule {
        id: id.to_string(),
        criterion: criterion.to_string(),
        rule: expression.to_string(),
        points,
        active: true,
        description: String::new(),
    }
}

pub(super) fn settings() -> ShortlistSettings {
    ShortlistSettings {
        retry: RetryPolicy {
            attempts: 3,
            base_delay: Duration::ZERO,
        },
        ..ShortlistSettings::default()
    }
}

pub(super) fn build_service(
    responses: Vec<Result<String, EvaluatorError>>,
) -> (
    ShortlistService<MemoryStore, ScriptedEvaluator>,
    Arc<MemoryStore>,
    Arc<ScriptedEvaluator>,
) {
    let store = Arc::new(MemoryStore::default());
    let evaluator = Arc::new(ScriptedEvaluator::with_responses(responses));
    let service = ShortlistService::new(store.clone(), evaluator.clone(), settings());
    (service, store, evaluator)
}

pub(super) fn valid_assessment_json() -> String {
    json!({
        "summary": "Seasoned full-stack engineer with strong Python background.",
        "score": 8.5,
        "follow_ups": ["What drew you to this role?"]
    })
    .to_string()
}

/// Seed an applicant with linked child records mirroring [`sample_bundle`].
pub(super) fn seed_applicant(store: &MemoryStore) -> ApplicantId {
    let mut applicant = Map::new();
    applicant.insert("Name".to_string(), json!("John Doe"));
    applicant.insert(fields::STATUS.to_string(), json!("Pending"));
    applicant.insert(fields::STORED_DIGEST.to_string(), json!(""));
    let created = store
        .create(tables::APPLICANTS, applicant)
        .expect("applicant created");
    let applicant_id = ApplicantId(created.id);

    store
        .create(
            tables::PERSONAL_DETAILS,
            linked(
                json!({
                    "Full Name": "John Doe",
                    "Email": "john@example.com",
                    "Location": "New York, NY",
                    "LinkedIn": "https://linkedin.com/in/johndoe"
                }),
                &applicant_id,
            ),
        )
        .expect("personal details created");

    for experience in &sample_bundle().work_experience {
        store
            .create(
                tables::WORK_EXPERIENCE,
                linked(
                    json!({
                        "Company": experience.company,
                        "Title": experience.title,
                        "Start": experience.start,
                        "End": experience.end,
                        "Technologies": experience.technologies,
                    }),
                    &applicant_id,
                ),
            )
            .expect("experience created");
    }

    store
        .create(
            tables::SALARY_PREFERENCES,
            linked(
                json!({
                    "Preferred Rate": 95.0,
                    "Min Rate": 75.0,
                    "Currency": "USD",
                    "Availability": 40.0
                }),
                &applicant_id,
            ),
        )
        .expect("salary preferences created");

    applicant_id
}

pub(super) fn seed_rule(store: &MemoryStore, criterion: &str, expression: &str, points: u32) {
    store
        .create(
            tables::SHORTLIST_RULES,
            match json!({
                "Criterion": criterion,
                "Rule": expression,
                "Points": points,
                "Active": true,
                "Description": ""
            }) {
                Value::Object(map) => map,
                _ => unreachable!(),
            },
        )
        .expect("rule created");
}

fn linked(value: Value, applicant_id: &ApplicantId) -> Map<String, Value> {
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert(
        fields::APPLICANT_LINK.to_string(),
        json!([applicant_id.0.clone()]),
    );
    map
}

/// In-memory record store with switchable create failures per table.
#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<String, Vec<StoredRecord>>>,
    failing_creates: Mutex<HashSet<String>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub(super) fn fail_creates_in(&self, table: &str) {
        self.failing_creates
            .lock()
            .expect("store mutex poisoned")
            .insert(table.to_string());
    }

    pub(super) fn table(&self, table: &str) -> Vec<StoredRecord> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("rec-{id:04}")
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, table: &str, fields: Map<String, Value>) -> Result<StoredRecord, StoreError> {
        if self
            .failing_creates
            .lock()
            .expect("store mutex poisoned")
            .contains(table)
        {
            return Err(StoreError::Unavailable(format!(
                "create disabled for {table}"
            )));
        }

        let record = StoredRecord {
            id: self.next_id(),
            fields,
        };
        self.records
            .lock()
            .expect("store mutex poisoned")
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn get(&self, table: &str, id: &str) -> Result<StoredRecord, StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(table)
            .and_then(|records| records.iter().find(|record| record.id == id).cloned())
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })
    }

    fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<StoredRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let records = guard.get_mut(table).ok_or_else(|| StoreError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        })?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;
        record.fields.extend(fields);
        Ok(record.clone())
    }

    fn list(
        &self,
        table: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut matches: Vec<StoredRecord> = guard
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| {
                        filter
                            .map(|filter| filter.matches(&record.fields))
                            .unwrap_or(true)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    fn batch_update(
        &self,
        table: &str,
        updates: Vec<RecordUpdate>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            updated.push(self.update(table, &update.id, update.fields)?);
        }
        Ok(updated)
    }
}

/// Evaluator returning scripted responses in order; once the script is
/// exhausted it answers with a valid assessment.
pub(super) struct ScriptedEvaluator {
    responses: Mutex<VecDeque<Result<String, EvaluatorError>>>,
    calls: AtomicU32,
}

impl ScriptedEvaluator {
    pub(super) fn with_responses(responses: Vec<Result<String, EvaluatorError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl CandidateEvaluator for ScriptedEvaluator {
    fn complete(&self, _prompt: &str) -> Result<String, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.responses
            .lock()
            .expect("evaluator mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(valid_assessment_json()))
    }
}
