use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::compression::{decompress, DecodeError};
use super::domain::{ApplicantId, CanonicalApplicantRecord};
use super::repository::{fields, tables, Filter, RecordStore, RecordUpdate, StoreError};

/// Rebuilds an applicant's linked child records from a compressed payload.
///
/// Not a true transaction: each mutating step pushes its inverse onto a
/// compensation list, and on failure the inverses run in reverse order,
/// best-effort. Concurrent restores of the same applicant are not mutually
/// exclusive and may interleave.
pub struct RestoreOrchestrator<S> {
    store: Arc<S>,
}

/// Counts of records created by a successful restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub personal_details: usize,
    pub work_experience: usize,
    pub salary_preferences: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("decompression failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("restoration failed, soft-deleted records reactivated: {0}")]
    Store(#[from] StoreError),
    #[error("restoration failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Inverse of one mutating step, replayed in reverse on failure.
enum Compensation {
    Reactivate {
        table: &'static str,
        ids: Vec<String>,
    },
    SoftDelete {
        table: &'static str,
        id: String,
    },
}

impl<S: RecordStore> RestoreOrchestrator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn restore(
        &self,
        applicant_id: &ApplicantId,
        payload: &str,
    ) -> Result<RestoreReport, RestoreError> {
        let record = decompress(payload)?;

        let mut undo = Vec::new();
        match self.replace_children(applicant_id, &record, &mut undo) {
            Ok(report) => Ok(report),
            Err(error) => {
                tracing::warn!(applicant = %applicant_id, %error, "restore failed, rolling back");
                self.rollback(undo);
                Err(error)
            }
        }
    }

    fn replace_children(
        &self,
        applicant_id: &ApplicantId,
        record: &CanonicalApplicantRecord,
        undo: &mut Vec<Compensation>,
    ) -> Result<RestoreReport, RestoreError> {
        for table in tables::APPLICANT_CHILDREN {
            let deactivated = self.soft_delete_existing(table, applicant_id)?;
            if !deactivated.is_empty() {
                undo.push(Compensation::Reactivate {
                    table,
                    ids: deactivated,
                });
            }
        }

        let mut report = RestoreReport::default();

        let personal = linked_fields(serde_json::to_value(&record.personal)?, applicant_id);
        let created = self.store.create(tables::PERSONAL_DETAILS, personal)?;
        undo.push(Compensation::SoftDelete {
            table: tables::PERSONAL_DETAILS,
            id: created.id,
        });
        report.personal_details = 1;

        for entry in &record.experience {
            let experience = linked_fields(serde_json::to_value(entry)?, applicant_id);
            let created = self.store.create(tables::WORK_EXPERIENCE, experience)?;
            undo.push(Compensation::SoftDelete {
                table: tables::WORK_EXPERIENCE,
                id: created.id,
            });
            report.work_experience += 1;
        }

        let compensation = linked_fields(serde_json::to_value(&record.compensation)?, applicant_id);
        let created = self.store.create(tables::SALARY_PREFERENCES, compensation)?;
        undo.push(Compensation::SoftDelete {
            table: tables::SALARY_PREFERENCES,
            id: created.id,
        });
        report.salary_preferences = 1;

        Ok(report)
    }

    /// Mark the applicant's existing records in one table inactive, returning
    /// the affected record ids.
    fn soft_delete_existing(
        &self,
        table: &'static str,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<String>, StoreError> {
        let existing = self.store.list(
            table,
            Some(&Filter::equals(
                fields::APPLICANT_LINK,
                applicant_id.0.clone(),
            )),
            None,
        )?;

        if existing.is_empty() {
            return Ok(Vec::new());
        }

        let updates: Vec<RecordUpdate> = existing
            .iter()
            .map(|record| RecordUpdate {
                id: record.id.clone(),
                fields: inactive_fields(true),
            })
            .collect();
        self.store.batch_update(table, updates)?;

        Ok(existing.into_iter().map(|record| record.id).collect())
    }

    /// Replay compensations in reverse order. Failures are logged and skipped
    /// so the remaining inverses still run.
    fn rollback(&self, undo: Vec<Compensation>) {
        for compensation in undo.into_iter().rev() {
            let outcome = match compensation {
                Compensation::Reactivate { table, ids } => {
                    let updates = ids
                        .into_iter()
                        .map(|id| RecordUpdate {
                            id,
                            fields: inactive_fields(false),
                        })
                        .collect();
                    self.store.batch_update(table, updates).map(|_| ())
                }
                Compensation::SoftDelete { table, id } => self
                    .store
                    .update(table, &id, inactive_fields(true))
                    .map(|_| ()),
            };

            if let Err(error) = outcome {
                tracing::warn!(%error, "rollback step failed, continuing");
            }
        }
    }
}

fn linked_fields(value: Value, applicant_id: &ApplicantId) -> Map<String, Value> {
    let mut fields_map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    fields_map.insert(
        fields::APPLICANT_LINK.to_string(),
        json!([applicant_id.0.clone()]),
    );
    fields_map
}

fn inactive_fields(inactive: bool) -> Map<String, Value> {
    let mut fields_map = Map::new();
    fields_map.insert(fields::INACTIVE.to_string(), Value::Bool(inactive));
    fields_map
}
