use std::sync::Arc;

use serde_json::Value;

use super::common::*;
use crate::workflows::shortlist::compression::BoundedCompressor;
use crate::workflows::shortlist::domain::ApplicantId;
use crate::workflows::shortlist::repository::{fields, tables, StoredRecord};
use crate::workflows::shortlist::restore::{RestoreError, RestoreOrchestrator};

fn payload_for_sample() -> String {
    BoundedCompressor::new(1024 * 1024)
        .compress(&canonical_record(), None)
        .expect("compresses")
        .payload
        .expect("payload")
}

fn inactive(record: &StoredRecord) -> Option<bool> {
    record.fields.get(fields::INACTIVE).and_then(Value::as_bool)
}

// Seeded records carry the store's capitalized field names; records written by
// a restore carry canonical snake_case names.
fn is_seeded(record: &StoredRecord) -> bool {
    record.fields.contains_key("Full Name")
        || record.fields.contains_key("Company")
        || record.fields.contains_key("Preferred Rate")
}

#[test]
fn restore_soft_deletes_existing_and_creates_fresh_records() {
    let store = Arc::new(MemoryStore::default());
    let applicant_id = seed_applicant(&store);
    let orchestrator = RestoreOrchestrator::new(store.clone());

    let report = orchestrator
        .restore(&applicant_id, &payload_for_sample())
        .expect("restore succeeds");

    assert_eq!(report.personal_details, 1);
    assert_eq!(report.work_experience, 2);
    assert_eq!(report.salary_preferences, 1);

    // prior records are marked inactive, fresh ones are live
    let personal = store.table(tables::PERSONAL_DETAILS);
    assert_eq!(personal.len(), 2);
    assert_eq!(inactive(&personal[0]), Some(true));
    assert_eq!(inactive(&personal[1]), None);
    assert_eq!(
        personal[1].field_str("full_name"),
        Some("John Doe"),
        "fresh records use canonical field names"
    );

    let experience = store.table(tables::WORK_EXPERIENCE);
    assert_eq!(experience.len(), 4);
    assert!(experience[..2].iter().all(|r| inactive(r) == Some(true)));
    assert!(experience[2..].iter().all(|r| inactive(r).is_none()));
}

#[test]
fn create_phase_failure_rolls_back_soft_deletes() {
    let store = Arc::new(MemoryStore::default());
    let applicant_id = seed_applicant(&store);
    store.fail_creates_in(tables::WORK_EXPERIENCE);
    let orchestrator = RestoreOrchestrator::new(store.clone());

    let error = orchestrator
        .restore(&applicant_id, &payload_for_sample())
        .expect_err("create phase fails");
    assert!(matches!(error, RestoreError::Store(_)));

    for table in tables::APPLICANT_CHILDREN {
        for record in store.table(table) {
            if is_seeded(&record) {
                // every soft-deleted record is reactivated
                assert_eq!(inactive(&record), Some(false), "{table} left inactive");
            } else {
                // records created before the failure are withdrawn
                assert_eq!(inactive(&record), Some(true), "{table} create not undone");
            }
        }
    }
}

#[test]
fn restore_without_prior_children_creates_records_only() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = RestoreOrchestrator::new(store.clone());

    let report = orchestrator
        .restore(&ApplicantId("rec-9999".to_string()), &payload_for_sample())
        .expect("restore succeeds");

    assert_eq!(report.personal_details, 1);
    assert_eq!(store.table(tables::PERSONAL_DETAILS).len(), 1);
}

#[test]
fn undecodable_payload_surfaces_decode_error() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = RestoreOrchestrator::new(store);

    let error = orchestrator
        .restore(&ApplicantId("rec-0000".to_string()), "garbage payload")
        .expect_err("decode fails");

    assert!(matches!(error, RestoreError::Decode(_)));
}
