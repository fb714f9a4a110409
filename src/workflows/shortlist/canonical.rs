use std::cmp::Ordering;

use chrono::Utc;

use super::domain::{
    ApplicantBundle, CanonicalApplicantRecord, CompensationPreferences, ExperienceEntry,
    PersonalDetails, RecordMetadata,
};

/// Build the canonical shape from a loosely structured bundle.
///
/// Never fails: missing sections collapse to empty-string / zero defaults.
pub fn canonicalize(bundle: &ApplicantBundle) -> CanonicalApplicantRecord {
    let personal = bundle
        .personal_details
        .as_ref()
        .map(|fields| PersonalDetails {
            full_name: fields.full_name.clone(),
            email: fields.email.clone(),
            location: fields.location.clone(),
            linkedin: fields.linkedin.clone(),
        })
        .unwrap_or_default();

    let mut experience: Vec<ExperienceEntry> = bundle
        .work_experience
        .iter()
        .map(|fields| {
            let mut technologies = fields.technologies.clone();
            technologies.sort();
            technologies.dedup();
            ExperienceEntry {
                company: fields.company.clone(),
                title: fields.title.clone(),
                start: fields.start.clone(),
                end: fields.end.clone(),
                technologies,
            }
        })
        .collect();
    experience.sort_by(|a, b| compare_end_descending(&a.end, &b.end));

    let compensation = bundle
        .salary_preferences
        .as_ref()
        .map(|fields| CompensationPreferences {
            preferred_rate: fields.preferred_rate,
            min_rate: fields.min_rate,
            currency: fields
                .currency
                .clone()
                .filter(|currency| !currency.is_empty())
                .unwrap_or_else(|| "USD".to_string()),
            availability_hours: fields.availability,
        })
        .unwrap_or_default();

    let metadata = RecordMetadata {
        generated_at: Utc::now(),
        total_experience_entries: experience.len(),
        truncated_entries: None,
    };

    CanonicalApplicantRecord {
        personal,
        experience,
        compensation,
        metadata,
    }
}

/// Ordering key for experience end dates. An ongoing engagement sorts as the
/// most recent; `YYYY-MM` strings compare chronologically via their lexical order.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum EndKey<'a> {
    Dated(&'a str),
    Present,
}

fn end_key(end: &str) -> EndKey<'_> {
    if end.eq_ignore_ascii_case("present") {
        EndKey::Present
    } else {
        EndKey::Dated(end)
    }
}

fn compare_end_descending(a: &str, b: &str) -> Ordering {
    end_key(b).cmp(&end_key(a))
}
