//! Core library for the applicant shortlisting pipeline.
//!
//! The crate canonicalizes loosely structured applicant bundles, detects content
//! changes through stable fingerprints, produces size-bounded compressed payloads
//! for storage, and scores applicants against externally managed shortlisting
//! rules. Durable storage and the text-completion evaluator are collaborators
//! reached through the traits in [`workflows::shortlist::repository`] and
//! [`workflows::shortlist::assess`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
