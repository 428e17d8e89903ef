//! # corefchain-core
//!
//! Shared data model for the corefchain crates.
//!
//! This crate provides:
//! - **Mentions**: `Mention`, `MentionId`, `HeadWord`
//! - **Documents**: `Document`, `Section`, `Patient`, and the `DocumentSource`
//!   lookup used by patient-level processing
//! - **Concept annotations**: `AnnotationKind`, `ConceptAnnotation`, the
//!   covering annotations consulted when clusters are typed
//!
//! Mentions are created once by the document model and never mutated; the
//! clustering crates only hold `MentionId`s or clones.

pub mod annotation;
pub mod document;
pub mod error;
pub mod mention;

pub use annotation::{AnnotationKind, ConceptAnnotation};
pub use document::{Document, DocumentSource, Patient, Section};
pub use error::{Error, Result};
pub use mention::{HeadWord, Mention, MentionId};
