//! # QuackHub Core
//!
//! Core business logic for the QuackHub symptom desk.
//!
//! This crate contains the request pipeline and its stores:
//! - Prompt construction from patient intake
//! - Keyword and severity based emergency classification
//! - The SQLite primary store and the sharded YAML response archive
//! - The analysis orchestrator and the read-side records service
//!
//! **No API concerns**: HTTP routing, wire types and status codes belong in `api-rest` and
//! `api-shared`.

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod intake;
pub mod model;
pub mod prompt;
pub mod records;
pub mod stores;
pub mod timefmt;

pub use analysis::{AnalysisError, AnalysisOutcome, AnalysisService, AnalysisStage};
pub use classifier::{
    classify, parse_severity, EmergencyPredicate, EmergencySignal, KeywordClassifier,
};
pub use config::{CoreConfig, GeminiConfig};
pub use error::{ArchiveError, ModelError, StoreError, TriageError, TriageResult};
pub use intake::{Intake, IntakeForm};
pub use model::{GeminiClient, ModelClient};
pub use prompt::build_prompt;
pub use records::{symptom_preview, RecordsService, Stats};
pub use stores::{
    FileResponseArchive, QueryRecord, QueryStore, ResponseArchive, ResponseDocument,
    SqliteQueryStore, UserInfo,
};

pub use quackhub_types::NonEmptyText;
pub use quackhub_uuid::RecordId;
