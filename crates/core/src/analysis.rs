//! Request orchestration for a single symptom analysis.
//!
//! [`AnalysisService::analyze`] walks one request through the [`AnalysisStage`]s in order. The
//! two stores are written one after the other with no transaction and no retry, so a failure
//! after the primary insert leaves that record behind:
//!
//! - model failure: record persisted, flag false, no archive document.
//! - flag update failure: same as a model failure.
//! - archive failure: record persisted and correctly flagged, no archive document.

use crate::classifier::{EmergencyPredicate, KeywordClassifier};
use crate::error::TriageError;
use crate::intake::IntakeForm;
use crate::model::ModelClient;
use crate::prompt::build_prompt;
use crate::stores::{QueryStore, ResponseArchive, ResponseDocument};
use chrono::{DateTime, Local, Utc};
use quackhub_uuid::RecordId;
use std::fmt;
use std::sync::Arc;

/// Progress of one request. Failure is reachable from every stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisStage {
    Received,
    Validated,
    PrimaryPersisted,
    ModelInvoked,
    Classified,
    PrimaryUpdated,
    ArchivePersisted,
    Responded,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::PrimaryPersisted => "primary_persisted",
            Self::ModelInvoked => "model_invoked",
            Self::Classified => "classified",
            Self::PrimaryUpdated => "primary_updated",
            Self::ArchivePersisted => "archive_persisted",
            Self::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// A failed analysis.
///
/// `failed_at` is the last stage reached before the failure. `query_id` is set once the primary
/// record exists. Neither is part of the message shown to callers.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct AnalysisError {
    pub failed_at: AnalysisStage,
    pub query_id: Option<RecordId>,
    #[source]
    pub source: TriageError,
}

impl AnalysisError {
    /// True when the request was rejected before anything was persisted.
    pub fn is_validation(&self) -> bool {
        matches!(self.source, TriageError::InvalidInput(_))
    }
}

/// Result of a completed analysis.
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub query_id: RecordId,
    /// Verbatim model output.
    pub diagnosis: String,
    pub is_emergency: bool,
    /// Local wall-clock time the analysis finished.
    pub completed_at: DateTime<Local>,
}

/// Orchestrates validation, persistence, model invocation and classification.
#[derive(Clone)]
pub struct AnalysisService {
    queries: Arc<dyn QueryStore>,
    archive: Arc<dyn ResponseArchive>,
    model: Arc<dyn ModelClient>,
    classifier: Arc<dyn EmergencyPredicate>,
}

impl AnalysisService {
    /// Uses the default [`KeywordClassifier`].
    pub fn new(
        queries: Arc<dyn QueryStore>,
        archive: Arc<dyn ResponseArchive>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self::with_classifier(
            queries,
            archive,
            model,
            Arc::new(KeywordClassifier::default()),
        )
    }

    pub fn with_classifier(
        queries: Arc<dyn QueryStore>,
        archive: Arc<dyn ResponseArchive>,
        model: Arc<dyn ModelClient>,
        classifier: Arc<dyn EmergencyPredicate>,
    ) -> Self {
        Self {
            queries,
            archive,
            model,
            classifier,
        }
    }

    /// Runs one request end to end.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] whose source is:
    /// - `TriageError::InvalidInput` if the symptom text is missing or blank (nothing persisted),
    /// - `TriageError::Store` if the primary insert or flag update fails,
    /// - `TriageError::Model` if the model call fails,
    /// - `TriageError::Archive` if the response document cannot be stored.
    pub async fn analyze(&self, form: IntakeForm) -> Result<AnalysisOutcome, AnalysisError> {
        let mut stage = AnalysisStage::Received;
        let mut query_id = None;

        let fail = |stage: AnalysisStage, query_id: Option<RecordId>, source: TriageError| {
            tracing::error!(
                stage = %stage,
                query_id = ?query_id.map(|id: RecordId| id.to_string()),
                "analysis failed: {}",
                source
            );
            AnalysisError {
                failed_at: stage,
                query_id,
                source,
            }
        };

        let intake = form.validate().map_err(|e| fail(stage, query_id, e))?;
        stage = AnalysisStage::Validated;

        let record = self
            .queries
            .insert(&intake, Utc::now())
            .map_err(|e| fail(stage, query_id, e.into()))?;
        query_id = Some(record.id);
        stage = AnalysisStage::PrimaryPersisted;
        tracing::debug!(query_id = %record.id, stage = %stage, "query record stored");

        let prompt = build_prompt(&intake);
        let diagnosis = self
            .model
            .generate(&prompt)
            .await
            .map_err(|e| fail(stage, query_id, e.into()))?;
        stage = AnalysisStage::ModelInvoked;
        tracing::debug!(
            query_id = %record.id,
            stage = %stage,
            model = self.model.name(),
            chars = diagnosis.chars().count(),
            "model responded"
        );

        let signal = self
            .classifier
            .assess(&diagnosis, intake.symptoms.as_str(), intake.severity);
        let is_emergency = signal.is_some();
        stage = AnalysisStage::Classified;
        match &signal {
            Some(signal) => {
                tracing::info!(query_id = %record.id, ?signal, "flagged as potential emergency")
            }
            None => tracing::debug!(query_id = %record.id, stage = %stage, "no emergency signal"),
        }

        self.queries
            .set_emergency(&record.id, is_emergency)
            .map_err(|e| fail(stage, query_id, e.into()))?;
        stage = AnalysisStage::PrimaryUpdated;

        let document =
            ResponseDocument::for_query(&record, diagnosis.clone(), is_emergency, Utc::now());
        self.archive
            .insert(&document)
            .map_err(|e| fail(stage, query_id, e.into()))?;
        stage = AnalysisStage::ArchivePersisted;
        tracing::debug!(query_id = %record.id, stage = %stage, "response archived");

        let outcome = AnalysisOutcome {
            query_id: record.id,
            diagnosis,
            is_emergency,
            completed_at: Local::now(),
        };
        tracing::debug!(query_id = %record.id, stage = %AnalysisStage::Responded, "analysis complete");

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArchiveError, ModelError};
    use crate::stores::{FileResponseArchive, SqliteQueryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Model double returning a fixed reply and recording prompts.
    struct ScriptedModel {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|_| ModelError::Status {
                status: 503,
                body: "model overloaded".into(),
            })
        }
    }

    struct BrokenArchive;

    impl ResponseArchive for BrokenArchive {
        fn insert(&self, _document: &ResponseDocument) -> Result<(), ArchiveError> {
            Err(ArchiveError::FileWrite(std::io::Error::other("disk full")))
        }

        fn find_by_query(
            &self,
            _query_id: &RecordId,
        ) -> Result<Option<ResponseDocument>, ArchiveError> {
            Ok(None)
        }

        fn count(&self) -> Result<u64, ArchiveError> {
            Ok(0)
        }
    }

    struct Fixture {
        _temp: TempDir,
        queries: Arc<SqliteQueryStore>,
        archive: Arc<FileResponseArchive>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let archive = Arc::new(FileResponseArchive::new(temp.path().join("responses")));
            Self {
                _temp: temp,
                queries: Arc::new(SqliteQueryStore::open_in_memory().unwrap()),
                archive,
            }
        }

        fn service(&self, model: Arc<dyn ModelClient>) -> AnalysisService {
            AnalysisService::new(self.queries.clone(), self.archive.clone(), model)
        }
    }

    #[tokio::test]
    async fn successful_analysis_persists_both_stores() {
        let fx = Fixture::new();
        let model = Arc::new(ScriptedModel::replying("Likely a common cold."));
        let service = fx.service(model.clone());

        let outcome = service
            .analyze(IntakeForm {
                age: Some(34),
                severity: Some(3),
                ..IntakeForm::new("runny nose and sneezing")
            })
            .await
            .unwrap();

        assert_eq!(outcome.diagnosis, "Likely a common cold.");
        assert!(!outcome.is_emergency);

        let record = fx.queries.get(&outcome.query_id).unwrap().unwrap();
        assert_eq!(record.symptoms, "runny nose and sneezing");
        assert!(!record.is_emergency);

        let doc = fx.archive.find_by_query(&outcome.query_id).unwrap().unwrap();
        assert_eq!(doc.ai_response, "Likely a common cold.");
        assert_eq!(doc.user_info.age, Some(34));
        assert!(doc.created_at >= record.created_at);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("runny nose and sneezing"));
    }

    #[tokio::test]
    async fn symptom_keyword_flags_emergency_regardless_of_output() {
        let fx = Fixture::new();
        let service = fx.service(Arc::new(ScriptedModel::replying("Probably muscular.")));

        let outcome = service
            .analyze(IntakeForm {
                severity: Some(5),
                ..IntakeForm::new("chest pain")
            })
            .await
            .unwrap();

        assert!(outcome.is_emergency);
        assert!(fx.queries.get(&outcome.query_id).unwrap().unwrap().is_emergency);
        assert!(
            fx.archive
                .find_by_query(&outcome.query_id)
                .unwrap()
                .unwrap()
                .is_emergency
        );
    }

    #[tokio::test]
    async fn blank_symptoms_are_rejected_without_side_effects() {
        let fx = Fixture::new();
        let model = Arc::new(ScriptedModel::replying("unused"));
        let service = fx.service(model.clone());

        for form in [IntakeForm::new(""), IntakeForm::new("   "), IntakeForm::default()] {
            let err = service.analyze(form).await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.failed_at, AnalysisStage::Received);
            assert_eq!(err.query_id, None);
        }

        assert_eq!(fx.queries.count().unwrap(), 0);
        assert_eq!(fx.archive.count().unwrap(), 0);
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_leaves_unflagged_record_and_no_document() {
        let fx = Fixture::new();
        let service = fx.service(Arc::new(ScriptedModel::failing()));

        let err = service
            .analyze(IntakeForm {
                severity: Some(10),
                ..IntakeForm::new("severe bleeding")
            })
            .await
            .unwrap_err();

        assert!(!err.is_validation());
        assert_eq!(err.failed_at, AnalysisStage::PrimaryPersisted);
        assert!(err.to_string().contains("model overloaded"));

        let id = err.query_id.unwrap();
        let record = fx.queries.get(&id).unwrap().unwrap();
        assert!(!record.is_emergency);
        assert!(fx.archive.find_by_query(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn archive_failure_keeps_flagged_record() {
        let fx = Fixture::new();
        let service = AnalysisService::new(
            fx.queries.clone(),
            Arc::new(BrokenArchive),
            Arc::new(ScriptedModel::replying("Call 911 now.")),
        );

        let err = service
            .analyze(IntakeForm::new("dizzy"))
            .await
            .unwrap_err();

        assert_eq!(err.failed_at, AnalysisStage::PrimaryUpdated);
        assert!(err.to_string().contains("disk full"));

        let id = err.query_id.unwrap();
        assert!(fx.queries.get(&id).unwrap().unwrap().is_emergency);
        assert_eq!(fx.queries.recent(10).unwrap()[0].id, id);
    }

    #[tokio::test]
    async fn custom_classifier_is_used() {
        struct Never;
        impl EmergencyPredicate for Never {
            fn assess(
                &self,
                _model_output: &str,
                _symptoms: &str,
                _severity: Option<i64>,
            ) -> Option<crate::classifier::EmergencySignal> {
                None
            }
        }

        let fx = Fixture::new();
        let service = AnalysisService::with_classifier(
            fx.queries.clone(),
            fx.archive.clone(),
            Arc::new(ScriptedModel::replying("EMERGENCY")),
            Arc::new(Never),
        );

        let outcome = service
            .analyze(IntakeForm::new("stroke symptoms"))
            .await
            .unwrap();
        assert!(!outcome.is_emergency);
    }
}
