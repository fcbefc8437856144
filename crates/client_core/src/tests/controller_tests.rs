use super::*;
use std::time::Duration;

use async_trait::async_trait;
use shared::{
    error::{ApiException, ErrorCode},
    protocol::UploadResponse,
};
use tokio::sync::oneshot;

use crate::MissingDocumentService;

/// Fake service whose replies are fixed up front; `None` makes a call fail.
struct ScriptedDocumentService {
    upload_message: Option<String>,
    files: Option<Vec<DocumentId>>,
    generate_result: Option<String>,
    generate_started: Mutex<Option<oneshot::Sender<DocumentId>>>,
    generate_gate: Mutex<Option<oneshot::Receiver<()>>>,
    uploads: Mutex<Vec<SelectedFile>>,
    upload_calls: AtomicUsize,
    list_calls: AtomicUsize,
    generate_calls: AtomicUsize,
}

impl ScriptedDocumentService {
    fn ok() -> Self {
        Self {
            upload_message: Some("File uploaded successfully".to_string()),
            files: Some(vec![DocumentId::new("a.pdf"), DocumentId::new("b.pdf")]),
            generate_result: Some("Argument: X supports Y.".to_string()),
            generate_started: Mutex::new(None),
            generate_gate: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
            upload_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    fn with_upload_message(mut self, message: Option<&str>) -> Self {
        self.upload_message = message.map(str::to_string);
        self
    }

    fn with_files(mut self, files: Option<Vec<&str>>) -> Self {
        self.files = files.map(|files| files.into_iter().map(DocumentId::from).collect());
        self
    }

    fn with_generate_result(mut self, result: Option<&str>) -> Self {
        self.generate_result = result.map(str::to_string);
        self
    }

    /// Holds the next generate call until the returned sender fires.
    fn gated(self) -> (Self, oneshot::Receiver<DocumentId>, oneshot::Sender<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.generate_started.try_lock().expect("fresh lock") = Some(started_tx);
        *self.generate_gate.try_lock().expect("fresh lock") = Some(release_rx);
        (self, started_rx, release_tx)
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

fn service_failure() -> ServiceError {
    ServiceError::Status {
        endpoint: "test",
        status: 500,
        source: ApiException::new(ErrorCode::Internal, "scripted failure"),
    }
}

#[async_trait]
impl DocumentService for ScriptedDocumentService {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, ServiceError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().await.push(file.clone());
        match &self.upload_message {
            Some(message) => Ok(UploadResponse {
                message: message.clone(),
                filename: Some(DocumentId::new(file.filename())),
            }),
            None => Err(service_failure()),
        }
    }

    async fn list_files(&self) -> Result<Vec<DocumentId>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.files.clone().ok_or(ServiceError::Unavailable)
    }

    async fn generate(&self, document: &DocumentId) -> Result<String, ServiceError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.generate_gate.lock().await.take();
        if let Some(started) = self.generate_started.lock().await.take() {
            let _ = started.send(document.clone());
        }
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.generate_result.clone().ok_or_else(service_failure)
    }

    async fn extract_arguments(&self, document: &DocumentId) -> Result<Vec<String>, ServiceError> {
        Ok(vec![format!("first line of {document}")])
    }
}

fn paper() -> SelectedFile {
    SelectedFile::new("paper.pdf", b"%PDF-1.7".to_vec())
}

#[tokio::test]
async fn fresh_controller_is_idle_and_empty() {
    let controller = WorkflowController::new(Arc::new(ScriptedDocumentService::ok()));
    let snapshot = controller.snapshot().await;

    assert_eq!(snapshot.selected_file, None);
    assert_eq!(snapshot.status, "");
    assert!(snapshot.documents.is_empty());
    assert_eq!(snapshot.generation_result, None);
    assert!(!snapshot.busy);
    assert_eq!(snapshot.phase(), crate::GenerationPhase::Idle);
}

#[tokio::test]
async fn mount_loads_document_list_once() {
    let service = Arc::new(ScriptedDocumentService::ok());
    let controller = WorkflowController::mount(service.clone()).await;

    assert_eq!(service.list_calls(), 1);
    assert_eq!(
        controller.snapshot().await.documents,
        vec![DocumentId::new("a.pdf"), DocumentId::new("b.pdf")]
    );
}

#[tokio::test]
async fn upload_without_selection_only_sets_notice() {
    let service = Arc::new(ScriptedDocumentService::ok());
    let controller = WorkflowController::new(service.clone());

    let outcome = controller.upload().await.expect("guard is not an error");

    assert!(matches!(outcome, UploadOutcome::NoFileSelected));
    assert_eq!(service.upload_calls(), 0);
    assert_eq!(service.list_calls(), 0);
    assert_eq!(controller.snapshot().await.status, SELECT_FILE_NOTICE);
}

#[tokio::test]
async fn successful_upload_clears_selection_and_refreshes_once() {
    let service = Arc::new(
        ScriptedDocumentService::ok()
            .with_upload_message(Some("upload successful"))
            .with_files(Some(vec!["paper.pdf"])),
    );
    let controller = WorkflowController::new(service.clone());
    controller.select_file(paper()).await;

    let outcome = controller.upload().await.expect("upload");

    match outcome {
        UploadOutcome::Uploaded(response) => assert_eq!(response.message, "upload successful"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, "upload successful");
    assert_eq!(snapshot.selected_file, None);
    assert_eq!(snapshot.documents, vec![DocumentId::new("paper.pdf")]);
    assert_eq!(service.list_calls(), 1);
    assert_eq!(service.uploads.lock().await.as_slice(), &[paper()]);
}

#[tokio::test]
async fn failed_upload_keeps_selection_for_retry() {
    let service = Arc::new(ScriptedDocumentService::ok().with_upload_message(None));
    let controller = WorkflowController::new(service.clone());
    controller.select_file(paper()).await;

    controller.upload().await.expect_err("upload must fail");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, UPLOAD_FAILED_NOTICE);
    assert_eq!(snapshot.selected_file, Some(paper()));
    assert_eq!(service.list_calls(), 0);

    // Retrying resubmits the same content.
    controller.upload().await.expect_err("still failing");
    assert_eq!(service.upload_calls(), 2);
}

#[tokio::test]
async fn upload_succeeds_even_when_follow_up_refresh_fails() {
    let service = Arc::new(ScriptedDocumentService::ok().with_files(None));
    let controller = WorkflowController::new(service.clone());
    controller.select_file(paper()).await;

    controller.upload().await.expect("upload");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, "File uploaded successfully");
    assert_eq!(snapshot.selected_file, None);
    assert!(snapshot.documents.is_empty());
    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn selecting_again_replaces_the_file() {
    let controller = WorkflowController::new(Arc::new(ScriptedDocumentService::ok()));
    controller.select_file(paper()).await;
    let other = SelectedFile::new("other.pdf", b"%PDF-2.0".to_vec());
    controller.select_file(other.clone()).await;

    assert_eq!(controller.snapshot().await.selected_file, Some(other));

    controller.clear_selection().await;
    assert_eq!(controller.snapshot().await.selected_file, None);
}

#[tokio::test]
async fn refresh_replaces_list_in_server_order() {
    let service = Arc::new(ScriptedDocumentService::ok().with_files(Some(vec!["a.pdf", "b.pdf"])));
    let controller = WorkflowController::new(service);

    let files = controller.refresh_list().await.expect("refresh");

    assert_eq!(files, vec![DocumentId::new("a.pdf"), DocumentId::new("b.pdf")]);
    assert_eq!(controller.snapshot().await.documents, files);
}

#[tokio::test]
async fn failed_refresh_keeps_stale_list_and_status() {
    let service = Arc::new(ScriptedDocumentService::ok().with_files(None));
    let controller = WorkflowController::new(service);
    {
        let mut inner = controller.inner.lock().await;
        inner.documents = vec![DocumentId::new("old.pdf")];
        inner.status = "earlier status".to_string();
    }

    controller.refresh_list().await.expect_err("refresh must fail");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.documents, vec![DocumentId::new("old.pdf")]);
    assert_eq!(snapshot.status, "earlier status");
}

#[tokio::test]
async fn generate_is_busy_only_while_request_is_pending() {
    let (service, started_rx, release_tx) = ScriptedDocumentService::ok().gated();
    let controller = WorkflowController::new(Arc::new(service));
    {
        let mut inner = controller.inner.lock().await;
        inner.generation_result = Some("stale".to_string());
    }
    assert!(!controller.is_busy());

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.generate(DocumentId::new("a.pdf")).await }
    });

    let requested = started_rx.await.expect("generate reached service");
    assert_eq!(requested, DocumentId::new("a.pdf"));
    let pending = controller.snapshot().await;
    assert!(pending.busy);
    assert_eq!(pending.phase(), crate::GenerationPhase::Generating);
    assert_eq!(pending.generation_result, None);
    assert_eq!(pending.status, GENERATING_NOTICE);

    release_tx.send(()).expect("release");
    let result = task.await.expect("join").expect("generate");

    assert_eq!(result, "Argument: X supports Y.");
    let done = controller.snapshot().await;
    assert!(!done.busy);
    assert_eq!(done.generation_result.as_deref(), Some("Argument: X supports Y."));
    assert_eq!(done.status, GENERATED_NOTICE);
}

#[tokio::test]
async fn failed_generate_clears_busy_and_leaves_result_empty() {
    let service = Arc::new(ScriptedDocumentService::ok().with_generate_result(None));
    let controller = WorkflowController::new(service);
    {
        let mut inner = controller.inner.lock().await;
        inner.generation_result = Some("previous".to_string());
    }

    controller
        .generate(DocumentId::new("a.pdf"))
        .await
        .expect_err("generate must fail");

    let snapshot = controller.snapshot().await;
    assert!(!snapshot.busy);
    assert_eq!(snapshot.generation_result, None);
    assert_eq!(snapshot.status, GENERATE_FAILED_NOTICE);
}

#[tokio::test]
async fn generate_against_missing_service_recovers_to_idle() {
    let controller = WorkflowController::mount(Arc::new(MissingDocumentService)).await;

    let err = controller
        .generate(DocumentId::new("a.pdf"))
        .await
        .expect_err("must fail");

    assert!(err.is_transport());
    let snapshot = controller.snapshot().await;
    assert!(!snapshot.busy);
    assert!(snapshot.documents.is_empty());
    assert_eq!(snapshot.status, GENERATE_FAILED_NOTICE);
}

#[tokio::test]
async fn abandoned_generate_still_clears_busy() {
    let (service, started_rx, _release_tx) = ScriptedDocumentService::ok().gated();
    let controller = WorkflowController::new(Arc::new(service));

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.generate(DocumentId::new("a.pdf")).await }
    });
    started_rx.await.expect("generate reached service");
    assert!(controller.is_busy());

    task.abort();
    let _ = task.await;

    assert!(!controller.is_busy());
}

#[tokio::test]
async fn overlapping_generates_stay_busy_until_last_resolves() {
    let (service, started_rx, release_tx) = ScriptedDocumentService::ok().gated();
    let service = Arc::new(service);
    let controller = WorkflowController::new(service.clone());

    let slow = tokio::spawn({
        let controller = controller.clone();
        async move { controller.generate(DocumentId::new("a.pdf")).await }
    });
    started_rx.await.expect("first generate reached service");

    controller
        .generate(DocumentId::new("b.pdf"))
        .await
        .expect("second generate");
    assert!(controller.is_busy(), "first request is still pending");

    release_tx.send(()).expect("release");
    slow.await.expect("join").expect("first generate");
    assert!(!controller.is_busy());
    assert_eq!(service.generate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn generate_emits_status_before_busy_transitions() {
    let controller = WorkflowController::new(Arc::new(ScriptedDocumentService::ok()));
    let mut events = controller.subscribe_events();

    controller
        .generate(DocumentId::new("a.pdf"))
        .await
        .expect("generate");

    let mut seen = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(50), events.recv()).await
    {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            WorkflowEvent::StatusChanged(GENERATING_NOTICE.to_string()),
            WorkflowEvent::BusyChanged(true),
            WorkflowEvent::GenerationStarted {
                document: DocumentId::new("a.pdf"),
            },
            WorkflowEvent::StatusChanged(GENERATED_NOTICE.to_string()),
            WorkflowEvent::GenerationCompleted {
                document: DocumentId::new("a.pdf"),
                result: "Argument: X supports Y.".to_string(),
            },
            WorkflowEvent::BusyChanged(false),
        ]
    );
}

#[tokio::test]
async fn selection_made_during_failed_upload_survives() {
    let service = Arc::new(ScriptedDocumentService::ok().with_upload_message(None));
    let controller = WorkflowController::new(service);
    controller.select_file(paper()).await;

    let other = SelectedFile::new("other.pdf", b"%PDF".to_vec());
    let (upload, ()) = tokio::join!(controller.upload(), controller.select_file(other.clone()));

    upload.expect_err("upload must fail");
    assert_eq!(controller.snapshot().await.selected_file, Some(other));
}

#[tokio::test]
async fn extract_arguments_leaves_state_untouched() {
    let controller = WorkflowController::new(Arc::new(ScriptedDocumentService::ok()));
    let before = controller.snapshot().await;

    let lines = controller
        .extract_arguments(&DocumentId::new("a.pdf"))
        .await
        .expect("extract");

    assert_eq!(lines, vec!["first line of a.pdf".to_string()]);
    assert_eq!(controller.snapshot().await, before);
}
