use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use shared::domain::DocumentId;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{
    error::ServiceError,
    types::{SelectedFile, UploadOutcome, WorkflowEvent, WorkflowSnapshot},
    DocumentService,
};

pub const SELECT_FILE_NOTICE: &str = "Please select a PDF file.";
pub const UPLOADING_NOTICE: &str = "Uploading...";
pub const UPLOAD_FAILED_NOTICE: &str = "Upload failed.";
pub const GENERATING_NOTICE: &str = "Generating arguments...";
pub const GENERATED_NOTICE: &str = "Arguments generated.";
pub const GENERATE_FAILED_NOTICE: &str = "Failed to generate arguments.";

const EVENT_CAPACITY: usize = 256;

#[derive(Default)]
struct WorkflowState {
    selected_file: Option<SelectedFile>,
    status: String,
    documents: Vec<DocumentId>,
    generation_result: Option<String>,
}

/// Owns the upload/list/generate state of one user session and is the only
/// caller of the [`DocumentService`].
///
/// Operations take `&self` and never hold the state lock across a service
/// call, so independent operations may interleave. Each operation only
/// writes the fields it owns; the status message is last-writer-wins.
pub struct WorkflowController {
    service: Arc<dyn DocumentService>,
    inner: Mutex<WorkflowState>,
    generations_in_flight: AtomicUsize,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowController {
    /// Builds an idle controller without contacting the service.
    pub fn new(service: Arc<dyn DocumentService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            service,
            inner: Mutex::new(WorkflowState::default()),
            generations_in_flight: AtomicUsize::new(0),
            events,
        })
    }

    /// Builds a controller and loads the initial document list.
    pub async fn mount(service: Arc<dyn DocumentService>) -> Arc<Self> {
        let controller = Self::new(service);
        // Failure is already logged and leaves the list empty.
        let _ = controller.refresh_list().await;
        controller
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let guard = self.inner.lock().await;
        WorkflowSnapshot {
            selected_file: guard.selected_file.clone(),
            status: guard.status.clone(),
            documents: guard.documents.clone(),
            generation_result: guard.generation_result.clone(),
            busy: self.is_busy(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.generations_in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn select_file(&self, file: SelectedFile) {
        let filename = file.filename().to_string();
        {
            let mut guard = self.inner.lock().await;
            guard.selected_file = Some(file);
        }
        let _ = self
            .events
            .send(WorkflowEvent::SelectionChanged(Some(filename)));
    }

    pub async fn clear_selection(&self) {
        {
            let mut guard = self.inner.lock().await;
            guard.selected_file = None;
        }
        let _ = self.events.send(WorkflowEvent::SelectionChanged(None));
    }

    /// Uploads the selected file, then reloads the document list.
    ///
    /// Without a selection this only sets the select-a-file notice. On
    /// failure the selection is kept so the user can retry.
    pub async fn upload(&self) -> Result<UploadOutcome, ServiceError> {
        let file = {
            let mut guard = self.inner.lock().await;
            match guard.selected_file.clone() {
                Some(file) => {
                    guard.status = UPLOADING_NOTICE.to_string();
                    file
                }
                None => {
                    guard.status = SELECT_FILE_NOTICE.to_string();
                    drop(guard);
                    self.emit_status(SELECT_FILE_NOTICE);
                    return Ok(UploadOutcome::NoFileSelected);
                }
            }
        };
        self.emit_status(UPLOADING_NOTICE);

        match self.service.upload(&file).await {
            Ok(response) => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.status = response.message.clone();
                    guard.selected_file = None;
                }
                info!(filename = file.filename(), "document uploaded");
                self.emit_status(&response.message);
                let _ = self.events.send(WorkflowEvent::SelectionChanged(None));

                let _ = self.refresh_list().await;
                Ok(UploadOutcome::Uploaded(response))
            }
            Err(err) => {
                error!(filename = file.filename(), "upload failed: {err}");
                self.set_status(UPLOAD_FAILED_NOTICE).await;
                Err(err)
            }
        }
    }

    /// Replaces the document list with the service's listing.
    ///
    /// Failures are logged only; the previous list and status stay as they were.
    pub async fn refresh_list(&self) -> Result<Vec<DocumentId>, ServiceError> {
        match self.service.list_files().await {
            Ok(files) => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.documents = files.clone();
                }
                let _ = self
                    .events
                    .send(WorkflowEvent::DocumentsUpdated(files.clone()));
                Ok(files)
            }
            Err(err) => {
                warn!("failed to refresh document list: {err}");
                Err(err)
            }
        }
    }

    /// Requests argument generation for `document`.
    ///
    /// Overlapping calls are allowed; the controller stays busy until the
    /// last of them resolves, and the latest successful result wins.
    pub async fn generate(&self, document: DocumentId) -> Result<String, ServiceError> {
        let _busy = {
            let mut guard = self.inner.lock().await;
            guard.status = GENERATING_NOTICE.to_string();
            guard.generation_result = None;
            BusyGuard::enter(&self.generations_in_flight, &self.events)
        };
        self.emit_status(GENERATING_NOTICE);
        _busy.announce();
        let _ = self.events.send(WorkflowEvent::GenerationStarted {
            document: document.clone(),
        });

        match self.service.generate(&document).await {
            Ok(result) => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.generation_result = Some(result.clone());
                    guard.status = GENERATED_NOTICE.to_string();
                }
                info!(%document, chars = result.len(), "arguments generated");
                self.emit_status(GENERATED_NOTICE);
                let _ = self.events.send(WorkflowEvent::GenerationCompleted {
                    document,
                    result: result.clone(),
                });
                Ok(result)
            }
            Err(err) => {
                error!(%document, "argument generation failed: {err}");
                self.set_status(GENERATE_FAILED_NOTICE).await;
                let _ = self.events.send(WorkflowEvent::GenerationFailed {
                    document,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Fetches the raw leading lines the service extracts from `document`.
    /// Read-only: no controller state changes.
    pub async fn extract_arguments(
        &self,
        document: &DocumentId,
    ) -> Result<Vec<String>, ServiceError> {
        self.service.extract_arguments(document).await
    }

    async fn set_status(&self, status: &str) {
        {
            let mut guard = self.inner.lock().await;
            guard.status = status.to_string();
        }
        self.emit_status(status);
    }

    fn emit_status(&self, status: &str) {
        let _ = self
            .events
            .send(WorkflowEvent::StatusChanged(status.to_string()));
    }
}

/// Counts one in-flight generation; released on drop so the busy flag
/// clears even when the calling future is abandoned mid-request.
struct BusyGuard<'a> {
    in_flight: &'a AtomicUsize,
    events: &'a broadcast::Sender<WorkflowEvent>,
    first: bool,
}

impl<'a> BusyGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, events: &'a broadcast::Sender<WorkflowEvent>) -> Self {
        let first = in_flight.fetch_add(1, Ordering::SeqCst) == 0;
        Self {
            in_flight,
            events,
            first,
        }
    }

    /// Emits `BusyChanged(true)` if this guard took the controller from idle
    /// to busy. Called after the status update so listeners see the status
    /// text before the busy indicator.
    fn announce(&self) {
        if self.first {
            let _ = self.events.send(WorkflowEvent::BusyChanged(true));
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.events.send(WorkflowEvent::BusyChanged(false));
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
