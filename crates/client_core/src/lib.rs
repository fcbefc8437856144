//! Client side of the document workflow: the Document Service seam, its HTTP
//! implementation, and the controller that sequences upload, listing and
//! argument generation.

use async_trait::async_trait;
use shared::{domain::DocumentId, protocol::UploadResponse};

pub mod controller;
pub mod error;
pub mod transport;
pub mod types;

pub use controller::WorkflowController;
pub use error::ServiceError;
pub use transport::HttpDocumentService;
pub use types::{
    GenerationPhase, SelectedFile, UploadOutcome, WorkflowEvent, WorkflowSnapshot,
};

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, ServiceError>;
    async fn list_files(&self) -> Result<Vec<DocumentId>, ServiceError>;
    async fn generate(&self, document: &DocumentId) -> Result<String, ServiceError>;
    async fn extract_arguments(&self, document: &DocumentId) -> Result<Vec<String>, ServiceError>;
}

/// Stand-in used when no service endpoint is configured; every call fails.
pub struct MissingDocumentService;

#[async_trait]
impl DocumentService for MissingDocumentService {
    async fn upload(&self, _file: &SelectedFile) -> Result<UploadResponse, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn list_files(&self) -> Result<Vec<DocumentId>, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn generate(&self, _document: &DocumentId) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn extract_arguments(
        &self,
        _document: &DocumentId,
    ) -> Result<Vec<String>, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}
