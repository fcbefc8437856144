use std::{fmt, io, path::Path, sync::Arc};

use shared::{domain::DocumentId, protocol::UploadResponse};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A local file chosen for upload, held in memory until it is sent.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    filename: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let bytes: Vec<u8> = bytes.into();
        Self {
            filename,
            mime_type,
            bytes: Arc::from(bytes),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{}' has no usable file name", path.display()),
                )
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(filename, bytes))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Generating,
}

/// Point-in-time copy of everything the controller owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    pub selected_file: Option<SelectedFile>,
    pub status: String,
    pub documents: Vec<DocumentId>,
    pub generation_result: Option<String>,
    pub busy: bool,
}

impl WorkflowSnapshot {
    pub fn phase(&self) -> GenerationPhase {
        if self.busy {
            GenerationPhase::Generating
        } else {
            GenerationPhase::Idle
        }
    }
}

#[derive(Debug, Clone)]
pub enum UploadOutcome {
    NoFileSelected,
    Uploaded(UploadResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    StatusChanged(String),
    SelectionChanged(Option<String>),
    DocumentsUpdated(Vec<DocumentId>),
    BusyChanged(bool),
    GenerationStarted {
        document: DocumentId,
    },
    GenerationCompleted {
        document: DocumentId,
        result: String,
    },
    GenerationFailed {
        document: DocumentId,
        reason: String,
    },
}
