use serde::{Deserialize, Serialize};

use crate::domain::DocumentId;

/// Multipart field name carrying the uploaded PDF.
pub const UPLOAD_FIELD: &str = "file";

pub const UPLOAD_PATH: &str = "/upload";
pub const LIST_FILES_PATH: &str = "/list-files";
pub const GENERATE_PATH: &str = "/generate";
pub const EXTRACT_ARGUMENTS_PATH: &str = "/extract-arguments";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<DocumentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub files: Vec<DocumentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub filename: DocumentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractArgumentsRequest {
    pub filename: DocumentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractArgumentsResponse {
    pub arguments: Vec<String>,
}
