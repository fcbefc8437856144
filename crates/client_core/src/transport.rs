use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::DocumentId,
    error::{ApiError, ApiException},
    protocol::{
        ExtractArgumentsRequest, ExtractArgumentsResponse, GenerateRequest, GenerateResponse,
        ListFilesResponse, UploadResponse, EXTRACT_ARGUMENTS_PATH, GENERATE_PATH,
        LIST_FILES_PATH, UPLOAD_FIELD, UPLOAD_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::ServiceError, types::SelectedFile, DocumentService};

const UPLOAD_ENDPOINT: &str = "upload";
const LIST_ENDPOINT: &str = "list-files";
const GENERATE_ENDPOINT: &str = "generate";
const EXTRACT_ENDPOINT: &str = "extract-arguments";

/// Document Service client speaking the service's HTTP/JSON protocol.
pub struct HttpDocumentService {
    http: Client,
    server_url: String,
}

impl HttpDocumentService {
    pub fn new(server_url: &str) -> Result<Self, ServiceError> {
        Self::with_client(server_url, Client::new())
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::Client)?;
        Self::with_client(server_url, http)
    }

    pub fn with_client(server_url: &str, http: Client) -> Result<Self, ServiceError> {
        Ok(Self {
            http,
            server_url: normalize_server_url(server_url)?,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }
}

/// Validates `raw` and strips trailing slashes so paths can be appended.
pub fn normalize_server_url(raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    Url::parse(trimmed).map_err(|source| ServiceError::InvalidUrl {
        url: trimmed.to_string(),
        source,
    })?;
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ApiError>().await.ok();
        return Err(ServiceError::Status {
            endpoint,
            status: status.as_u16(),
            source: ApiException::from_response(status.as_u16(), body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| ServiceError::Decode { endpoint, source })
}

/// Multipart file part; a MIME type reqwest cannot parse is a local error,
/// nothing has been sent yet.
fn upload_part(filename: &str, mime_type: &str, bytes: &[u8]) -> Result<Part, ServiceError> {
    Part::bytes(bytes.to_vec())
        .file_name(filename.to_string())
        .mime_str(mime_type)
        .map_err(|source| ServiceError::Form {
            filename: filename.to_string(),
            source,
        })
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, ServiceError> {
        let part = upload_part(file.filename(), file.mime_type(), file.bytes())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: UPLOAD_ENDPOINT,
                source,
            })?;
        debug!(filename = file.filename(), size = file.len(), "upload sent");
        read_json(UPLOAD_ENDPOINT, response).await
    }

    async fn list_files(&self) -> Result<Vec<DocumentId>, ServiceError> {
        let response = self
            .http
            .get(self.url(LIST_FILES_PATH))
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: LIST_ENDPOINT,
                source,
            })?;
        let body: ListFilesResponse = read_json(LIST_ENDPOINT, response).await?;
        Ok(body.files)
    }

    async fn generate(&self, document: &DocumentId) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(self.url(GENERATE_PATH))
            .json(&GenerateRequest {
                filename: document.clone(),
            })
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: GENERATE_ENDPOINT,
                source,
            })?;
        let body: GenerateResponse = read_json(GENERATE_ENDPOINT, response).await?;
        Ok(body.result)
    }

    async fn extract_arguments(&self, document: &DocumentId) -> Result<Vec<String>, ServiceError> {
        let response = self
            .http
            .post(self.url(EXTRACT_ARGUMENTS_PATH))
            .json(&ExtractArgumentsRequest {
                filename: document.clone(),
            })
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: EXTRACT_ENDPOINT,
                source,
            })?;
        let body: ExtractArgumentsResponse = read_json(EXTRACT_ENDPOINT, response).await?;
        Ok(body.arguments)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
