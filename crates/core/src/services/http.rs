use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::traits::DocumentService;
use crate::{
    ClientConfig, ClientError, ForumSubmission, RemoveFileRequest, SearchQuery, SearchResponse,
    StatusReply, TocEntry, UploadFile, UploadProgress, UploadReply,
};

const UPLOAD: &str = "/upload";
const SEARCH: &str = "/search";
const REMOVE_FILE: &str = "/remove_file";
const SUBMIT_PROBLEM: &str = "/submit_problem";
const GET_TOC: &str = "/get_toc";

pub struct HttpDocumentService {
    client: Arc<Client>,
    config: ClientConfig,
}

impl HttpDocumentService {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn with_retry<T, F, Fut>(&self, endpoint: &str, mut call: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let policy = self.config.retry;
        let mut attempt = 1;
        loop {
            match call().await {
                Err(error) if error.is_transient() && attempt < policy.max_attempts => {
                    attempt += 1;
                    let delay = policy.delay_before(attempt);
                    warn!(endpoint, attempt, delay_ms = delay.as_millis() as u64, %error, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn post_json<B>(&self, endpoint: &str, body: &B) -> Result<(StatusCode, Value), ClientError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self
            .client
            .post(self.config.endpoint(endpoint)?)
            .timeout(self.config.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(|error| transport_error(endpoint, error))?;
        read_json(endpoint, response).await
    }

    async fn get_json(&self, endpoint: &str) -> Result<(StatusCode, Value), ClientError> {
        let response = self
            .client
            .get(self.config.endpoint(endpoint)?)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|error| transport_error(endpoint, error))?;
        read_json(endpoint, response).await
    }

    async fn post_for_status<B>(&self, endpoint: &str, body: &B) -> Result<StatusReply, ClientError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let (status, body) = self.post_json(endpoint, body).await?;
        let reply: StatusReply = serde_json::from_value(body)?;
        if reply.message.is_none() && reply.error.is_none() && !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn upload(
        &self,
        file: &UploadFile,
        progress: UnboundedSender<UploadProgress>,
    ) -> Result<UploadReply, ClientError> {
        let url = self.config.endpoint(UPLOAD)?;
        let handle = tokio::fs::File::open(&file.path).await?;
        let bytes_total = handle.metadata().await?.len();

        let mut bytes_loaded = 0u64;
        let counted = ReaderStream::new(handle).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                bytes_loaded += bytes.len() as u64;
                let _ = progress.send(UploadProgress {
                    bytes_loaded,
                    bytes_total,
                });
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(counted), bytes_total)
            .file_name(file.file_name())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        debug!(path = %file.path.display(), bytes_total, "uploading file");
        let response = self
            .client
            .post(url)
            .timeout(self.config.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|error| transport_error(UPLOAD, error))?;

        let status = response.status();
        debug!(status = status.as_u16(), "upload finished");
        match status {
            StatusCode::OK => Ok(UploadReply::Accepted),
            StatusCode::BAD_REQUEST => {
                let text = response.text().await?;
                let error = serde_json::from_str::<StatusReply>(&text)
                    .ok()
                    .and_then(|reply| reply.error);
                Ok(UploadReply::Rejected(error))
            }
            other => Ok(UploadReply::Failed(other.as_u16())),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ClientError> {
        debug!(keywords = ?query.keywords, pdf_title = %query.pdf_title, "searching");
        self.with_retry(SEARCH, move || async move {
            let (status, body) = self.post_json(SEARCH, query).await?;
            if let Some(error) = body.get("error").and_then(Value::as_str) {
                return Err(ClientError::Server(error.to_string()));
            }
            if !status.is_success() {
                return Err(ClientError::UnexpectedStatus {
                    endpoint: SEARCH.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(serde_json::from_value(body)?)
        })
        .await
    }

    async fn remove_file(&self, file_name: &str) -> Result<StatusReply, ClientError> {
        let request = RemoveFileRequest {
            file_name: file_name.to_string(),
        };
        self.post_for_status(REMOVE_FILE, &request).await
    }

    async fn submit_forum_entry(
        &self,
        submission: &ForumSubmission,
    ) -> Result<StatusReply, ClientError> {
        self.post_for_status(SUBMIT_PROBLEM, submission).await
    }

    async fn table_of_contents(&self) -> Result<Vec<TocEntry>, ClientError> {
        self.with_retry(GET_TOC, move || async move {
            let (status, body) = self.get_json(GET_TOC).await?;
            if !status.is_success() {
                return Err(ClientError::UnexpectedStatus {
                    endpoint: GET_TOC.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(serde_json::from_value(body)?)
        })
        .await
    }
}

fn transport_error(endpoint: &str, error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout(endpoint.to_string())
    } else {
        ClientError::Http(error)
    }
}

/// Error bodies are JSON on the endpoints this client talks to; anything
/// else only counts as a status failure.
async fn read_json(endpoint: &str, response: Response) -> Result<(StatusCode, Value), ClientError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|error| transport_error(endpoint, error))?;
    debug!(endpoint, status = status.as_u16(), "response received");

    match serde_json::from_str::<Value>(&text) {
        Ok(body) => Ok((status, body)),
        Err(_) if !status.is_success() => Err(ClientError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        }),
        Err(error) => Err(error.into()),
    }
}
