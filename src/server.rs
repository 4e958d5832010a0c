//! HTTP surface of the relay.
//!
//! Two query endpoints share the same tail: serialize the signature, post it
//! to the search API and return the reply as `{"result": "<JSON rows>"}`.

use std::io::{BufReader, Write};
use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::cmd::{sketch_reader, SketchParameters};
use crate::config::RelayConfig;
use crate::search::{results_to_json, SearchClient};
use crate::signature::Signature;
use crate::{Error, Result};

/// Form field holding the uploaded sequence file.
pub const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    config: RelayConfig,
    client: SearchClient,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<AppState> {
        let client = SearchClient::new(config.search_url(), config.timeout())?;
        Ok(AppState { config, client })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// JSON-encoded array of result rows.
    pub result: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureQuery {
    /// JSON-encoded signature, or list of signatures.
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Error::Upload {
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::Upload {
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, detail) = if self.is_client_error() {
            warn!("rejected query: {}", self);
            (StatusCode::BAD_REQUEST, self.to_string())
        } else if let Error::MalformedResults(_) = self {
            error!("{}", self);
            (StatusCode::BAD_GATEWAY, self.to_string())
        } else {
            error!("{}", self);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        };

        (status, Json(ErrorDetail { detail })).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.config.max_upload();

    Router::new()
        .route("/query/", post(query_file))
        .route("/query_signature/", post(query_signature))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let bind = config.bind();
    let state = Arc::new(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(
        "listening on {}, forwarding queries to {}",
        listener.local_addr()?,
        state.client.url()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutting down");
}

async fn health() -> &'static str {
    "ok"
}

async fn query_file(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<QueryResponse>> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await?;
        upload = Some((name, data));
        break;
    }

    let (name, data) = upload.ok_or_else(|| Error::MissingField {
        field: UPLOAD_FIELD.into(),
    })?;
    info!("received upload '{}' ({} bytes)", name, data.len());

    let params = state.config.sketch().clone();
    let sig = tokio::task::spawn_blocking(move || {
        sketch_upload(NamedTempFile::new()?, &data, &name, &params)
    })
    .await??;

    respond(&state, &[sig]).await
}

async fn query_signature(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Json<SignatureQuery>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(query) = query?;
    let sigs = Signature::from_json_str(&query.signature)?;
    info!("received {} signature(s)", sigs.len());

    respond(&state, &sigs).await
}

/// Spool the upload to `tmp` and sketch it from there. `tmp` is consumed, so
/// the file is removed on return whether sketching succeeded or not.
fn sketch_upload(
    mut tmp: NamedTempFile,
    data: &[u8],
    name: &str,
    params: &SketchParameters,
) -> Result<Signature> {
    tmp.write_all(data)?;
    tmp.flush()?;
    debug!("stored '{}' at {}", name, tmp.path().display());

    let reader = BufReader::new(tmp.reopen()?);
    sketch_reader(reader, name, params)
}

async fn respond(state: &AppState, sigs: &[Signature]) -> Result<Json<QueryResponse>> {
    let results = state.client.query(sigs).await?;
    Ok(Json(QueryResponse {
        result: results_to_json(&results)?,
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_statuses() {
        let bad = Error::InvalidSignature {
            message: "nope".into(),
        };
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let upstream = Error::Upstream {
            message: "connection refused".into(),
        };
        assert_eq!(
            upstream.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn temp_file_removed_after_sketching() {
        let params = SketchParameters::builder().ksize(4).scaled(1).build();

        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        assert!(path.exists());

        let sig = sketch_upload(tmp, b">r\nACGTTGCAACGT\n", "r.fa", &params).unwrap();
        assert_eq!(sig.filename(), "r.fa");
        assert!(sig.hash_count() > 0);
        assert!(!path.exists());
    }

    #[test]
    fn temp_file_removed_after_failure() {
        let params = SketchParameters::default();

        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();

        let err = sketch_upload(tmp, b"definitely not fasta", "junk.txt", &params).unwrap_err();
        assert!(err.is_client_error());
        assert!(!path.exists());
    }

    #[test]
    fn rejections_are_client_errors() {
        let bad_json = Error::InvalidRequest {
            message: "missing field `signature`".into(),
        };
        assert_eq!(bad_json.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
