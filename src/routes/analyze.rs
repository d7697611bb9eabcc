// ABOUTME: Route handlers for the gym equipment analyze endpoint
// ABOUTME: Decodes multipart or JSON uploads and runs them through the analysis pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Analyze routes
//!
//! `POST /analyze` accepts either `multipart/form-data` (`image` file,
//! `userNote`, `demo`) or a JSON body (`{image, userNote, demo}`), plus an
//! optional `?demo=1` query flag. The rate limit gate runs before the query
//! and body are decoded, so an over-budget client gets 429 even for a
//! malformed request.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::QueryRejection, FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::analysis::request::parse_flag;
use crate::analysis::{client_key_from_headers, AnalysisError, AnalysisRequest, ImageInput};
use crate::errors::AppError;
use crate::middleware::create_rate_limit_headers;
use crate::resources::ServerResources;

/// Query parameters accepted by `POST /analyze`
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    /// `1` or `true` enables demo mode
    pub demo: Option<String>,
}

/// Demo flag in a JSON body; `true`, `"1"`, and `"true"` enable demo mode
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonFlag {
    Bool(bool),
    Text(String),
}

impl JsonFlag {
    fn enabled(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(value) => parse_flag(value),
        }
    }
}

/// JSON body of `POST /analyze`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeJsonBody {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    user_note: Option<String>,
    #[serde(default)]
    demo: Option<JsonFlag>,
}

/// Decoded request fields before the client key is attached
#[derive(Debug, Default)]
struct DecodedInput {
    image: Option<ImageInput>,
    user_note: Option<String>,
    demo: bool,
}

/// Analyze routes implementation
pub struct AnalyzeRoutes;

impl AnalyzeRoutes {
    /// Create the analyze routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/analyze", get(Self::handle_info).post(Self::handle_analyze))
            .with_state(resources)
    }

    /// Handle GET /analyze - service info and limits
    async fn handle_info(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        let limits = resources.orchestrator.rate_limiter().config();
        Json(json!({
            "ok": true,
            "hasKey": resources.orchestrator.has_provider(),
            "model": resources.orchestrator.model(),
            "limits": {
                "maxRequests": limits.max_requests,
                "windowSeconds": limits.window_secs(),
            },
        }))
    }

    /// Handle POST /analyze - run the analysis pipeline
    async fn handle_analyze(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<AnalyzeQuery>, QueryRejection>,
        headers: HeaderMap,
        request: Request<Body>,
    ) -> Response {
        let client_key = client_key_from_headers(&headers);
        let orchestrator = &resources.orchestrator;

        let status = match orchestrator.admit(&client_key) {
            Ok(status) => status,
            Err(error) => {
                let rate_headers = match &error {
                    AnalysisError::RateLimited(status) => create_rate_limit_headers(status),
                    _ => HeaderMap::new(),
                };
                return (rate_headers, AppError::from(error)).into_response();
            }
        };
        let rate_headers = create_rate_limit_headers(&status);

        let query = match query {
            Ok(Query(query)) => query,
            Err(rejection) => {
                warn!(error = %rejection, "Rejected undecodable analyze query");
                let error = AnalysisError::MalformedRequest(rejection.body_text());
                return (rate_headers, AppError::from(error)).into_response();
            }
        };

        let decoded = match Self::decode(&headers, request).await {
            Ok(decoded) => decoded,
            Err(error) => return (rate_headers, error).into_response(),
        };

        let query_demo = query.demo.as_deref().is_some_and(parse_flag);
        let mut analysis_request =
            AnalysisRequest::new(client_key).with_demo(decoded.demo || query_demo);
        analysis_request.image = decoded.image;
        analysis_request.user_note = decoded.user_note.filter(|note| !note.trim().is_empty());

        match orchestrator.analyze_admitted(analysis_request).await {
            Ok(result) => (StatusCode::OK, rate_headers, Json(result)).into_response(),
            Err(error) => (rate_headers, AppError::from(error)).into_response(),
        }
    }

    async fn decode(headers: &HeaderMap, request: Request<Body>) -> Result<DecodedInput, AppError> {
        let is_multipart = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("multipart/form-data"));

        if is_multipart {
            Self::decode_multipart(request).await
        } else {
            Self::decode_json(request).await
        }
    }

    async fn decode_multipart(request: Request<Body>) -> Result<DecodedInput, AppError> {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| malformed(rejection.status(), rejection.body_text()))?;

        let mut decoded = DecodedInput::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| malformed(e.status(), e.body_text()))?
        {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("image") => {
                    let is_file = field.file_name().is_some() || field.content_type().is_some();
                    let mime = field.content_type().map(str::to_owned);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| malformed(e.status(), e.body_text()))?;
                    decoded.image = if is_file {
                        ImageInput::from_bytes(&bytes, mime.as_deref())
                    } else {
                        ImageInput::from_url(&String::from_utf8_lossy(&bytes))
                    };
                }
                Some("userNote") => {
                    decoded.user_note = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| malformed(e.status(), e.body_text()))?,
                    );
                }
                Some("demo") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| malformed(e.status(), e.body_text()))?;
                    decoded.demo = parse_flag(&text);
                }
                other => debug!(field = ?other, "Ignoring unknown multipart field"),
            }
        }

        Ok(decoded)
    }

    async fn decode_json(request: Request<Body>) -> Result<DecodedInput, AppError> {
        let bytes = Bytes::from_request(request, &())
            .await
            .map_err(|rejection| malformed(rejection.status(), rejection.body_text()))?;

        // An empty body is treated as `{}`.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(DecodedInput::default());
        }

        let body: AnalyzeJsonBody = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "Rejected undecodable analyze body");
            AppError::from(AnalysisError::MalformedRequest(e.to_string()))
        })?;

        Ok(DecodedInput {
            image: body.image.as_deref().and_then(ImageInput::from_url),
            user_note: body.user_note,
            demo: body.demo.as_ref().is_some_and(JsonFlag::enabled),
        })
    }
}

/// Map a body extraction failure to an error response
fn malformed(status: StatusCode, reason: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Uploaded image is too large.")
    } else {
        AppError::from(AnalysisError::MalformedRequest(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_variants() {
        let body: AnalyzeJsonBody = serde_json::from_str(r#"{"demo": true}"#).unwrap();
        assert!(body.demo.unwrap().enabled());

        let body: AnalyzeJsonBody = serde_json::from_str(r#"{"demo": "1"}"#).unwrap();
        assert!(body.demo.unwrap().enabled());

        let body: AnalyzeJsonBody = serde_json::from_str(r#"{"demo": false}"#).unwrap();
        assert!(!body.demo.unwrap().enabled());
    }

    #[test]
    fn test_json_body_ignores_unknown_fields() {
        let body: AnalyzeJsonBody =
            serde_json::from_str(r#"{"image": "https://x/y.jpg", "extra": 1}"#).unwrap();
        assert_eq!(body.image.as_deref(), Some("https://x/y.jpg"));
    }

    #[test]
    fn test_payload_too_large_maps_to_413() {
        let err = malformed(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded".to_owned());
        assert_eq!(err.http_status(), 413);

        let err = malformed(StatusCode::BAD_REQUEST, "boundary".to_owned());
        assert_eq!(err.http_status(), 400);
    }
}
