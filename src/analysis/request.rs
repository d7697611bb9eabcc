// ABOUTME: Normalized analyze request and client identity derivation
// ABOUTME: Encodes uploaded photos as data URLs and keys clients by forwarded address
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::HeaderMap;

use crate::constants::defaults;

/// Header carrying the originating client address chain
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Image to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Inline `data:<mime>;base64,...` URL
    DataUrl(String),
    /// Remote image URL handed to the model as-is
    Remote(String),
}

impl ImageInput {
    /// Encode raw image bytes as a data URL
    ///
    /// Returns `None` for an empty upload. A missing or blank MIME type falls
    /// back to `image/jpeg`.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], mime: Option<&str>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let mime = mime
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults::IMAGE_MIME_TYPE);
        Some(Self::DataUrl(format!(
            "data:{mime};base64,{}",
            STANDARD.encode(bytes)
        )))
    }

    /// Interpret a client-supplied image string
    ///
    /// Returns `None` for an empty string.
    #[must_use]
    pub fn from_url(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else if value.starts_with("data:") {
            Some(Self::DataUrl(value.to_owned()))
        } else {
            Some(Self::Remote(value.to_owned()))
        }
    }

    /// URL sent to the model
    #[must_use]
    pub fn as_url(&self) -> &str {
        match self {
            Self::DataUrl(url) | Self::Remote(url) => url,
        }
    }

    /// Length of the URL, for logging without the payload
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_url().len()
    }

    /// Whether the URL is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_url().is_empty()
    }

    /// Short label for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DataUrl(_) => "data_url",
            Self::Remote(_) => "remote",
        }
    }
}

/// One analyze call after input normalization
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Image to analyze; required unless `demo_mode`
    pub image: Option<ImageInput>,
    /// Free-text note from the user
    pub user_note: Option<String>,
    /// Serve the fixed demo result instead of calling the model
    pub demo_mode: bool,
    /// Rate limit identity
    pub client_key: String,
}

impl AnalysisRequest {
    /// Create a request for `client_key` with no input yet
    #[must_use]
    pub fn new(client_key: impl Into<String>) -> Self {
        Self {
            image: None,
            user_note: None,
            demo_mode: false,
            client_key: client_key.into(),
        }
    }

    /// Set the image
    #[must_use]
    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the user note; blank notes are dropped
    #[must_use]
    pub fn with_user_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.user_note = (!note.trim().is_empty()).then_some(note);
        self
    }

    /// Enable or disable demo mode
    #[must_use]
    pub const fn with_demo(mut self, demo_mode: bool) -> Self {
        self.demo_mode = demo_mode;
        self
    }
}

/// Derive the rate limit key from request headers
///
/// Uses the first comma-separated entry of `x-forwarded-for`, trimmed, and
/// falls back to `anon`.
#[must_use]
pub fn client_key_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map_or_else(|| defaults::ANONYMOUS_CLIENT_KEY.to_owned(), str::to_owned)
}

/// Parse a form or query flag (`"1"` or `"true"`)
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}
