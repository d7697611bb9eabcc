// ABOUTME: Rate limit HTTP headers for analyze responses
// ABOUTME: Renders X-RateLimit-* and Retry-After from a rate limit check outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rate Limiting Headers
//!
//! Utilities for adding standard HTTP rate limiting headers to responses.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::rate_limiting::RateLimitStatus;

/// HTTP header names for rate limiting
pub mod headers {
    /// HTTP header name for maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// HTTP header name for remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// HTTP header name for Unix timestamp when rate limit resets
    pub const X_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// HTTP header name for rate limit window duration in seconds
    pub const X_RATE_LIMIT_WINDOW: &str = "X-RateLimit-Window";
    /// HTTP header name for retry-after duration in seconds
    pub const RETRY_AFTER: &str = "Retry-After";
}

fn insert(map: &mut HeaderMap, name: &'static str, value: impl ToString) {
    if let (Ok(header_name), Ok(header_value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(&value.to_string()),
    ) {
        map.insert(header_name, header_value);
    }
}

/// Create a `HeaderMap` with rate limit headers
///
/// `Retry-After` is only present when the request was limited.
#[must_use]
pub fn create_rate_limit_headers(status: &RateLimitStatus) -> HeaderMap {
    let mut map = HeaderMap::new();

    insert(&mut map, headers::X_RATE_LIMIT_LIMIT, status.limit);
    insert(&mut map, headers::X_RATE_LIMIT_REMAINING, status.remaining);
    insert(&mut map, headers::X_RATE_LIMIT_RESET, status.reset_at.timestamp());
    insert(&mut map, headers::X_RATE_LIMIT_WINDOW, status.window_seconds);

    if let Some(retry_after) = status.retry_after_seconds {
        insert(&mut map, headers::RETRY_AFTER, retry_after);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_limited_status_includes_retry_after() {
        let status = RateLimitStatus {
            is_limited: true,
            limit: 20,
            remaining: 0,
            reset_at: Utc::now(),
            retry_after_seconds: Some(42),
            window_seconds: 600,
        };
        let map = create_rate_limit_headers(&status);

        assert_eq!(map.get("x-ratelimit-limit").unwrap(), "20");
        assert_eq!(map.get("x-ratelimit-remaining").unwrap(), "0");
        assert_eq!(map.get("x-ratelimit-window").unwrap(), "600");
        assert_eq!(map.get("retry-after").unwrap(), "42");
    }

    #[test]
    fn test_allowed_status_omits_retry_after() {
        let status = RateLimitStatus {
            is_limited: false,
            limit: 20,
            remaining: 19,
            reset_at: Utc::now(),
            retry_after_seconds: None,
            window_seconds: 600,
        };
        assert!(create_rate_limit_headers(&status).get("retry-after").is_none());
    }
}
