// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! [`JsonExtractor`] replaces `axum::Json` for request bodies so that every
//! rejection becomes a [`ServerError::JsonError`] with a readable hint instead
//! of axum's plain-text 415/422 responses.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

const MAX_JSON_PAYLOAD_SIZE: usize = 256 * 1024;

const EMPTY_BODY: &str = "request body is empty, expected valid JSON";
const TRUNCATED_JSON: &str = "unexpected end of JSON input, request appears to be truncated";

/// Fragments of serde_json syntax errors and the hint shown for each
const SYNTAX_HINTS: [(&str, &str); 6] = [
    (
        "expected ','",
        "check for missing or extra commas between properties or array elements",
    ),
    (
        "trailing comma",
        "check for missing or extra commas between properties or array elements",
    ),
    ("expected '}'", "check for a missing closing brace '}'"),
    ("expected ']'", "check for a missing closing bracket ']'"),
    (
        "control character",
        "string values contain control characters that must be escaped",
    ),
    (
        "expected value",
        "expected a JSON value (string, number, boolean, null, object or array)",
    ),
];

/// Fragments of serde_json type errors and the hint shown for each
const TYPE_HINTS: [(&str, &str); 4] = [
    ("expected a string", "expected a string value"),
    ("expected u32", "expected a non-negative whole number"),
    ("expected f64", "expected a number"),
    ("expected struct", "expected a JSON object"),
];

/// JSON body extractor that rejects with [`ServerError::JsonError`]
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE)
            && let Ok(content_type) = content_type.to_str()
            && !content_type.starts_with("application/json")
        {
            return Err(json_error(format!(
                "invalid content-type: expected 'application/json', got '{content_type}'"
            )));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| json_error(format!("failed to read request body: {rejection}")))?;

        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(json_error(format!(
                "request body too large: {} bytes (max: {MAX_JSON_PAYLOAD_SIZE} bytes)",
                bytes.len()
            )));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(json_error(EMPTY_BODY));
        }

        serde_json::from_slice(&bytes)
            .map(JsonExtractor)
            .map_err(|err| json_error(describe(&err)))
    }
}

fn json_error(message: impl Into<String>) -> ServerError {
    ServerError::JsonError {
        message: message.into(),
    }
}

/// Human-readable description of a body that failed to decode
fn describe(err: &serde_json::Error) -> String {
    let detail = err.to_string();

    if err.is_eof() {
        return TRUNCATED_JSON.to_string();
    }

    if err.is_syntax() {
        let hint = lookup(&SYNTAX_HINTS, &detail).unwrap_or("check JSON formatting and structure");
        return format!(
            "invalid JSON syntax at line {}, column {}: {hint}",
            err.line(),
            err.column()
        );
    }

    if detail.contains("missing field") {
        return format!("JSON data validation failed: required field is missing: {detail}");
    }

    match lookup(&TYPE_HINTS, &detail) {
        Some(hint) => format!("JSON data validation failed: {hint}: {detail}"),
        None => format!("JSON data validation failed: {detail}"),
    }
}

fn lookup(table: &[(&str, &'static str)], detail: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(needle, _)| detail.contains(needle))
        .map(|(_, hint)| *hint)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderValue, Method},
    };
    use shared_types::{Condition, Product};

    use super::*;
    use crate::routes::handlers::ModerateRequest;

    fn request(body: &str) -> Request {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/negotiate")
            .body(Body::from(body.to_string()))
            .unwrap();
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        req
    }

    async fn rejection<T: DeserializeOwned + std::fmt::Debug>(body: &str) -> String {
        match JsonExtractor::<T>::from_request(request(body), &()).await {
            Err(ServerError::JsonError { message }) => message,
            other => panic!("expected JsonError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn product_body_parses() {
        let body = r#"{
            "title": "iPhone 12",
            "category": "Mobile",
            "brand": "Apple",
            "condition": "Like New",
            "age_months": 24,
            "asking_price": 35000,
            "location": "Mumbai"
        }"#;

        let JsonExtractor(product) = JsonExtractor::<Product>::from_request(request(body), &())
            .await
            .unwrap();

        assert_eq!(product.title, "iPhone 12");
        assert_eq!(product.condition, Condition::LikeNew);
        assert_eq!(product.asking_price, Some(35000.0));
    }

    #[tokio::test]
    async fn moderation_body_parses_unicode() {
        let JsonExtractor(req) = JsonExtractor::<ModerateRequest>::from_request(
            request(r#"{"message": "Still available? 🙂"}"#),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(req.message, "Still available? 🙂");
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let message = rejection::<ModerateRequest>("  ").await;
        assert!(message.contains("request body is empty"));
    }

    #[tokio::test]
    async fn truncated_body_is_rejected() {
        let message = rejection::<ModerateRequest>(r#"{"message": "hi""#).await;
        assert_eq!(message, TRUNCATED_JSON);
    }

    #[tokio::test]
    async fn syntax_error_reports_position() {
        let message = rejection::<ModerateRequest>(r#"{"message": "hi",, }"#).await;
        assert!(message.starts_with("invalid JSON syntax at line 1"));
    }

    #[tokio::test]
    async fn missing_field_is_named() {
        let message = rejection::<Product>(r#"{"title": "Sofa"}"#).await;
        assert!(message.contains("required field is missing"));
        assert!(message.contains("category"));
    }

    #[tokio::test]
    async fn wrong_type_gets_hint() {
        let body = r#"{
            "title": "Sofa", "category": "Furniture", "brand": "Ikea",
            "condition": "Good", "age_months": "two years", "location": "Pune"
        }"#;
        let message = rejection::<Product>(body).await;
        assert!(message.contains("expected a non-negative whole number"));
    }

    #[tokio::test]
    async fn large_payload_is_rejected() {
        let body = format!(r#"{{"message": "{}"}}"#, "x".repeat(MAX_JSON_PAYLOAD_SIZE));
        let message = rejection::<ModerateRequest>(&body).await;
        assert!(message.contains("request body too large"));
    }

    #[tokio::test]
    async fn non_json_content_type_is_rejected() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/moderate")
            .body(Body::from(r#"{"message": "hi"}"#))
            .unwrap();
        req.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let result = JsonExtractor::<ModerateRequest>::from_request(req, &()).await;
        match result {
            Err(ServerError::JsonError { message }) => {
                assert!(message.contains("invalid content-type"));
                assert!(message.contains("text/plain"));
            }
            other => panic!("expected JsonError, got {other:?}"),
        }
    }
}
