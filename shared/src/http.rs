//! HTTP helpers for the Lambda handler.

use lambda_http::http::{header, Method, StatusCode};
use lambda_http::{Body, Request, Response};
use serde::Serialize;

use crate::Error;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "content-type, authorization";

/// Error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

impl<'a> From<&'a Error> for ErrorBody<'a> {
    fn from(err: &'a Error) -> Self {
        Self {
            error: err.public_message(),
            detail: err.detail(),
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
) -> Result<Response<Body>, lambda_http::Error> {
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN)
        .body(Body::from(serde_json::to_string(data)?))?;

    Ok(response)
}

/// Convert a pipeline error into its client-facing response.
pub fn error_response(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    json_response(err.status_code(), &ErrorBody::from(err))
}

/// True for a browser CORS preflight, as opposed to a bare OPTIONS call.
pub fn is_preflight(event: &Request) -> bool {
    *event.method() == Method::OPTIONS
        && event
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Empty 204 answering a CORS preflight.
pub fn preflight_response() -> Result<Response<Body>, lambda_http::Error> {
    let response = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
        .header(header::ACCESS_CONTROL_MAX_AGE, "3600")
        .body(Body::Empty)?;

    Ok(response)
}
