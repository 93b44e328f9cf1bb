use crate::error::ApiError;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

/// Build a JSON response with the CORS header every endpoint carries.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn error(err: &ApiError) -> Result<Response<Body>, Error> {
    if err.status().is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::info!("Request rejected ({}): {}", err.status(), err);
    }
    json(err.status(), &err.to_body())
}

/// Render the outcome of a domain operation.
pub fn respond<T: Serialize>(
    status: StatusCode,
    result: Result<T, ApiError>,
) -> Result<Response<Body>, Error> {
    match result {
        Ok(value) => json(status, &value),
        Err(e) => error(&e),
    }
}

pub fn preflight() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET,POST,PUT,OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type,X-Username")
        .body(Body::Empty)
        .map_err(Box::new)?)
}

pub fn not_found() -> Result<Response<Body>, Error> {
    json(StatusCode::NOT_FOUND, &serde_json::json!({"error": "Not found"}))
}

pub fn method_not_allowed() -> Result<Response<Body>, Error> {
    json(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({"error": "Method not allowed"}),
    )
}
