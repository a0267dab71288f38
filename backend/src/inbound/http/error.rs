//! HTTP mapping for domain errors.
//!
//! The domain [`Error`] stays transport-agnostic; this module decides status
//! codes, redacts internal messages and folds repository results into it.

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use tracing::error;

use crate::domain::ports::RepositoryError;
use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER, UnknownAttribute, WriteOutcome};

pub use crate::domain::ApiResult;

/// Message returned for bodies that are not valid JSON.
pub const INVALID_JSON_BODY: &str = "Invalid request body, JSON decode failed";

const INTERNAL_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal(INTERNAL_MESSAGE);
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(trace_id = ?self.trace_id(), cause = %self.message(), "internal error");
        }
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        Error::internal(format!("actix error: {err}"))
    }
}

/// Path-addressed lookups: a missing row is a 404.
impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::not_found("Not Found"),
            other => Error::internal(other.to_string()),
        }
    }
}

impl From<UnknownAttribute> for Error {
    fn from(err: UnknownAttribute) -> Self {
        Error::invalid_request(err.to_string())
    }
}

/// Wrap a failure touching the principal's own row.
///
/// The cause is kept for logs; clients only see the generic message.
pub fn sql_error(err: RepositoryError) -> Error {
    Error::internal(format!("SQL Error: {err}"))
}

/// Turn a write outcome into the payload or a 422.
pub fn applied<T>(outcome: WriteOutcome<T>) -> ApiResult<T> {
    outcome.into_result().map_err(Error::validation_failed)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let cause = err.to_string();
    let error = match err {
        JsonPayloadError::ContentType => Error::invalid_request(INVALID_JSON_BODY),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            Error::invalid_request("Request body too large")
        }
        _ => Error::invalid_request(INVALID_JSON_BODY),
    };
    tracing::debug!(%cause, "rejected JSON body");
    error.into()
}

/// JSON extractor configuration answering malformed bodies with a 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}
