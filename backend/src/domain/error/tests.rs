//! Tests for the domain error payload.

use super::*;
use crate::domain::{TraceId, ValidationError, ValidationErrors};
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn trace_id() -> TraceId {
    TRACE_ID.parse().expect("fixture trace id is a valid UUID")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("nope"), ErrorCode::Unauthorized)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
    assert!(error.errors().is_empty());
}

#[rstest]
fn try_new_rejects_blank_message() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "  \t ");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
fn try_with_trace_id_rejects_blank_value() {
    let result = Error::internal("boom").try_with_trace_id(" ");
    assert_eq!(result, Err(ErrorValidationError::EmptyTraceId));
}

#[rstest]
fn trace_id_absent_outside_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn trace_id_captured_inside_scope(trace_id: TraceId) {
    let error = TraceId::scope(trace_id, async { Error::not_found("gone") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn validation_failed_keeps_field_order() {
    let mut errors = ValidationErrors::new();
    errors.push(ValidationError::new("plan", "Can't be blank"));
    errors.push(ValidationError::new("header_color_1", "Wrong format"));

    let error = Error::validation_failed(errors);

    assert_eq!(error.code(), ErrorCode::ValidationFailed);
    assert_eq!(
        error.errors(),
        ["plan: Can't be blank", "header_color_1: Wrong format"]
    );
}

#[rstest]
fn serialises_camel_case_and_skips_empty_fields() {
    let error = Error::invalid_request("bad").with_trace_id(TRACE_ID);
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "bad",
            "traceId": TRACE_ID,
        })
    );
}

#[rstest]
fn deserialise_rejects_blank_trace_id() {
    let payload = json!({ "code": "not_found", "message": "gone", "traceId": " " });
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[rstest]
fn deserialise_accepts_errors_list() {
    let payload = json!({
        "code": "validation_failed",
        "message": "Unprocessable Entity",
        "errors": ["email: Too long"],
    });
    let error: Error = serde_json::from_value(payload).expect("valid payload");
    assert_eq!(error.errors(), ["email: Too long"]);
}
