//! Success envelope shared by every JSON endpoint.

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

/// `{"data": ...}` wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// 200 with `data`.
    pub fn ok(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self { data })
    }

    /// 201 with `data`.
    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self { data })
    }
}

/// Plain message payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
