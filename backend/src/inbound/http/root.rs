//! Service banner.

use actix_web::{HttpResponse, get};

use super::envelope::{Envelope, Message};

/// Greeting used by uptime checks.
#[utoipa::path(
    get,
    path = "/",
    tags = ["root"],
    security([]),
    responses((status = 200, description = "Welcome message", body = Message))
)]
#[get("/")]
pub async fn root() -> HttpResponse {
    Envelope::ok(Message::new("Welcome to Bitrise Ship Addon!"))
}
