use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use helpdesk_core::error::ApiError;
use helpdesk_core::tickets::{CreateTicketRequest, CreateTicketResponse};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use crate::tickets;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/tickets", post(create_ticket))
}

/// Reject blank required fields before touching the store.
fn validate_ticket(req: &CreateTicketRequest) -> Result<(), AppError> {
    let required = [
        ("subject", &req.subject),
        ("message", &req.message),
        ("user_id", &req.user_id),
        ("email", &req.email),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation {
                message: format!("{field} must not be empty"),
                field: Some(field.to_string()),
                received: Some(serde_json::Value::String(value.clone())),
                docs_hint: Some(
                    "subject, message, user_id, and email are all required.".to_string(),
                ),
            });
        }
    }

    Ok(())
}

/// Create a support ticket
///
/// Public intake endpoint used by the support form. Tickets start in status
/// "open" with an empty response history.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = CreateTicketResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 500, description = "Ticket store failure", body = ApiError)
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateTicketRequest>,
) -> Result<(StatusCode, Json<CreateTicketResponse>), AppError> {
    validate_ticket(&req)?;

    let ticket = tickets::create_ticket(&state.db, req).await?;
    tracing::info!(ticket_id = %ticket.id, category = %ticket.category, "support ticket created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            status: "success".to_string(),
            ticket_id: ticket.id,
            message: "Your support request has been received".to_string(),
        }),
    ))
}
