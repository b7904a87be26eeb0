use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category recorded when a submitter leaves the field unset or blank.
pub const DEFAULT_CATEGORY: &str = "general";
/// Status assigned to every newly created ticket.
pub const STATUS_OPEN: &str = "open";
/// Responder recorded when an admin reply omits the responder name.
pub const DEFAULT_RESPONDER: &str = "admin";

/// A user-submitted support request. The id is assigned at creation and never
/// changes; `responses` only grows — corrections happen via further responses,
/// never by editing history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    /// Unique ticket ID (UUIDv7 — time-sortable)
    pub id: Uuid,
    /// Submitter identity, immutable after creation
    pub user_id: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// Free text; defaults to "general"
    pub category: String,
    /// Optional foreign reference to an external analysis record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    /// Free-form non-empty status, "open" at creation; mutated by admin responses
    pub status: String,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Set at creation and on every mutation; always >= created_at
    pub updated_at: DateTime<Utc>,
    /// Append-only response history, oldest first
    pub responses: Vec<TicketResponse>,
}

/// An admin reply appended to a ticket's response history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: Uuid,
    pub message: String,
    /// Defaults to "admin" when the reply omits it
    pub responder: String,
    pub created_at: DateTime<Utc>,
}

/// Payload accepted by the public ticket intake endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
    /// Defaults to "general" when omitted
    #[serde(default = "default_category")]
    pub category: String,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub analysis_id: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Success envelope for ticket creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTicketResponse {
    pub status: String,
    pub ticket_id: Uuid,
    pub message: String,
}

/// Payload accepted by the admin respond endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    pub message: String,
    /// Defaults to "admin" when omitted
    #[serde(default)]
    pub responder: Option<String>,
    /// When present, overwrites the ticket status; otherwise status is unchanged
    #[serde(default)]
    pub status: Option<String>,
}

/// Success envelope for the admin respond endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct RespondResponse {
    pub status: String,
    pub message: String,
}
