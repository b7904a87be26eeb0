//! Ticket repository: all reads and writes against the `support_tickets`
//! collection go through these functions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use helpdesk_core::tickets::{
    CreateTicketRequest, DEFAULT_CATEGORY, DEFAULT_RESPONDER, STATUS_OPEN, Ticket, TicketResponse,
};

use crate::error::AppError;

/// Most tickets a single listing query will return.
pub const LIST_LIMIT: i64 = 50;

const TICKET_COLUMNS: &str = "id, user_id, email, subject, message, category, analysis_id, \
     status, responses, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    user_id: String,
    email: String,
    subject: String,
    message: String,
    category: String,
    analysis_id: Option<String>,
    status: String,
    responses: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TicketRow {
    fn into_ticket(self) -> Ticket {
        Ticket {
            id: self.id,
            user_id: self.user_id,
            email: self.email,
            subject: self.subject,
            message: self.message,
            category: self.category,
            analysis_id: self.analysis_id,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            responses: parse_responses(self.responses),
        }
    }
}

/// Decode the JSONB `responses` array, dropping entries that do not match the
/// response shape rather than failing the whole read.
fn parse_responses(value: serde_json::Value) -> Vec<TicketResponse> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_category(raw: &str) -> String {
    let category = raw.trim();
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.to_string()
    }
}

/// Create a ticket: fresh id, status "open", empty response history,
/// `created_at == updated_at`.
pub async fn create_ticket(pool: &PgPool, req: CreateTicketRequest) -> Result<Ticket, AppError> {
    let ticket_id = Uuid::now_v7();
    let now = Utc::now();

    let row = sqlx::query_as::<_, TicketRow>(&format!(
        "INSERT INTO support_tickets \
             (id, user_id, email, subject, message, category, analysis_id, status, responses, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '[]'::jsonb, $9, $9) \
         RETURNING {TICKET_COLUMNS}"
    ))
    .bind(ticket_id)
    .bind(req.user_id.trim())
    .bind(req.email.trim())
    .bind(req.subject.trim())
    .bind(&req.message)
    .bind(normalize_category(&req.category))
    .bind(&req.analysis_id)
    .bind(STATUS_OPEN)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row.into_ticket())
}

pub async fn get_ticket(pool: &PgPool, id: Uuid) -> Result<Ticket, AppError> {
    let row = sqlx::query_as::<_, TicketRow>(&format!(
        "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound {
        resource: format!("ticket {}", id),
    })?;

    Ok(row.into_ticket())
}

/// At most `limit` tickets (capped at [`LIST_LIMIT`]), newest first.
pub async fn list_tickets(pool: &PgPool, limit: i64) -> Result<Vec<Ticket>, AppError> {
    let limit = limit.clamp(1, LIST_LIMIT);

    let rows = sqlx::query_as::<_, TicketRow>(&format!(
        "SELECT {TICKET_COLUMNS} FROM support_tickets \
         ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
}

/// Append an admin response and bump `updated_at`; overwrite `status` only
/// when `new_status` carries a non-blank value.
///
/// The append is a single UPDATE using JSONB concatenation, so concurrent
/// responders serialize on the row and cannot lose each other's entries.
pub async fn append_response(
    pool: &PgPool,
    id: Uuid,
    message: &str,
    responder: Option<&str>,
    new_status: Option<&str>,
) -> Result<Ticket, AppError> {
    let response = TicketResponse {
        id: Uuid::now_v7(),
        message: message.to_string(),
        responder: responder
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_RESPONDER)
            .to_string(),
        created_at: Utc::now(),
    };
    let entry = serde_json::to_value(&response)
        .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;

    let new_status = new_status.map(str::trim).filter(|value| !value.is_empty());

    let row = sqlx::query_as::<_, TicketRow>(&format!(
        "UPDATE support_tickets \
         SET responses = responses || $2::jsonb, \
             status = COALESCE($3, status), \
             updated_at = $4 \
         WHERE id = $1 \
         RETURNING {TICKET_COLUMNS}"
    ))
    .bind(id)
    .bind(entry)
    .bind(new_status)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound {
        resource: format!("ticket {}", id),
    })?;

    Ok(row.into_ticket())
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::tickets::CreateTicketRequest;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn blank_category_normalizes_to_general() {
        assert_eq!(normalize_category("   "), "general");
        assert_eq!(normalize_category("billing"), "billing");
        assert_eq!(normalize_category(" technical "), "technical");
    }

    #[test]
    fn response_parser_drops_malformed_entries() {
        let value = json!([
            {"id": "018f6f10-0000-7000-8000-000000000000", "message": "m", "responder": "admin", "created_at": "2025-08-01T00:00:00Z"},
            {"unexpected": true},
            42
        ]);
        let responses = parse_responses(value);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].message, "m");

        assert!(parse_responses(json!({"not": "an array"})).is_empty());
    }

    async fn db_pool_if_available() -> Option<sqlx::PgPool> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .ok()?;

        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .expect("migrations should run");

        Some(pool)
    }

    fn sample_request(subject: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            subject: subject.to_string(),
            message: "Something is broken".to_string(),
            category: "technical".to_string(),
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            analysis_id: None,
        }
    }

    #[tokio::test]
    async fn created_ticket_is_open_with_empty_history() {
        let Some(pool) = db_pool_if_available().await else {
            return;
        };

        let created = create_ticket(&pool, sample_request("fresh ticket"))
            .await
            .expect("create should succeed");
        let fetched = get_ticket(&pool, created.id)
            .await
            .expect("fetch should succeed");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.status, "open");
        assert!(fetched.responses.is_empty());
        assert!(fetched.updated_at >= fetched.created_at);
    }

    #[tokio::test]
    async fn distinct_tickets_get_distinct_ids() {
        let Some(pool) = db_pool_if_available().await else {
            return;
        };

        let first = create_ticket(&pool, sample_request("one")).await.unwrap();
        let second = create_ticket(&pool, sample_request("two")).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn appends_are_monotonic_and_preserve_history() {
        let Some(pool) = db_pool_if_available().await else {
            return;
        };

        let ticket = create_ticket(&pool, sample_request("append target"))
            .await
            .unwrap();

        let mut updated = ticket.clone();
        for n in 1..=3 {
            updated = append_response(&pool, ticket.id, &format!("reply {n}"), None, None)
                .await
                .expect("append should succeed");
            assert_eq!(updated.responses.len(), n);
            assert!(updated.updated_at >= updated.created_at);
        }

        assert_eq!(updated.responses[0].message, "reply 1");
        assert_eq!(updated.responses[1].message, "reply 2");
        assert_eq!(updated.responses[0].responder, "admin");
        assert_eq!(updated.status, "open");
    }

    #[tokio::test]
    async fn append_with_status_overwrites_status() {
        let Some(pool) = db_pool_if_available().await else {
            return;
        };

        let ticket = create_ticket(&pool, sample_request("status change"))
            .await
            .unwrap();
        let updated = append_response(&pool, ticket.id, "resolving", Some("jo"), Some("resolved"))
            .await
            .unwrap();

        assert_eq!(updated.status, "resolved");
        assert_eq!(updated.responses[0].responder, "jo");

        // Blank status is treated as absent.
        let unchanged = append_response(&pool, ticket.id, "follow-up", None, Some("  "))
            .await
            .unwrap();
        assert_eq!(unchanged.status, "resolved");
    }

    #[tokio::test]
    async fn append_to_missing_ticket_is_not_found() {
        let Some(pool) = db_pool_if_available().await else {
            return;
        };

        let err = append_response(&pool, Uuid::now_v7(), "hello", None, None)
            .await
            .expect_err("missing ticket must fail");
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_capped() {
        let Some(pool) = db_pool_if_available().await else {
            return;
        };

        for n in 0..3 {
            create_ticket(&pool, sample_request(&format!("list {n}")))
                .await
                .unwrap();
        }

        let listed = list_tickets(&pool, 2).await.expect("list should succeed");
        assert!(listed.len() <= 2);
        for pair in listed.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        // Out-of-range limits clamp instead of failing.
        let clamped = list_tickets(&pool, 10_000).await.unwrap();
        assert!(clamped.len() as i64 <= LIST_LIMIT);
    }
}
