use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use helpdesk_core::analysis::{AnalysisResult, TicketInsight};
use helpdesk_core::error::ApiError;
use helpdesk_core::tickets::{RespondRequest, RespondResponse, Ticket, TicketResponse};

use crate::analysis;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::html_escape;
use crate::state::AppState;
use crate::tickets;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/admin/ticket/{id}", get(admin_ticket_detail))
        .route("/admin/ticket/{id}/respond", post(respond_to_ticket))
}

// ──────────────────────────────────────────────
// GET /admin
// ──────────────────────────────────────────────

/// Admin dashboard
///
/// Lists the most recent tickets together with a batch AI analysis. The
/// analysis degrades to a fallback when the generation provider is down, so
/// this page renders regardless.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Dashboard with recent tickets and batch analysis"),
        (status = 500, description = "Ticket store failure", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn admin_dashboard(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let tickets = tickets::list_tickets(&state.db, tickets::LIST_LIMIT).await?;
    let analysis = analysis::analyze_batch(state.generation.as_ref(), &tickets).await;

    Ok(Html(render_dashboard(&tickets, &analysis)))
}

// ──────────────────────────────────────────────
// GET /admin/ticket/{id}
// ──────────────────────────────────────────────

/// Ticket detail
///
/// One ticket with its response history and a per-ticket AI insight.
#[utoipa::path(
    get,
    path = "/admin/ticket/{id}",
    params(
        ("id" = Uuid, Path, description = "Ticket id")
    ),
    responses(
        (status = 200, description = "Ticket detail page with insight"),
        (status = 404, description = "Ticket not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn admin_ticket_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let ticket = tickets::get_ticket(&state.db, id).await?;
    let insight = analysis::analyze_single(state.generation.as_ref(), &ticket).await;

    Ok(Html(render_ticket_detail(&ticket, &insight)))
}

// ──────────────────────────────────────────────
// POST /admin/ticket/{id}/respond
// ──────────────────────────────────────────────

/// Respond to a ticket
///
/// Appends a response to the ticket's history and optionally overwrites its
/// status. Appends are atomic: concurrent responses never overwrite each
/// other.
#[utoipa::path(
    post,
    path = "/admin/ticket/{id}/respond",
    params(
        ("id" = Uuid, Path, description = "Ticket id")
    ),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Response recorded", body = RespondResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Ticket not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn respond_to_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<RespondRequest>,
) -> Result<Json<RespondResponse>, AppError> {
    validate_respond(&req)?;

    let ticket = tickets::append_response(
        &state.db,
        id,
        req.message.trim(),
        req.responder.as_deref(),
        req.status.as_deref(),
    )
    .await?;
    tracing::info!(ticket_id = %ticket.id, status = %ticket.status, "admin response recorded");

    Ok(Json(RespondResponse {
        status: "success".to_string(),
        message: "Response recorded".to_string(),
    }))
}

fn validate_respond(req: &RespondRequest) -> Result<(), AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation {
            message: "message must not be empty".to_string(),
            field: Some("message".to_string()),
            received: Some(serde_json::Value::String(req.message.clone())),
            docs_hint: None,
        });
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Page rendering
// ──────────────────────────────────────────────

const PAGE_STYLE: &str = r#"body { font-family: system-ui, sans-serif; max-width: 920px; margin: 40px auto; padding: 0 20px; }
h1 { font-size: 1.5em; }
h2 { font-size: 1.15em; margin-top: 28px; }
h3 { font-size: 1em; margin-bottom: 4px; }
table { border-collapse: collapse; width: 100%; margin-top: 8px; }
th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #ddd; }
label { display: block; margin-top: 12px; font-weight: 500; }
input[type="text"], textarea, select { width: 100%; padding: 8px; margin-top: 4px; box-sizing: border-box; }
button { margin-top: 16px; padding: 8px 20px; background: #111; color: #fff; border: none; cursor: pointer; }
.info { color: #666; font-size: 0.9em; }
.response { border-left: 3px solid #ddd; padding-left: 12px; margin-top: 12px; }"#;

fn render_dashboard(tickets: &[Ticket], analysis: &AnalysisResult) -> String {
    let rows = if tickets.is_empty() {
        r#"<tr><td colspan="5" class="info">No tickets yet</td></tr>"#.to_string()
    } else {
        tickets.iter().map(ticket_row).collect()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Support Dashboard</title>
<style>
{PAGE_STYLE}
</style>
</head>
<body>
<h1>Support Dashboard</h1>
<section>
<h2>AI Analysis</h2>
<p>{summary}</p>
<h3>Common issues</h3>
<ul>{common_issues}</ul>
<h3>Insights</h3>
<ul>{insights}</ul>
<h3>Recommendations</h3>
<ul>{recommendations}</ul>
</section>
<section>
<h2>Tickets</h2>
<table>
<tr><th>Ticket</th><th>Subject</th><th>Category</th><th>Status</th><th>Created</th></tr>
{rows}
</table>
</section>
</body>
</html>"#,
        summary = html_escape(&analysis.summary),
        common_issues = list_items(&analysis.common_issues),
        insights = list_items(&analysis.insights),
        recommendations = list_items(&analysis.recommendations),
        rows = rows,
    )
}

fn ticket_row(ticket: &Ticket) -> String {
    format!(
        r#"<tr><td><a href="/admin/ticket/{id}">{id}</a></td><td>{subject}</td><td>{category}</td><td>{status}</td><td>{created}</td></tr>"#,
        id = ticket.id,
        subject = html_escape(&ticket.subject),
        category = html_escape(&ticket.category),
        status = html_escape(&ticket.status),
        created = ticket.created_at.format("%Y-%m-%d %H:%M"),
    )
}

fn render_ticket_detail(ticket: &Ticket, insight: &TicketInsight) -> String {
    let analysis_ref = match &ticket.analysis_id {
        Some(id) => format!(
            r#"<p class="info">Analysis reference: {}</p>"#,
            html_escape(id)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Ticket — {subject}</title>
<style>
{PAGE_STYLE}
</style>
</head>
<body>
<p><a href="/admin">&larr; Dashboard</a></p>
<h1>{subject}</h1>
<p class="info">{category} · {status} · opened {created} by {email}</p>
{analysis_ref}
<section>
<h2>Message</h2>
<p>{message}</p>
</section>
<section>
<h2>Responses</h2>
{responses}
</section>
<section>
<h2>AI Insight</h2>
<p><strong>Urgency:</strong> {urgency}</p>
<p><strong>Suggested category:</strong> {category_suggestion}</p>
<p><strong>Suggested response:</strong> {response_suggestion}</p>
<h3>Related improvements</h3>
<ul>{improvements}</ul>
</section>
<section>
<h2>Respond</h2>
<form id="respond-form">
<label>Message<textarea name="message" rows="5" required></textarea></label>
<label>Responder<input type="text" name="responder" placeholder="admin"></label>
<label>Status<select name="status">
<option value="">(keep current)</option>
<option value="open">open</option>
<option value="in_progress">in_progress</option>
<option value="resolved">resolved</option>
<option value="closed">closed</option>
</select></label>
<button type="submit">Send response</button>
</form>
<p id="result" class="info"></p>
</section>
<script>
const form = document.getElementById('respond-form');
form.addEventListener('submit', async (event) => {{
  event.preventDefault();
  const data = Object.fromEntries(new FormData(form));
  if (!data.responder) delete data.responder;
  if (!data.status) delete data.status;
  const result = document.getElementById('result');
  try {{
    const res = await fetch(window.location.pathname + '/respond', {{
      method: 'POST',
      headers: {{'Content-Type': 'application/json'}},
      body: JSON.stringify(data),
    }});
    const body = await res.json();
    if (res.ok) {{
      window.location.reload();
    }} else {{
      result.textContent = body.message || 'Request failed.';
    }}
  }} catch (err) {{
    result.textContent = 'Request failed: ' + err;
  }}
}});
</script>
</body>
</html>"#,
        subject = html_escape(&ticket.subject),
        category = html_escape(&ticket.category),
        status = html_escape(&ticket.status),
        created = ticket.created_at.format("%Y-%m-%d %H:%M"),
        email = html_escape(&ticket.email),
        analysis_ref = analysis_ref,
        message = html_escape(&ticket.message),
        responses = response_items(&ticket.responses),
        urgency = insight.urgency,
        category_suggestion = html_escape(&insight.category_suggestion),
        response_suggestion = html_escape(&insight.response_suggestion),
        improvements = list_items(&insight.related_improvements),
    )
}

fn response_items(responses: &[TicketResponse]) -> String {
    if responses.is_empty() {
        return r#"<p class="info">No responses yet</p>"#.to_string();
    }

    responses
        .iter()
        .map(|response| {
            format!(
                r#"<div class="response"><p class="info">{responder} — {created}</p><p>{message}</p></div>"#,
                responder = html_escape(&response.responder),
                created = response.created_at.format("%Y-%m-%d %H:%M"),
                message = html_escape(&response.message),
            )
        })
        .collect()
}

fn list_items(items: &[String]) -> String {
    if items.is_empty() {
        return r#"<li class="info">None</li>"#.to_string();
    }

    items
        .iter()
        .map(|item| format!("<li>{}</li>", html_escape(item)))
        .collect()
}
