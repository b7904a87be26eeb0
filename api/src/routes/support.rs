use axum::Router;
use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;

use crate::routes::html_escape;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/support", get(support_form))
        .route("/report-issue", get(report_issue_form))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ──────────────────────────────────────────────
// GET /support
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SupportFormParams {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Presence-checked only; not cryptographically verified
    #[serde(default)]
    pub token: Option<String>,
}

/// Ticket submission form
///
/// Gating is presence-only: without `user` and `email` the page degrades to
/// an auth-required notice instead of an error.
#[utoipa::path(
    get,
    path = "/support",
    params(SupportFormParams),
    responses(
        (status = 200, description = "Ticket submission form, or an auth-required page when user/email are missing")
    ),
    tag = "support"
)]
pub async fn support_form(Query(params): Query<SupportFormParams>) -> Html<String> {
    let (Some(user), Some(email)) = (present(&params.user), present(&params.email)) else {
        return Html(render_auth_required());
    };

    Html(render_ticket_form(user, email, "", "general", None))
}

// ──────────────────────────────────────────────
// GET /report-issue
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ReportIssueParams {
    #[serde(default, rename = "analysisId")]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Pre-filled issue report form
///
/// Same gating as /support; subject and category are pre-filled for a
/// problem report against an analysis record.
#[utoipa::path(
    get,
    path = "/report-issue",
    params(ReportIssueParams),
    responses(
        (status = 200, description = "Pre-filled issue report form, or an auth-required page when user/email are missing")
    ),
    tag = "support"
)]
pub async fn report_issue_form(Query(params): Query<ReportIssueParams>) -> Html<String> {
    let (Some(user), Some(email)) = (present(&params.user), present(&params.email)) else {
        return Html(render_auth_required());
    };

    let analysis_id = present(&params.analysis_id).unwrap_or("unknown");
    let subject = format!("Issue report for analysis {}", analysis_id);

    Html(render_ticket_form(
        user,
        email,
        &subject,
        "technical",
        Some(analysis_id),
    ))
}

// ──────────────────────────────────────────────
// Page rendering
// ──────────────────────────────────────────────

fn render_auth_required() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Support — Sign-in required</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 480px; margin: 60px auto; padding: 0 20px; }
h1 { font-size: 1.4em; }
.info { color: #666; font-size: 0.9em; margin-top: 8px; }
</style>
</head>
<body>
<h1>Sign-in required</h1>
<p class="info">Open this page from the app so your account details are included.</p>
</body>
</html>"#
        .to_string()
}

fn render_ticket_form(
    user: &str,
    email: &str,
    subject: &str,
    category: &str,
    analysis_id: Option<&str>,
) -> String {
    let analysis_field = match analysis_id {
        Some(id) => format!(
            r#"<input type="hidden" name="analysis_id" value="{}">"#,
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
<title>Support — New Ticket</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 560px; margin: 60px auto; padding: 0 20px; }}
h1 {{ font-size: 1.4em; }}
label {{ display: block; margin-top: 12px; font-weight: 500; }}
input[type="text"], textarea, select {{ width: 100%; padding: 8px; margin-top: 4px; box-sizing: border-box; }}
button {{ margin-top: 20px; padding: 10px 24px; background: #111; color: #fff; border: none; cursor: pointer; font-size: 1em; }}
.info {{ color: #666; font-size: 0.9em; margin-top: 8px; }}
</style>
</head>
<body>
<h1>Contact Support</h1>
<p class="info">Signed in as {email_escaped}.</p>
<form id="ticket-form">
<input type="hidden" name="user_id" value="{user_escaped}">
<input type="hidden" name="email" value="{email_escaped}">
{analysis_field}
<label>Subject<input type="text" name="subject" value="{subject_escaped}" required autofocus></label>
<label>Category<select name="category">
{category_options}
</select></label>
<label>Message<textarea name="message" rows="8" required></textarea></label>
<button type="submit">Submit ticket</button>
</form>
<p id="result" class="info"></p>
<script>
const form = document.getElementById('ticket-form');
form.addEventListener('submit', async (event) => {{
  event.preventDefault();
  const data = Object.fromEntries(new FormData(form));
  const result = document.getElementById('result');
  try {{
    const res = await fetch('/api/tickets', {{
      method: 'POST',
      headers: {{'Content-Type': 'application/json'}},
      body: JSON.stringify(data),
    }});
    const body = await res.json();
    result.textContent = res.ok
      ? 'Ticket ' + body.ticket_id + ' received. We will reply by email.'
      : (body.message || 'Submission failed.');
  }} catch (err) {{
    result.textContent = 'Submission failed: ' + err;
  }}
}});
</script>
</body>
</html>"#,
        email_escaped = html_escape(email),
        user_escaped = html_escape(user),
        analysis_field = analysis_field,
        subject_escaped = html_escape(subject),
        category_options = category_options(category),
    )
}

const CATEGORIES: &[&str] = &["general", "technical", "billing", "feedback"];

fn category_options(selected: &str) -> String {
    CATEGORIES
        .iter()
        .map(|category| {
            let marker = if *category == selected { " selected" } else { "" };
            format!(r#"<option value="{category}"{marker}>{category}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
