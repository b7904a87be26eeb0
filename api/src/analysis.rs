//! AI analysis over tickets: a batch summary for the dashboard and a
//! per-ticket insight for the detail page.
//!
//! Failures on this path are absorbed, never propagated: a generation or
//! parse failure produces a deterministic fallback value so the admin pages
//! always render.

use helpdesk_core::analysis::{AnalysisResult, TicketInsight, Urgency};
use helpdesk_core::tickets::Ticket;

use crate::generation::{GenerationClient, GenerationError};
use crate::parse::{self, ExtractError};

/// Most tickets embedded in a single batch prompt.
const BATCH_PROMPT_LIMIT: usize = 10;
/// Per-ticket message excerpt length in the batch prompt.
const MESSAGE_EXCERPT_CHARS: usize = 100;
/// Raw-output excerpt length used for the degraded batch summary.
const RAW_SUMMARY_CHARS: usize = 200;

/// Summarize a batch of tickets, in caller order. An empty batch returns the
/// fixed empty-state result without touching the generation client.
pub async fn analyze_batch(client: &dyn GenerationClient, tickets: &[Ticket]) -> AnalysisResult {
    if tickets.is_empty() {
        return empty_batch_result();
    }

    let prompt = batch_prompt(tickets);
    let raw = match client.generate(&prompt).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, "batch analysis unavailable");
            return batch_error_fallback(&err);
        }
    };

    match parse::extract::<AnalysisResult>(&raw) {
        Ok(result) => result,
        Err(ExtractError::Unparseable { raw }) => {
            tracing::warn!("batch analysis output was not parseable");
            batch_parse_fallback(&raw)
        }
    }
}

/// Produce a triage insight for one ticket.
pub async fn analyze_single(client: &dyn GenerationClient, ticket: &Ticket) -> TicketInsight {
    let prompt = single_prompt(ticket);
    let raw = match client.generate(&prompt).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(ticket_id = %ticket.id, error = %err, "ticket insight unavailable");
            return single_error_fallback(ticket, &err);
        }
    };

    match parse::extract::<TicketInsight>(&raw) {
        Ok(insight) => insight,
        Err(ExtractError::Unparseable { .. }) => {
            tracing::warn!(ticket_id = %ticket.id, "ticket insight output was not parseable");
            single_parse_fallback(ticket)
        }
    }
}

/// The fixed result for an empty ticket list.
pub fn empty_batch_result() -> AnalysisResult {
    AnalysisResult {
        summary: "no tickets".to_string(),
        common_issues: Vec::new(),
        insights: Vec::new(),
        recommendations: Vec::new(),
    }
}

fn batch_prompt(tickets: &[Ticket]) -> String {
    let mut prompt = String::from(
        "You are a support operations analyst. Analyze the following support tickets \
         and respond with ONLY a JSON object, no markdown fences, matching exactly:\n\
         {\"summary\": \"...\", \"common_issues\": [\"...\"], \"insights\": [\"...\"], \
         \"recommendations\": [\"...\"]}\n\nTickets:\n",
    );
    for ticket in tickets.iter().take(BATCH_PROMPT_LIMIT) {
        prompt.push_str(&format!(
            "- [{}] ({}) {}: {}\n",
            ticket.id,
            ticket.category,
            ticket.subject,
            excerpt(&ticket.message, MESSAGE_EXCERPT_CHARS),
        ));
    }
    prompt
}

fn single_prompt(ticket: &Ticket) -> String {
    format!(
        "You are a support triage assistant. Analyze this support ticket and respond \
         with ONLY a JSON object, no markdown fences, matching exactly:\n\
         {{\"urgency\": \"high|medium|low\", \"category_suggestion\": \"...\", \
         \"response_suggestion\": \"...\", \"related_improvements\": [\"...\"]}}\n\n\
         Subject: {}\nCategory: {}\nSubmitter: {}\nMessage:\n{}",
        ticket.subject, ticket.category, ticket.email, ticket.message,
    )
}

/// First `max` characters of `text`, on a char boundary.
fn excerpt(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn batch_parse_fallback(raw: &str) -> AnalysisResult {
    AnalysisResult {
        summary: excerpt(raw, RAW_SUMMARY_CHARS),
        common_issues: vec!["Analysis output could not be structured".to_string()],
        insights: vec!["Review the raw summary above".to_string()],
        recommendations: vec!["Retry the analysis later".to_string()],
    }
}

fn batch_error_fallback(err: &GenerationError) -> AnalysisResult {
    AnalysisResult {
        summary: format!("Automated analysis is unavailable: {err}"),
        common_issues: vec!["Analysis unavailable".to_string()],
        insights: vec!["Analysis unavailable".to_string()],
        recommendations: vec!["Review the tickets manually".to_string()],
    }
}

fn single_parse_fallback(ticket: &Ticket) -> TicketInsight {
    TicketInsight {
        urgency: Urgency::Medium,
        category_suggestion: ticket.category.clone(),
        response_suggestion: "Thank you for reaching out. A support agent will review your \
                              ticket and follow up shortly."
            .to_string(),
        related_improvements: vec![
            "Ask the submitter for reproduction steps".to_string(),
            "Check recent tickets in the same category".to_string(),
        ],
    }
}

fn single_error_fallback(ticket: &Ticket, err: &GenerationError) -> TicketInsight {
    TicketInsight {
        urgency: Urgency::Unknown,
        category_suggestion: ticket.category.clone(),
        response_suggestion: format!("Automated analysis is unavailable: {err}"),
        related_improvements: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use helpdesk_core::analysis::Urgency;
    use helpdesk_core::tickets::Ticket;

    use super::*;
    use crate::generation::{GenerationClient, GenerationError};

    /// Scripted client: replies with a fixed text or fails, and records every
    /// prompt it receives.
    struct StubClient {
        reply: Option<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(GenerationError::Request("simulated outage".to_string())),
            }
        }
    }

    fn sample_ticket(subject: &str, message: &str) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::now_v7(),
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            category: "technical".to_string(),
            analysis_id: None,
            status: "open".to_string(),
            created_at: now,
            updated_at: now,
            responses: Vec::new(),
        }
    }

    #[tokio::test]
    async fn empty_batch_skips_the_generation_client() {
        let client = StubClient::replying("{}");
        let result = analyze_batch(&client, &[]).await;

        assert_eq!(result, empty_batch_result());
        assert_eq!(result.summary, "no tickets");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn batch_parses_fenced_output() {
        let client = StubClient::replying(
            "```json\n{\"summary\": \"mostly login problems\", \"common_issues\": [\"login\"], \
             \"insights\": [\"spike on Monday\"], \"recommendations\": [\"add a status page\"]}\n```",
        );
        let tickets = vec![sample_ticket("cannot log in", "password reset loops")];

        let result = analyze_batch(&client, &tickets).await;
        assert_eq!(result.summary, "mostly login problems");
        assert_eq!(result.common_issues, vec!["login"]);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn batch_failure_embeds_the_error_description() {
        let client = StubClient::failing();
        let tickets = vec![sample_ticket("x", "y")];

        let result = analyze_batch(&client, &tickets).await;
        assert!(result.summary.contains("unavailable"));
        assert!(result.summary.contains("simulated outage"));
        assert!(!result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn batch_parse_failure_degrades_to_raw_excerpt() {
        let raw = "not json ".repeat(40);
        let client = StubClient::replying(&raw);
        let tickets = vec![sample_ticket("x", "y")];

        let result = analyze_batch(&client, &tickets).await;
        assert_eq!(result.summary.chars().count(), 200);
        assert!(raw.starts_with(&result.summary));
        assert!(!result.common_issues.is_empty());
    }

    #[tokio::test]
    async fn batch_prompt_caps_tickets_and_truncates_messages() {
        let client = StubClient::failing();
        let long_message = "a".repeat(100) + &"b".repeat(50);
        let tickets: Vec<Ticket> = (0..12)
            .map(|n| sample_ticket(&format!("ticket {n}"), &long_message))
            .collect();

        analyze_batch(&client, &tickets).await;

        let prompt = client.last_prompt();
        assert_eq!(prompt.matches("- [").count(), 10);
        assert!(prompt.contains("ticket 9"));
        assert!(!prompt.contains("ticket 10"));
        assert!(prompt.contains(&"a".repeat(100)));
        assert!(!prompt.contains("bbb"));
    }

    #[tokio::test]
    async fn single_parses_valid_insight() {
        let client = StubClient::replying(
            "{\"urgency\": \"high\", \"category_suggestion\": \"billing\", \
             \"response_suggestion\": \"refund and apologize\", \
             \"related_improvements\": [\"clearer invoices\"]}",
        );
        let ticket = sample_ticket("charged twice", "two invoices this month");

        let insight = analyze_single(&client, &ticket).await;
        assert_eq!(insight.urgency, Urgency::High);
        assert_eq!(insight.category_suggestion, "billing");
    }

    #[tokio::test]
    async fn single_failure_yields_unknown_urgency_with_error() {
        let client = StubClient::failing();
        let ticket = sample_ticket("x", "y");

        let insight = analyze_single(&client, &ticket).await;
        assert_eq!(insight.urgency, Urgency::Unknown);
        assert!(insight.response_suggestion.contains("simulated outage"));
    }

    #[tokio::test]
    async fn single_parse_failure_falls_back_to_medium() {
        let client = StubClient::replying("the model rambled instead of emitting JSON");
        let ticket = sample_ticket("x", "y");

        let insight = analyze_single(&client, &ticket).await;
        assert_eq!(insight.urgency, Urgency::Medium);
        assert_eq!(insight.category_suggestion, ticket.category);
        assert_eq!(insight.related_improvements.len(), 2);
    }

    #[tokio::test]
    async fn single_prompt_embeds_ticket_fields() {
        let client = StubClient::failing();
        let ticket = sample_ticket("printer on fire", "smoke everywhere");

        analyze_single(&client, &ticket).await;

        let prompt = client.last_prompt();
        assert!(prompt.contains("printer on fire"));
        assert!(prompt.contains("smoke everywhere"));
        assert!(prompt.contains("a@b.com"));
        assert!(prompt.contains("technical"));
    }
}
