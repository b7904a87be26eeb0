use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod analysis;
mod error;
mod extract;
mod generation;
mod middleware;
mod parse;
mod routes;
mod state;
mod tickets;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Helpdesk API",
        version = "0.1.0",
        description = "Support-ticket intake and admin review with AI-assisted triage."
    ),
    paths(
        routes::health::health_check,
        routes::support::support_form,
        routes::support::report_issue_form,
        routes::tickets::create_ticket,
        routes::admin::admin_dashboard,
        routes::admin::admin_ticket_detail,
        routes::admin::respond_to_ticket,
    ),
    components(schemas(
        HealthResponse,
        helpdesk_core::error::ApiError,
        helpdesk_core::tickets::Ticket,
        helpdesk_core::tickets::TicketResponse,
        helpdesk_core::tickets::CreateTicketRequest,
        helpdesk_core::tickets::CreateTicketResponse,
        helpdesk_core::tickets::RespondRequest,
        helpdesk_core::tickets::RespondResponse,
        helpdesk_core::analysis::AnalysisResult,
        helpdesk_core::analysis::TicketInsight,
        helpdesk_core::analysis::Urgency,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Ticket store connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Generation client; unconfigured keys degrade to fallback analysis
    let generation: Arc<dyn generation::GenerationClient> =
        Arc::new(generation::HttpGenerationClient::from_env());

    let app_state = state::AppState {
        db: pool,
        generation,
    };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Router with per-endpoint rate limiting on the public surfaces
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::support::router().layer(middleware::rate_limit::forms_layer()))
        .merge(routes::tickets::router().layer(middleware::rate_limit::intake_layer()))
        .merge(routes::admin::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Helpdesk API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
