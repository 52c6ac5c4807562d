//! Webhook server for the in-queue voice menus
//!
//! Thin transport over the queue engine: each telephony webhook (query
//! parameters on redirects, form body on gather results) is decoded into
//! step parameters, handed to the dialog controller, and the resulting
//! script is rendered back as XML. The server holds no per-call state.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use holdline_queue_engine::dialog::state::{StepParams, CALLBACK_MENU_PATH, MAIN_MENU_PATH};
use holdline_queue_engine::dialog::DialogController;
use holdline_queue_engine::prompts::PromptCatalog;
use holdline_queue_engine::script::VoiceScript;
use holdline_queue_engine::taskrouter::{HttpWorkQueueClient, WorkQueueClient};
use holdline_queue_engine::QueueEngineConfig;

#[derive(Debug, Parser)]
#[command(name = "holdline-server", about = "In-queue voice menu webhook server")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Public base URL of this service, used in continuation and media URLs
    #[arg(long)]
    base_url: String,

    /// Base URL of the work-distribution REST API
    #[arg(long, default_value = "https://taskrouter.twilio.com/v1")]
    taskrouter_url: String,

    /// Workspace sid within the work-distribution service
    #[arg(long)]
    workspace_sid: String,
}

#[derive(Clone)]
struct AppState {
    controller: Arc<DialogController>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Credentials only via the environment, never on the command line.
    let account_sid = std::env::var("TASKROUTER_ACCOUNT_SID")
        .context("TASKROUTER_ACCOUNT_SID must be set")?;
    let auth_token =
        std::env::var("TASKROUTER_AUTH_TOKEN").context("TASKROUTER_AUTH_TOKEN must be set")?;

    let mut config = QueueEngineConfig::default();
    config.base_url = args.base_url.clone();
    config.validate()?;

    let client: Arc<dyn WorkQueueClient> = Arc::new(HttpWorkQueueClient::new(
        args.taskrouter_url.clone(),
        args.workspace_sid.clone(),
        account_sid,
        auth_token,
    ));
    let controller = Arc::new(DialogController::new(
        config,
        Arc::new(PromptCatalog::builtin()),
        client,
    ));

    let app = router(AppState { controller });

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(listen = %args.listen, base_url = %args.base_url, "holdline server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(MAIN_MENU_PATH, get(main_menu).post(main_menu))
        .route(CALLBACK_MENU_PATH, get(callback_menu).post(callback_menu))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn main_menu(
    State(app): State<AppState>,
    Query(query): Query<StepParams>,
    form: Option<Form<StepParams>>,
) -> Response {
    let params = merge(query, form);
    let script = app.controller.handle_main_menu(&params).await;
    xml_response(&script)
}

async fn callback_menu(
    State(app): State<AppState>,
    Query(query): Query<StepParams>,
    form: Option<Form<StepParams>>,
) -> Response {
    let params = merge(query, form);
    let script = app.controller.handle_callback_menu(&params).await;
    xml_response(&script)
}

/// Continuation parameters ride the query string; gather results arrive in
/// the form body. Body values win on conflict.
fn merge(query: StepParams, form: Option<Form<StepParams>>) -> StepParams {
    match form {
        Some(Form(body)) => query.merged(body),
        None => query,
    }
}

fn xml_response(script: &VoiceScript) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], script.to_xml()).into_response()
}
