use crate::pipeline::{run_batch, BatchRequest};
use crate::scan::{scan_folder, ScanResult};
use crate::server::AppContext;
use crate::state::Progress;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chaptercut_av::ToolInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/scan", get(scan))
        .route("/process", post(start_process))
        .route("/status", get(status))
        .route("/tools", get(get_tools))
}

#[derive(Deserialize)]
struct ScanQuery {
    path: Option<String>,
}

async fn scan(
    State(ctx): State<AppContext>,
    Query(params): Query<ScanQuery>,
) -> Result<Json<ScanResult>, (StatusCode, String)> {
    let path = params.path.unwrap_or_default();
    let path = path.trim();
    if path.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "path is required".to_string()));
    }

    scan_folder(
        ctx.tool.as_ref(),
        &PathBuf::from(path),
        &ctx.config.processing.extensions,
    )
    .await
    .map(Json)
    .map_err(|e| {
        tracing::warn!("Scan of {} failed: {:#}", path, e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
    })
}

#[derive(Serialize)]
struct ProcessResponse {
    status: &'static str,
    run_id: Uuid,
}

async fn start_process(
    State(ctx): State<AppContext>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<ProcessResponse>, (StatusCode, String)> {
    if !request.input.is_dir() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Input is not a directory: {}", request.input.display()),
        ));
    }
    if request.output.as_os_str().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "output is required".to_string()));
    }

    let tracker = ctx.state.start_run(&request.input, &request.output);
    let run_id = tracker.run_id();
    tracing::info!(
        "Run {} accepted: {:?} -> {:?}",
        run_id,
        request.input,
        request.output
    );

    let tool = ctx.tool.clone();
    let config = ctx.config.clone();
    tokio::spawn(async move {
        if let Err(e) = run_batch(tool, &config.processing, &request, tracker).await {
            tracing::error!("Run {} failed: {:#}", run_id, e);
        }
    });

    Ok(Json(ProcessResponse {
        status: "started",
        run_id,
    }))
}

async fn status(State(ctx): State<AppContext>) -> Json<Progress> {
    Json(ctx.state.status())
}

async fn get_tools(State(ctx): State<AppContext>) -> impl IntoResponse {
    let tool = ctx.tool.clone();
    match tokio::task::spawn_blocking(move || tool.check()).await {
        Ok(tools) => Json::<Vec<ToolInfo>>(tools).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
