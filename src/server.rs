use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::extract::{self, ParsedTask};
use crate::task::{NewTask, Task, TaskFilter, TaskUpdate};

/// Shared state of the HTTP handlers.
pub struct AppState {
    pub db: Mutex<Database>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| AppError::StorePoisoned)
    }
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .route("/parse-task", post(parse_task))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(cfg: &Config, db: Database) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(db));
    let app = router(state);

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>> {
    let tasks = state.db()?.get_tasks(&filter)?;
    tracing::debug!(count = tasks.len(), "Listed tasks");
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTask>,
) -> Result<Json<Task>> {
    let task = state.db()?.create_task(&new)?;
    tracing::info!(id = task.id, priority = %task.priority, "Task created");
    Ok(Json(task))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<Task>> {
    let task = state.db()?.update_task(id, &update)?;
    tracing::info!(id, status = %task.status, "Task updated");
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state.db()?.delete_task(id)?;
    tracing::info!(id, "Task deleted");
    Ok(Json(json!({ "message": "Task deleted" })))
}

/// Parse a sentence against the server's local clock. Nothing is stored.
async fn parse_task(Json(req): Json<ParseRequest>) -> Result<Json<ParsedTask>> {
    let text = req
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Text is required".into()))?;

    let parsed = extract::parse(&text, Local::now().naive_local());
    tracing::info!(
        priority = %parsed.priority,
        has_due_date = parsed.due_date.is_some(),
        "Parsed task text"
    );
    Ok(Json(parsed))
}
