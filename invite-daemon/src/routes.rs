//! HTTP surface: search, ranking, manual sync trigger, health, static files.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use invite_sync::{find_invite_code, ranking, SyncTrigger};

use crate::error::ApiError;
use crate::state::AppState;

const NOT_FOUND_MESSAGE: &str = "未找到该手机号对应的邀请码";
const SYNC_STARTED_MESSAGE: &str = "邀请人数同步任务已启动，请查看服务器日志了解执行情况";

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Text or a bare JSON number; anything else counts as missing.
    #[serde(default)]
    pub phone: Option<Value>,
}

impl SearchRequest {
    fn phone(&self) -> Option<String> {
        let phone = match self.phone.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!phone.is_empty()).then_some(phone)
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/feishu/search", post(search_handler))
        .route("/feishu/ranking", get(ranking_handler))
        .route("/feishu/sync-invite-counts", get(sync_handler))
        .route("/health", get(health_handler));

    let router = match &state.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(CorsLayer::permissive()).with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let phone = payload
        .ok()
        .and_then(|Json(request)| request.phone())
        .ok_or(ApiError::MissingPhone)?;

    let code = find_invite_code(
        state.service.as_ref(),
        &state.search_table,
        &state.fields,
        &phone,
    )
    .await
    .map_err(ApiError::Search)?;

    Ok(Json(match code {
        Some(code) => json!({ "success": true, "code": code }),
        None => {
            tracing::debug!("no invite code for phone");
            json!({ "success": false, "message": NOT_FOUND_MESSAGE })
        }
    }))
}

async fn ranking_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let entries = ranking(state.service.as_ref(), &state.search_table, &state.fields)
        .await
        .map_err(ApiError::Ranking)?;
    tracing::debug!(entries = entries.len(), "ranking built");
    Ok(Json(json!({ "success": true, "data": entries })))
}

/// Queue a sync run and answer without waiting for it.
async fn sync_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state
        .sync
        .trigger(SyncTrigger::Http)
        .await
        .map_err(ApiError::SyncUnavailable)?;
    tracing::info!("manual sync requested over HTTP");
    Ok(Json(json!({ "success": true, "message": SYNC_STARTED_MESSAGE })))
}
