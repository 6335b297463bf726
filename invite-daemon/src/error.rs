use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use invite_sync::SyncError;

/// Error surface for the daemon runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bitable error: {0}")]
    Bitable(#[from] invite_bitable::BitableError),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("task failure: {0}")]
    Task(String),
}

pub(crate) fn io_err(context: impl Into<String>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        context: context.into(),
        source,
    }
}

/// Failures of the HTTP handlers, rendered as `{ success: false, message }`.
///
/// Messages are generic; details go to the log only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("请提供手机号")]
    MissingPhone,

    #[error("查询失败，请稍后重试")]
    Search(#[source] SyncError),

    #[error("获取排行榜数据失败，请稍后重试")]
    Ranking(#[source] SyncError),

    #[error("同步任务启动失败")]
    SyncUnavailable(#[source] DaemonError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingPhone => StatusCode::BAD_REQUEST,
            ApiError::Search(err) => {
                tracing::error!(error = %err, "phone search failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Ranking(err) => {
                tracing::error!(error = %err, "ranking query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::SyncUnavailable(err) => {
                tracing::error!(error = %err, "manual sync trigger failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            ApiError::Ranking(_) => json!({
                "success": false,
                "message": self.to_string(),
                "data": [],
            }),
            _ => json!({
                "success": false,
                "message": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
