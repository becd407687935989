//! chat 端点
//!
//! `POST /api/chat`：把 Gemini 的流式回答以 `text/plain` chunked 方式
//! 中继给客户端。
//!
//! # 错误伪装
//!
//! 产品决策：聊天界面要始终表现为"在回答"。凭证未配置和上游失败都
//! 返回 200 + 固定文案（对前端就是一条普通回答），不是错误状态码。
//! 这两条路径同样会调用日志协作者（回答为空串），保证每个请求恰好
//! 记录一次。只有流尚未开始前的内部故障才返回 500。

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::prompt::SYSTEM_PROMPT;
use crate::providers::GeminiError;
use crate::server::AppState;
use crate::services::traits::RecordLogger;
use crate::stream::{relay_stream, RelayContext};

/// 凭证未配置时的固定文案（产品侧契约）
pub const MSG_CONFIG_PENDING: &str =
    "申し訳ありません。現在AIサービスの設定中です。しばらくお待ちください。";
/// 上游失败时的固定文案（产品侧契约）
pub const MSG_UPSTREAM_FAILED: &str = "AIからの回答取得に失敗しました。";
/// 流无法建立时的固定文案
pub const MSG_STREAMING_ERROR: &str = "ストリーミングエラー";
/// 流开始前内部故障的固定文案
pub const MSG_SERVER_ERROR: &str = "サーバーエラーが発生しました。";
/// 请求格式错误的提示
pub const MSG_INVALID_QUESTION: &str = "質問を入力してください";

/// chat 请求体
///
/// 字段用 `Value` 接收：类型不对按"缺失"处理返回 400，
/// 而不是让整个反序列化失败。
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
}

/// 构建 `text/plain; charset=utf-8` 响应
fn plain_text(status: StatusCode, body: &'static str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response())
}

/// 短路路径的 fire-and-forget 日志（回答为空串）
fn spawn_empty_record(
    logger: Arc<dyn RecordLogger>,
    question: String,
    email: Option<String>,
) {
    tokio::spawn(async move {
        logger.record(&question, "", email.as_deref()).await;
    });
}

/// chat 处理器
pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    // 校验：question 必须是非空字符串
    let question = match req.question.as_ref().and_then(|v| v.as_str()) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": MSG_INVALID_QUESTION })),
            )
                .into_response();
        }
    };
    let email = req
        .email
        .as_ref()
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    tracing::info!("[CHAT] 收到提问 (len={})", question.chars().count());

    // 凭证未配置：本地短路，不发起上游调用
    if !state.gemini.is_configured() {
        tracing::warn!("[CHAT] Gemini 未配置，返回固定文案");
        spawn_empty_record(state.logger.clone(), question, email);
        return plain_text(StatusCode::OK, MSG_CONFIG_PENDING);
    }

    match state.gemini.stream_generate(SYSTEM_PROMPT, &question).await {
        Ok(resp) => {
            let ctx = RelayContext {
                question,
                email,
            };
            let body_stream = relay_stream(resp.bytes_stream(), ctx, state.logger.clone());
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .header(header::TRANSFER_ENCODING, "chunked")
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from_stream(body_stream))
                .unwrap_or_else(|_| {
                    plain_text(StatusCode::INTERNAL_SERVER_ERROR, MSG_STREAMING_ERROR)
                })
        }
        Err(GeminiError::NotConfigured) => {
            spawn_empty_record(state.logger.clone(), question, email);
            plain_text(StatusCode::OK, MSG_CONFIG_PENDING)
        }
        Err(GeminiError::Upstream { status, .. }) => {
            // 错误体已在 provider 层完整记录
            tracing::warn!("[CHAT] 上游握手失败 status={}，返回固定文案", status);
            spawn_empty_record(state.logger.clone(), question, email);
            plain_text(StatusCode::OK, MSG_UPSTREAM_FAILED)
        }
        Err(e) => {
            tracing::error!("[CHAT] 内部错误: {}", e);
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR)
        }
    }
}
