//! report 端点
//!
//! `POST /api/report`：用非流式 Gemini 调用把简易回答扩充为完整版，
//! 组装 HTML 邮件并通过 Resend 发送。扩充失败不阻塞发送——退回简易
//! 回答继续发。

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::prompt::report_prompt;
use crate::server::AppState;
use crate::services::html_format::build_report_email;
use crate::services::mailer::MAIL_SUBJECT;

/// 必填项缺失的提示
pub const MSG_MISSING_FIELDS: &str = "必須項目が不足しています";
/// 邮件服务未配置的提示
pub const MSG_MAIL_NOT_CONFIGURED: &str = "メール送信サービスが未設定です";
/// 发送失败的提示
pub const MSG_MAIL_FAILED: &str = "メール送信に失敗しました";

/// report 请求体
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default)]
    pub answer: Option<Value>,
}

fn require_str(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// report 处理器
pub async fn handle_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> Response {
    let (Some(email), Some(question), Some(answer)) = (
        require_str(&req.email),
        require_str(&req.question),
        require_str(&req.answer),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": MSG_MISSING_FIELDS })),
        )
            .into_response();
    };

    // 扩充回答；任何失败都退回简易回答
    let full_answer = if state.gemini.is_configured() {
        match state.gemini.generate(&report_prompt(question, answer)).await {
            Ok(generated) => generated,
            Err(e) => {
                tracing::error!("[REPORT] 回答扩充失败，使用简易回答: {}", e);
                answer.to_string()
            }
        }
    } else {
        answer.to_string()
    };

    if !state.mailer.is_configured() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": MSG_MAIL_NOT_CONFIGURED })),
        )
            .into_response();
    }

    let html = build_report_email(question, &full_answer);
    match state.mailer.send(email, MAIL_SUBJECT, &html).await {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => {
            tracing::error!("[REPORT] 发送失败: {}", e);
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            // 对外文案是产品侧契约，与内部错误消息分开维护
            let msg = match e {
                ApiError::MailNotConfigured => MSG_MAIL_NOT_CONFIGURED,
                ApiError::MailSend(_) => MSG_MAIL_FAILED,
            };
            (status, Json(serde_json::json!({ "error": msg }))).into_response()
        }
    }
}
