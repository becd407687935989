//! Gemini API 客户端
//!
//! 两种调用方式：
//!
//! - `stream_generate`: SSE 流式生成（chat 端点），返回 reqwest 响应，
//!   由调用方消费 `bytes_stream()`
//! - `generate`: 非流式生成（report 端点的回答扩充）
//!
//! 握手失败不重试：这是面向用户的实时请求，一问一答的场景下重试只会
//! 增加延迟。

use reqwest::Client;
use thiserror::Error;

use crate::stream::sse::extract_candidate_text;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// chat 用的流式模型（外部契约）
const STREAM_MODEL: &str = "gemini-2.5-flash";
/// report 扩充用的非流式模型（外部契约）
const REPORT_MODEL: &str = "gemini-2.0-flash";

/// Gemini 调用错误
#[derive(Error, Debug)]
pub enum GeminiError {
    /// API key 未配置（本地短路，不发起网络调用）
    #[error("Gemini API key 未配置")]
    NotConfigured,

    /// 握手返回非成功状态，携带完整错误响应体
    #[error("Gemini API 错误: status={status} body={body}")]
    Upstream { status: u16, body: String },

    /// 网络/请求层错误
    #[error("请求失败: {0}")]
    Request(#[from] reqwest::Error),

    /// 响应缺少期望的文本字段
    #[error("响应中没有文本内容")]
    EmptyResponse,
}

/// Gemini 客户端
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// 创建客户端。`api_key` 为 `None` 时所有调用短路返回
    /// [`GeminiError::NotConfigured`]。
    pub fn new(api_key: Option<String>) -> Self {
        // 超时配置参考流式传输场景：总超时放宽到 5 分钟
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(300))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// 覆盖 base_url（测试用 mock 服务器）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// API key 是否已配置
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// 发起流式生成请求
    ///
    /// 返回已通过状态检查的响应；非成功握手会读取完整错误体用于诊断。
    pub async fn stream_generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<reqwest::Response, GeminiError> {
        let api_key = self.api_key.as_ref().ok_or(GeminiError::NotConfigured)?;

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, STREAM_MODEL, api_key
        );
        let body = serde_json::json!({
            "system_instruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        tracing::info!("[GEMINI] 发起流式请求: model={}", STREAM_MODEL);
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("[GEMINI] 流式请求失败: status={} body={}", status, body);
            return Err(GeminiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("[GEMINI] 流式响应开始: status={}", status);
        Ok(resp)
    }

    /// 非流式生成，直接返回完整文本
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_ref().ok_or(GeminiError::NotConfigured)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, REPORT_MODEL, api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        tracing::info!("[GEMINI] 发起非流式请求: model={}", REPORT_MODEL);
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("[GEMINI] 非流式请求失败: status={} body={}", status, body);
            return Err(GeminiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await?;
        extract_candidate_text(&json).ok_or(GeminiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_short_circuits_without_network() {
        let client = GeminiClient::new(None);
        assert!(!client.is_configured());

        let err = client.stream_generate("sys", "質問").await.unwrap_err();
        assert!(matches!(err, GeminiError::NotConfigured));

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GeminiError::NotConfigured));
    }
}
