//! Resend 邮件客户端
//!
//! report 端点用它把扩充版回答发给用户。只封装一个 send 调用。

use reqwest::Client;

use crate::error::ApiError;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
/// 发件人（产品侧契约）
pub const MAIL_FROM: &str = "AI相談室 <noreply@if-juku.net>";
/// 邮件主题（产品侧契约）
pub const MAIL_SUBJECT: &str = "【AI相談室】ご相談の回答";

/// Resend 邮件发送器
pub struct ResendMailer {
    api_key: Option<String>,
    client: Client,
}

impl ResendMailer {
    /// 创建发送器。`api_key` 为 `None` 时 `send` 返回
    /// [`ApiError::MailNotConfigured`]。
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { api_key, client }
    }

    /// 邮件服务是否已配置
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// 发送一封 HTML 邮件
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), ApiError> {
        let api_key = self.api_key.as_ref().ok_or(ApiError::MailNotConfigured)?;

        let body = serde_json::json!({
            "from": MAIL_FROM,
            "to": to,
            "subject": subject,
            "html": html,
        });

        tracing::info!("[RESEND] 发送邮件: to={} subject={}", to, subject);
        let resp = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::MailSend(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("[RESEND] 发送失败: status={} body={}", status, body);
            return Err(ApiError::MailSend(format!("{status} - {body}")));
        }
        tracing::info!("[RESEND] 发送成功: to={}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_key_is_mail_not_configured() {
        let mailer = ResendMailer::new(None);
        assert!(!mailer.is_configured());
        let err = mailer
            .send("a@example.com", "件名", "<p>本文</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MailNotConfigured));
    }
}
