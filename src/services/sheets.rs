//! Google Sheets 日志
//!
//! 把每次交互追加为表格的一行：`[JST 时间, 质问, 回答, 邮箱]`。
//!
//! 认证走服务账号：RS256 签名的 JWT 换取 OAuth access token，再调用
//! values append。日志是低频调用，token 不做缓存，每次现取。
//!
//! 所有错误都在本模块内吞掉（只留 tracing），对调用方永远成功。

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SheetsConfig;
use crate::services::traits::RecordLogger;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
/// 追加目标（表名 + 列区间）
const APPEND_RANGE: &str = "AI相談!A:D";

/// 服务账号 JWT claims
#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Sheets 日志记录器
pub struct SheetsLogger {
    config: Option<SheetsConfig>,
    client: Client,
}

impl SheetsLogger {
    /// 创建记录器。`config` 为 `None` 时所有记录调用都跳过。
    pub fn new(config: Option<SheetsConfig>) -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { config, client }
    }

    /// 用服务账号换取 access token
    async fn fetch_access_token(&self, config: &SheetsConfig) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &config.client_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("token 获取失败: {status} - {body}");
        }
        let token: TokenResponse = resp.json().await?;
        Ok(token.access_token)
    }

    /// 追加一行。失败返回 Err，由 `record` 吞掉。
    async fn append_row(
        &self,
        config: &SheetsConfig,
        question: &str,
        answer: &str,
        email: Option<&str>,
    ) -> anyhow::Result<()> {
        let token = self.fetch_access_token(config).await?;

        // JST (UTC+9) 时间戳，与运营侧查看表格的时区一致
        let jst = FixedOffset::east_opt(9 * 3600).expect("UTC+9 固定偏移始终有效");
        let now = Utc::now().with_timezone(&jst).format("%Y/%m/%d %H:%M:%S");

        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            config.spreadsheet_id,
            urlencoding::encode(APPEND_RANGE)
        );
        let body = serde_json::json!({
            "values": [[now.to_string(), question, answer, email.unwrap_or("")]]
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("append 失败: {status} - {body}");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordLogger for SheetsLogger {
    async fn record(&self, question: &str, answer: &str, email: Option<&str>) {
        let Some(config) = &self.config else {
            tracing::info!("[SHEETS] 未配置，跳过记录");
            return;
        };
        match self.append_row(config, question, answer, email).await {
            Ok(()) => tracing::info!("[SHEETS] 记录成功 (answer_len={})", answer.len()),
            Err(e) => tracing::error!("[SHEETS] 记录失败: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_without_config_is_noop() {
        // 未配置时不应发起任何网络调用（也不应 panic）
        let logger = SheetsLogger::new(None);
        logger.record("質問", "回答", Some("a@example.com")).await;
    }
}
