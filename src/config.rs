//! 服务配置
//!
//! 启动时从环境变量读取一次，之后在请求期间只读。
//! 值为 `"placeholder"` 的凭证视为未配置（部署模板的占位值）。

use serde::{Deserialize, Serialize};

/// Google Sheets 日志凭证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// 服务账号邮箱
    pub client_email: String,
    /// 服务账号私钥（PEM，已还原换行）
    pub private_key: String,
    /// 目标表格 ID
    pub spreadsheet_id: String,
}

/// 应用配置
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Gemini API key（未配置时 chat 端点返回固定致歉文案）
    pub gemini_api_key: Option<String>,
    /// Resend API key（未配置时 report 端点返回 503）
    pub resend_api_key: Option<String>,
    /// Sheets 日志配置（缺任意一项则跳过日志）
    pub sheets: Option<SheetsConfig>,
    /// 监听端口
    pub port: u16,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let sheets = match (
            normalize_secret(std::env::var("GOOGLE_SHEETS_CLIENT_EMAIL").ok()),
            normalize_secret(std::env::var("GOOGLE_SHEETS_PRIVATE_KEY").ok()),
            normalize_secret(std::env::var("GOOGLE_SHEETS_SPREADSHEET_ID").ok()),
        ) {
            (Some(client_email), Some(private_key), Some(spreadsheet_id)) => Some(SheetsConfig {
                client_email,
                // 环境变量中的私钥通常以 `\n` 转义存储
                private_key: private_key.replace("\\n", "\n"),
                spreadsheet_id,
            }),
            _ => None,
        };

        Self {
            gemini_api_key: normalize_secret(std::env::var("GEMINI_API_KEY").ok()),
            resend_api_key: normalize_secret(std::env::var("RESEND_API_KEY").ok()),
            sheets,
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        }
    }
}

/// 规范化凭证：空字符串和 `"placeholder"` 都视为未设置
pub fn normalize_secret(value: Option<String>) -> Option<String> {
    match value {
        Some(v) if v.is_empty() || v == "placeholder" => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_secret_placeholder() {
        assert_eq!(normalize_secret(Some("placeholder".to_string())), None);
        assert_eq!(normalize_secret(Some(String::new())), None);
        assert_eq!(normalize_secret(None), None);
        assert_eq!(
            normalize_secret(Some("sk-123".to_string())),
            Some("sk-123".to_string())
        );
    }

    #[test]
    fn test_default_port() {
        let config = AppConfig::default();
        assert_eq!(config.port, 0);
        assert!(config.gemini_api_key.is_none());
        assert!(config.sheets.is_none());
    }
}
