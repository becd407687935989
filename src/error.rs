//! 错误类型
//!
//! 只承载 report 端点邮件链路的错误。chat 端点在产品层面把错误伪装成
//! 200 的普通回答文本，不经过这里；上游调用错误见
//! [`crate::providers::GeminiError`]。

use thiserror::Error;

/// API 错误
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// 邮件服务未配置
    #[error("邮件服务未配置")]
    MailNotConfigured,

    /// 邮件发送失败
    #[error("邮件发送失败: {0}")]
    MailSend(String),
}

impl ApiError {
    /// 获取对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MailNotConfigured => 503,
            ApiError::MailSend(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MailNotConfigured.status_code(), 503);
        assert_eq!(
            ApiError::MailSend("502 - bad gateway".to_string()).status_code(),
            500
        );
    }
}
