//! 协作者 Trait 定义

use async_trait::async_trait;

/// 交互日志协作者
///
/// chat 端点在流关闭后以 fire-and-forget 方式调用。签名不可失败：
/// 实现必须自行吞掉并记录错误，绝不能影响已关闭的响应流。
#[async_trait]
pub trait RecordLogger: Send + Sync {
    /// 追加一条交互记录
    async fn record(&self, question: &str, answer: &str, email: Option<&str>);
}

/// 空实现：日志未配置时使用
pub struct NoopLogger;

#[async_trait]
impl RecordLogger for NoopLogger {
    async fn record(&self, _question: &str, answer: &str, _email: Option<&str>) {
        tracing::info!("[LOG] Sheets 未配置，跳过记录 (answer_len={})", answer.len());
    }
}
