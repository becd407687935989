//! 外部协作者
//!
//! 纯 I/O 适配器：Sheets 日志、Resend 邮件、邮件 HTML 格式化。
//! 核心流程只依赖 `traits` 里的接口。

pub mod html_format;
pub mod mailer;
pub mod sheets;
pub mod traits;

pub use mailer::ResendMailer;
pub use sheets::SheetsLogger;
pub use traits::RecordLogger;
