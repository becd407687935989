//! 上游 Provider
//!
//! 目前只有 Gemini。字段路径等协议细节隔离在 `stream::sse`，
//! 这里只负责发请求、拿响应。

pub mod gemini;

pub use gemini::{GeminiClient, GeminiError};
