//! 流式处理
//!
//! chat 端点的核心控制流：把上游 Gemini 的 SSE 字节流增量解码为文本片段，
//! 按序转发给客户端，同时累积完整回答用于日志。
//!
//! - `sse`: 行缓冲解码器（容忍任意位置的 chunk 边界，包括多字节字符中间）
//! - `relay`: 中继/累积器（关闭下游恰好一次，日志调用恰好一次）

pub mod relay;
pub mod sse;

pub use relay::{relay_stream, RelayContext, StreamOutcome};
pub use sse::SseLineDecoder;
