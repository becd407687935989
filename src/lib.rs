//! AI相談室 Web 服务
//!
//! 单页「向AI顾问提问」表单的后端：
//!
//! - `POST /api/chat`: 实时中继 Gemini 流式 API 的 SSE 字节流，
//!   同时累积完整回答并以 fire-and-forget 方式追加到 Google Sheets 日志
//! - `POST /api/report`: 非流式 Gemini 调用生成扩充版回答，通过 Resend 发送邮件
//!
//! # 模块结构
//!
//! - `stream`: SSE 行解码 + 中继/累积器（本服务唯一的非平凡控制流）
//! - `providers`: 上游 Gemini API 客户端
//! - `services`: 日志协作者（Sheets）、邮件（Resend）、HTML 格式化
//! - `server`: axum 路由与处理器

pub mod config;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod services;
pub mod stream;
