//! 中继/累积器
//!
//! 把上游字节流解码出的文本片段按序转发给下游，同时累积完整回答。
//! 使用 async_stream 确保每个片段立即发送（参与 chunked 传输）。
//!
//! # 终结路径
//!
//! 无论流如何结束——正常读完、上游错误、客户端提前断开（下游 body 被
//! drop）——都汇入同一条终结路径：下游流恰好关闭一次，日志协作者恰好
//! 被调用一次。实现方式是把回答累积在一个守卫对象里，流对象被 drop 时
//! 由守卫派发一个不被 join 的 tokio 任务去写日志：慢或失败的日志后端
//! 永远不会给用户可见的响应增加延迟或失败面。
//!
//! 一旦开始向客户端发送字节，HTTP 状态已不可更改，错误只能静默终止流，
//! 可见性靠 tracing 与日志行。

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::services::traits::RecordLogger;
use crate::stream::sse::SseLineDecoder;

/// 一次中继的最终结果，始终携带已累积的回答。
///
/// 即使流异常结束，部分回答也值得记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// 上游正常读完
    Completed(String),
    /// 上游流中异常（握手成功后）
    UpstreamError(String),
    /// 传输层终止（通常是客户端断开）
    TransportError(String),
}

impl StreamOutcome {
    /// 结果类型字符串（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            StreamOutcome::Completed(_) => "completed",
            StreamOutcome::UpstreamError(_) => "upstream_error",
            StreamOutcome::TransportError(_) => "transport_error",
        }
    }

    /// 取出已累积的回答
    pub fn into_transcript(self) -> String {
        match self {
            StreamOutcome::Completed(t)
            | StreamOutcome::UpstreamError(t)
            | StreamOutcome::TransportError(t) => t,
        }
    }
}

/// 一次中继的请求上下文
#[derive(Debug, Clone)]
pub struct RelayContext {
    /// 用户的提问
    pub question: String,
    /// 可选的请求者邮箱
    pub email: Option<String>,
}

/// 结果类别（守卫内部状态，终结时转为 [`StreamOutcome`]）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutcomeKind {
    Completed,
    UpstreamError,
    /// 默认值：未走到正常终点就被 drop（客户端断开等）
    TransportError,
}

/// 回答累积守卫
///
/// 持有累积中的回答；`finalize` 由状态位保证幂等，Drop 时兜底调用，
/// 因此日志恰好派发一次，且发生在下游流关闭之后。
struct TranscriptGuard {
    ctx: RelayContext,
    logger: Arc<dyn RecordLogger>,
    transcript: String,
    kind: OutcomeKind,
    logged: bool,
}

impl TranscriptGuard {
    fn new(ctx: RelayContext, logger: Arc<dyn RecordLogger>) -> Self {
        Self {
            ctx,
            logger,
            transcript: String::new(),
            kind: OutcomeKind::TransportError,
            logged: false,
        }
    }

    fn append(&mut self, fragment: &str) {
        self.transcript.push_str(fragment);
    }

    fn set_outcome(&mut self, kind: OutcomeKind) {
        self.kind = kind;
    }

    /// 终结：派发日志任务。重复调用是 no-op。
    fn finalize(&mut self) {
        if self.logged {
            return;
        }
        self.logged = true;

        let transcript = std::mem::take(&mut self.transcript);
        let outcome = match self.kind {
            OutcomeKind::Completed => StreamOutcome::Completed(transcript),
            OutcomeKind::UpstreamError => StreamOutcome::UpstreamError(transcript),
            OutcomeKind::TransportError => StreamOutcome::TransportError(transcript),
        };
        tracing::info!(
            "[RELAY] 流结束: outcome={} answer_len={}",
            outcome.kind(),
            match &outcome {
                StreamOutcome::Completed(t)
                | StreamOutcome::UpstreamError(t)
                | StreamOutcome::TransportError(t) => t.len(),
            }
        );

        let logger = self.logger.clone();
        let question = std::mem::take(&mut self.ctx.question);
        let email = self.ctx.email.take();
        let answer = outcome.into_transcript();
        // fire-and-forget：不 join，失败由实现自行吞掉
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                logger.record(&question, &answer, email.as_deref()).await;
            });
        } else {
            tracing::warn!("[RELAY] 无运行时可用，丢弃日志记录");
        }
    }
}

impl Drop for TranscriptGuard {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// 把上游字节流包装为面向客户端的文本片段流
///
/// 产出的每个 item 就是一个解码出的片段（保持解码顺序，不重排不合批）。
/// 守卫随生成器一起存活：生成器被 drop（正常耗尽或客户端断开）即触发
/// 终结路径。
pub fn relay_stream<S, E>(
    upstream: S,
    ctx: RelayContext,
    logger: Arc<dyn RecordLogger>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut decoder = SseLineDecoder::new();
        let mut guard = TranscriptGuard::new(ctx, logger);
        let mut upstream = std::pin::pin!(upstream);

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    for fragment in decoder.push(&bytes) {
                        guard.append(&fragment);
                        yield Ok(Bytes::from(fragment));
                    }
                }
                Err(e) => {
                    // 已发送 200，只能静默终止流
                    tracing::error!("[RELAY] 上游流错误: {}", e);
                    guard.set_outcome(OutcomeKind::UpstreamError);
                    return;
                }
            }
        }

        if let Some(partial) = decoder.finish() {
            // 协议约定帧以换行结尾；未终止残留按原实现丢弃
            tracing::debug!("[RELAY] 丢弃未终止残留: {} 字节", partial.len());
        }
        guard.set_outcome(OutcomeKind::Completed);
    }
}
