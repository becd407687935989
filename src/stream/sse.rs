//! SSE 行解码器
//!
//! 增量消费上游字节流，按行切分 `data:` 事件并提取 Gemini 的文本增量。
//!
//! # 正确性不变量
//!
//! 缓冲区在任何时刻至多持有一个末尾的不完整行：只有终止符（`\n`）已经
//! 到达的行才会被处理。这保证了在任意 chunk 边界（行中间、JSON 对象
//! 中间、甚至多字节 UTF-8 序列中间）切分输入，产出的片段序列都与一次性
//! 输入完全一致。
//!
//! 缓冲区按原始字节持有：`\n` (0x0A) 在 UTF-8 中不会出现在多字节序列
//! 内部，因此按字节找换行再整行解码，天然携带被拆开的多字节字符。
//!
//! # 流结束时的残留
//!
//! 流结束时缓冲区中未终止的残留行会被静默丢弃——没有换行符结尾的 SSE
//! 帧不是合法输入，原实现也从不处理它。该行为由测试固定。

use serde_json::Value;

/// 流结束哨兵。出现在 `data:` 行中时不产出片段。
const DONE_SENTINEL: &str = "[DONE]";

/// SSE 行解码器
///
/// 每次 `push` 接收一个字节 chunk，返回其中所有完整行解出的文本片段，
/// 末尾的不完整行留在内部缓冲区，等待下一个 chunk。
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    /// 行缓冲：已接收但尚未出现行终止符的原始字节
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    /// 创建空缓冲的解码器
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一个字节 chunk，按序返回提取出的文本片段
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        // split 的最后一个元素永远作为新的缓冲区保留，即使为空
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(text) = decode_line(&line) {
                fragments.push(text);
            }
        }
        fragments
    }

    /// 流结束。返回被丢弃的未终止残留（仅用于诊断日志）。
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buffer).into_owned())
        }
    }

    /// 当前缓冲的字节数
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// 解码一个完整行，提取文本片段
///
/// 事件行必须以 `data: `（含空格）起始，与上游的输出格式一致；
/// 带前导空白或缺空格的 `data:` 行按非事件行丢弃。非事件行（SSE 注释、
/// 空行心跳）、空 payload、`[DONE]` 哨兵、JSON 解析失败、缺少文本字段，
/// 都返回 `None`，不影响后续行。
fn decode_line(line: &str) -> Option<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let data = line.strip_prefix("data: ")?;
    if data.is_empty() || data == DONE_SENTINEL {
        return None;
    }
    let json: Value = serde_json::from_str(data).ok()?;
    extract_candidate_text(&json).filter(|t| !t.is_empty())
}

/// 从 Gemini 响应 JSON 中提取增量文本
///
/// 字段路径 `candidates[0].content.parts[0].text` 是 Gemini API 的外部
/// 契约。集中在这一个函数里，换供应商时只需要改这里。
pub fn extract_candidate_text(json: &Value) -> Option<String> {
    json.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}
