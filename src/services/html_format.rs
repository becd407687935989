//! 邮件 HTML 格式化
//!
//! 把 AI 的纯文本回答转为邮件用 HTML。回答约定不含 markdown，
//! 见出し用【】、箇条書き用「・」，但模型偶尔还是会输出 `#` 见出し和
//! `**加粗**`，这里一并兼容。

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^【(.+?)】$").expect("heading regex"));
static MD_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,3}\s+(.+)$").expect("md heading regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[・\-\*]\s*(.+)$").expect("bullet regex"));
static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[.．]\s*(.+)$").expect("numbered regex"));
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));

const HEADING_STYLE: &str = "font-size: 15px; font-weight: 700; color: #1a73e8; margin: 28px 0 12px 0; padding-bottom: 8px; border-bottom: 2px solid #e8f0fe;";

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `**bold**` → `<strong>`
fn render_bold(content: &str) -> String {
    BOLD_RE
        .replace_all(content, "<strong style=\"color: #202124;\">$1</strong>")
        .into_owned()
}

/// 纯文本回答 → HTML 片段
pub fn format_answer_html(text: &str) -> String {
    let escaped = escape_html(text);
    let mut html = String::new();
    let mut in_list = false;

    let close_list = |html: &mut String, in_list: &mut bool| {
        if *in_list {
            html.push_str("</ul>");
            *in_list = false;
        }
    };

    for line in escaped.split('\n') {
        let trimmed = line.trim();

        if let Some(caps) = HEADING_RE.captures(trimmed) {
            close_list(&mut html, &mut in_list);
            html.push_str(&format!(
                "<h3 style=\"{}\">{}</h3>",
                HEADING_STYLE, &caps[1]
            ));
            continue;
        }

        if let Some(caps) = MD_HEADING_RE.captures(trimmed) {
            close_list(&mut html, &mut in_list);
            let heading = caps[1].replace("**", "");
            html.push_str(&format!("<h3 style=\"{}\">{}</h3>", HEADING_STYLE, heading));
            continue;
        }

        if let Some(caps) = BULLET_RE.captures(trimmed) {
            if !in_list {
                html.push_str("<ul style=\"margin: 8px 0; padding-left: 20px;\">");
                in_list = true;
            }
            html.push_str(&format!(
                "<li style=\"margin-bottom: 6px; line-height: 1.8;\">{}</li>",
                render_bold(&caps[1])
            ));
            continue;
        }

        if let Some(caps) = NUMBERED_RE.captures(trimmed) {
            close_list(&mut html, &mut in_list);
            html.push_str(&format!(
                "<div style=\"margin-bottom: 8px; padding-left: 4px;\"><strong style=\"color: #4285F4;\">{}.</strong> {}</div>",
                &caps[1],
                render_bold(&caps[2])
            ));
            continue;
        }

        if trimmed.is_empty() {
            close_list(&mut html, &mut in_list);
            html.push_str("<div style=\"height: 12px;\"></div>");
            continue;
        }

        close_list(&mut html, &mut in_list);
        html.push_str(&format!(
            "<p style=\"margin: 0 0 8px 0; line-height: 1.9;\">{}</p>",
            render_bold(trimmed)
        ));
    }

    if in_list {
        html.push_str("</ul>");
    }
    html
}

/// 组装整封报告邮件的 HTML
pub fn build_report_email(question: &str, full_answer: &str) -> String {
    let html_body = format_answer_html(full_answer);
    format!(
        r#"
<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: 'Helvetica Neue', 'Noto Sans JP', sans-serif; max-width: 600px; margin: 0 auto; padding: 0; color: #333; background: #f5f5f5;">
  <div style="background: linear-gradient(135deg, #1a73e8, #4285F4); padding: 32px 24px; text-align: center;">
    <h1 style="color: #fff; font-size: 24px; margin: 0;">AI相談室</h1>
    <p style="color: rgba(255,255,255,0.85); margin-top: 8px; font-size: 14px;">ご相談の詳細回答</p>
  </div>

  <div style="background: #fff; padding: 32px 24px;">
    <div style="background: #f0f4ff; border-left: 4px solid #4285F4; padding: 16px 20px; border-radius: 0 8px 8px 0; margin-bottom: 32px;">
      <p style="font-size: 12px; color: #4285F4; font-weight: 700; margin: 0 0 6px 0; text-transform: uppercase; letter-spacing: 0.5px;">ご質問</p>
      <p style="font-size: 15px; line-height: 1.6; margin: 0; color: #202124;">{question}</p>
    </div>

    <div style="font-size: 14px; line-height: 1.9; color: #333;">
      {html_body}
    </div>

    <div style="margin-top: 40px; padding-top: 32px; border-top: 1px solid #e8e8e8; text-align: center;">
      <p style="font-size: 16px; font-weight: 700; color: #202124; margin-bottom: 8px;">あなたの状況に合わせた具体的なアドバイスが必要ですか？</p>
      <p style="font-size: 13px; color: #5f6368; margin-bottom: 20px;">AIの専門家が直接ご相談に乗ります（無料）</p>
      <a href="https://forms.gle/JQVBdZdrUWGysvhaA" style="display: inline-block; padding: 14px 36px; background: linear-gradient(135deg, #1a73e8, #4285F4); color: #fff; font-size: 16px; font-weight: 700; text-decoration: none; border-radius: 8px;">
        無料で専門家に相談する &rarr;
      </a>
    </div>
  </div>

  <div style="padding: 24px; text-align: center; font-size: 12px; color: #999;">
    <p>if(塾) | AI相談室</p>
    <p style="margin-top: 4px;">このメールはAI相談室からの自動送信です</p>
  </div>
</body>
</html>"#,
        question = escape_html(question),
        html_body = html_body,
    )
}
