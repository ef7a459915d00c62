//! AI mentor chat over an OpenRouter-compatible chat completions API.
//!
//! The conversation history from the UI (`{sender, text}` items) is mapped
//! onto chat roles behind a fixed mentor system prompt and sent with
//! `stream: true`. The server-sent-event body is exposed as a plain
//! [`Read`]er of reply text ([`DeltaStream`]) so the CLI can copy it to
//! stdout and the web server can forward it as a chunked response.

use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::schema::ChatConfig;

/// Persona sent as the system message of every conversation.
pub const MENTOR_SYSTEM_PROMPT: &str = "Você é um mentor de negócios de elite, uma fusão \
sintética da genialidade em funis de venda de Russell Brunson com a maestria em criação de \
ofertas irresistíveis e escala de Alex Hormozi. Sua comunicação é direta, acionável e sem \
rodeios. Seu único objetivo é ajudar o usuário a aumentar drasticamente seu ROI e escalar seus \
negócios. Analise tudo (copy, imagens, estratégias) sob a ótica de 'Como isso pode gerar mais \
resultados com menos esforço?'. Forneça planos de ação claros e táticos. Use formatação \
Markdown (como listas, negrito e itálico) para estruturar suas respostas e torná-las fáceis de \
ler.";

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Who wrote a history item in the chat UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One bubble of the chat UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub sender: Sender,
    pub text: String,
}

impl HistoryItem {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }
}

/// A single message in a chat completions request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// System prompt followed by the history mapped to `user`/`assistant`.
pub fn build_messages(history: &[HistoryItem]) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(MENTOR_SYSTEM_PROMPT))
        .chain(history.iter().map(|item| match item.sender {
            Sender::User => ChatMessage::user(&item.text),
            Sender::Ai => ChatMessage::assistant(&item.text),
        }))
        .collect()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Non-2xx answer from the chat API, carrying its body verbatim.
#[derive(Debug, Error)]
#[error("chat API returned HTTP {status}: {body}")]
pub struct UpstreamError {
    pub status: u16,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous chat client. Cheap to build; create one per request.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_url: String,
    model: String,
    api_key: String,
    site_url: String,
    site_name: String,
    timeout: Duration,
}

impl OpenRouterClient {
    /// Build a client from the resolved config. Fails when no API key is
    /// configured.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        if !config.has_api_key() {
            anyhow::bail!(
                "chat is not configured: set OPENROUTER_API_KEY or `offerdash config set chat.api_key <key>`"
            );
        }
        Ok(Self {
            api_url: config.api_url.trim().to_string(),
            model: config.model.clone(),
            api_key: config.api_key.trim().to_string(),
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation and return the streamed reply text.
    pub fn stream_chat(
        &self,
        history: &[HistoryItem],
    ) -> Result<DeltaStream<Box<dyn Read + Send + Sync + 'static>>> {
        let messages = build_messages(history);
        let body = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        info!(model = %self.model, messages = messages.len(), "sending chat request");

        let resp = ureq::post(&self.api_url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("HTTP-Referer", &self.site_url)
            .set("X-Title", &self.site_name)
            .send_json(&body);

        match resp {
            Ok(resp) => Ok(DeltaStream::new(resp.into_reader())),
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                warn!(status, body = %body, "chat API error");
                Err(UpstreamError { status, body }.into())
            }
            Err(e) => Err(e).context("chat request failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// SSE decoding
// ---------------------------------------------------------------------------

/// What a single SSE line contributes to the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// Text to append to the reply.
    Delta(String),
    /// `data: [DONE]`
    Done,
    /// Comments, keep-alives, empty deltas, malformed chunks.
    Skip,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one line of the event stream.
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    if data.is_empty() {
        return SseLine::Skip;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|s| !s.is_empty())
            .map_or(SseLine::Skip, SseLine::Delta),
        Err(e) => {
            warn!(error = %e, "skipping malformed stream chunk");
            SseLine::Skip
        }
    }
}

/// [`Read`] adapter turning an SSE body into the concatenated reply text.
///
/// Ends at `data: [DONE]` or when the upstream body ends.
pub struct DeltaStream<R> {
    lines: BufReader<R>,
    line: String,
    pending: Vec<u8>,
    pos: usize,
    done: bool,
}

impl<R: Read> DeltaStream<R> {
    pub fn new(body: R) -> Self {
        Self {
            lines: BufReader::new(body),
            line: String::new(),
            pending: Vec::new(),
            pos: 0,
            done: false,
        }
    }

    /// Drain the whole reply into a string.
    pub fn collect_text(mut self) -> io::Result<String> {
        let mut out = String::new();
        self.read_to_string(&mut out)?;
        Ok(out)
    }

    /// Pull lines until there is text to hand out or the stream ends.
    fn fill(&mut self) -> io::Result<()> {
        while self.pos >= self.pending.len() && !self.done {
            self.line.clear();
            if self.lines.read_line(&mut self.line)? == 0 {
                debug!("chat stream ended without [DONE]");
                self.done = true;
                break;
            }
            match parse_sse_line(&self.line) {
                SseLine::Delta(text) => {
                    self.pending = text.into_bytes();
                    self.pos = 0;
                }
                SseLine::Done => self.done = true,
                SseLine::Skip => {}
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DeltaStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.fill()?;
        let available = &self.pending[self.pos.min(self.pending.len())..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn history_maps_to_roles_after_system_prompt() {
        let history = vec![
            HistoryItem::user("Como escalo?"),
            HistoryItem {
                sender: Sender::Ai,
                text: "Aumente o ticket.".to_string(),
            },
        ];
        let messages = build_messages(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, MENTOR_SYSTEM_PROMPT);
        assert_eq!(messages[1], ChatMessage::user("Como escalo?"));
        assert_eq!(messages[2], ChatMessage::assistant("Aumente o ticket."));
    }

    #[test]
    fn history_deserializes_from_ui_shape() {
        let items: Vec<HistoryItem> =
            serde_json::from_str(r#"[{"sender":"user","text":"oi"},{"sender":"ai","text":"olá"}]"#)
                .unwrap();
        assert_eq!(items[1].sender, Sender::Ai);
    }

    #[test]
    fn parse_sse_line_variants() {
        assert_eq!(parse_sse_line(&chunk("Olá")), SseLine::Delta("Olá".to_string()));
        assert_eq!(parse_sse_line("data: [DONE]\n"), SseLine::Done);
        assert_eq!(parse_sse_line(": OPENROUTER PROCESSING"), SseLine::Skip);
        assert_eq!(parse_sse_line("event: ping"), SseLine::Skip);
        assert_eq!(parse_sse_line("data: {not json"), SseLine::Skip);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Skip
        );
        assert_eq!(parse_sse_line(r#"data: {"choices":[]}"#), SseLine::Skip);
    }

    #[test]
    fn delta_stream_concatenates_until_done() {
        let body = format!(
            ": keep-alive\n\n{}data: garbage\n\n{}data: [DONE]\n\n{}",
            chunk("Foco "),
            chunk("no ROI."),
            chunk("never read")
        );
        let text = DeltaStream::new(body.as_bytes()).collect_text().unwrap();
        assert_eq!(text, "Foco no ROI.");
    }

    #[test]
    fn delta_stream_handles_small_buffers_and_eof() {
        let body = chunk("multibyte ção");
        let mut stream = DeltaStream::new(body.as_bytes());
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "multibyte ção");
    }

    #[test]
    fn client_requires_api_key() {
        let config = ChatConfig::default();
        let err = OpenRouterClient::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));

        let config = ChatConfig {
            api_key: "sk-test".to_string(),
            ..ChatConfig::default()
        };
        let client = OpenRouterClient::from_config(&config).unwrap();
        assert_eq!(client.model(), config.model);
    }

    #[test]
    fn upstream_error_keeps_body() {
        let err = UpstreamError {
            status: 402,
            body: "insufficient credits".to_string(),
        };
        assert_eq!(err.to_string(), "chat API returned HTTP 402: insufficient credits");
    }
}
