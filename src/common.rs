use std::fmt;
use chrono::{DateTime, Local};
use secrecy::SecretString;
use strum::{Display, EnumString};
use thiserror::Error;

pub const DEFAULT_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct ApiKey {
    pub key: SecretString,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Missing credential: environment variable {0} is not set or empty")]
    MissingCredential(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl ChatError {
    /// Fatal errors leave the session uninitialized for the process lifetime.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChatError::MissingCredential(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::RequestFailed(error_chain(&err))
    }
}

/// Joins an error and its sources, e.g. "error sending request: tcp connect
/// error: Connection refused". Sources already quoted by their parent are
/// skipped.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

// roles as they go over the wire
#[derive(Default, Clone, Copy, Debug, PartialEq,
    serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MsgRole {
    // System instructions that guide the AI's behavior
    System,
    // User input or questions
    #[default]
    User,
    // AI assistant responses
    Assistant,
}

impl fmt::Display for MsgRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MsgRole::System => write!(f, "system"),
            MsgRole::User => write!(f, "user"),
            MsgRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Label of a transcript entry, also selects its visual style.
#[derive(Display, EnumString, Debug, Clone, Copy, PartialEq, Eq,
    serde::Deserialize, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    User,
    Assistant,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
    pub at: DateTime<Local>,
}

/// Append-only log of what the user sees. Entries are never edited
/// or removed once pushed.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            kind,
            text: text.into(),
            at: Local::now(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// True until the user has sent a first prompt. Startup notices do
    /// not count.
    pub fn awaiting_first_prompt(&self) -> bool {
        !self.entries.iter().any(|e| e.kind == EntryKind::User)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    #[cfg(test)]
    pub fn kinds(&self) -> Vec<EntryKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    AwaitingResponse,
}

// what a worker task hands back to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Success(String),
    Failure(String),
}

impl From<Result<String, ChatError>> for ChatReply {
    fn from(result: Result<String, ChatError>) -> Self {
        match result {
            Ok(text) => ChatReply::Success(text),
            Err(err) => ChatReply::Failure(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub model: String,
    pub base_url: String,
    pub system_prompt: Option<String>,
    pub key_var: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_prompt: None,
            key_var: DEFAULT_KEY_VAR.to_string(),
        }
    }
}

pub fn mask_key_secure(key: &str) -> String {
    let char_count = key.chars().count();

    // If too short, don't even return it. Just return placeholders.
    if char_count <= 4 {
        return "***".to_string();
    }

    let start: String = key.chars().take(2).collect();
    let end: String = key.chars().rev().take(2).collect::<Vec<_>>()
        .into_iter().rev().collect();

    format!("{}..{}", start, end)
}
