//! The shared conversation log.
//!
//! Every participant and the assistant append to one line-oriented file. Each
//! record is a single line of the form `role::username::content`.

mod log;

pub use log::ConversationLog;

use serde::{Deserialize, Serialize};

/// Field separator used in log lines.
pub const FIELD_SEPARATOR: &str = "::";

/// Author role of a logged turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the shared conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub username: String,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            username: username.into(),
            content: content.into(),
        }
    }

    /// Assistant turns carry no username.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            username: String::new(),
            content: content.into(),
        }
    }

    /// Encode as a log line, without the trailing newline.
    ///
    /// Newlines in the content are flattened to spaces. The username may not
    /// contain the field separator, so `::` in it collapses to `:`.
    pub fn to_line(&self) -> String {
        let mut username = flatten_newlines(&self.username);
        while username.contains(FIELD_SEPARATOR) {
            username = username.replace(FIELD_SEPARATOR, ":");
        }
        format!(
            "{}{sep}{}{sep}{}",
            self.role,
            username,
            flatten_newlines(&self.content),
            sep = FIELD_SEPARATOR
        )
    }

    /// Decode a log line. Returns `None` for lines with fewer than three
    /// fields or an unknown role.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (role, username, content) = split_fields(line)?;
        let role = role.parse().ok()?;
        Some(Self {
            role,
            username: username.trim().to_string(),
            content: content.trim().to_string(),
        })
    }
}

/// Split a raw line into `(role, username, content)` on the first two
/// separators. Content may itself contain `::`.
pub fn split_fields(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.splitn(3, FIELD_SEPARATOR);
    let role = parts.next()?;
    let username = parts.next()?;
    let content = parts.next()?;
    Some((role, username, content))
}

fn flatten_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
