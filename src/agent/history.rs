//! Raw access to the shared conversation log.

use crate::conversation::ConversationLog;

pub const NO_HISTORY_FOUND: &str = "No conversation history found.";
pub const NO_HISTORY_AVAILABLE: &str = "No conversation history available.";

/// Returns the last lines of the conversation log verbatim.
pub struct HistoryTool {
    max_lines: usize,
}

impl HistoryTool {
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }

    /// Number of lines requested by `query`: a digits-only query is a count,
    /// anything else asks for the maximum. Always clamped to the maximum.
    pub fn requested_lines(&self, query: &str) -> usize {
        let trimmed = query.trim();
        let requested = if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            // Only overflow can fail here
            trimmed.parse::<usize>().unwrap_or(usize::MAX)
        } else {
            self.max_lines
        };
        requested.min(self.max_lines)
    }

    pub fn run(&self, log: &ConversationLog, query: &str) -> String {
        let n = self.requested_lines(query);
        match log.tail(n) {
            Ok(None) => NO_HISTORY_FOUND.to_string(),
            Err(e) => format!("Error reading history file: {}", e),
            Ok(Some(lines)) if n == 0 || lines.is_empty() => NO_HISTORY_AVAILABLE.to_string(),
            Ok(Some(lines)) => lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationMessage;

    fn log_with(lines: &[&str]) -> (tempfile::TempDir, ConversationLog) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        if !lines.is_empty() {
            std::fs::write(&path, lines.join("\n") + "\n").unwrap();
        }
        (dir, ConversationLog::new(path))
    }

    #[test]
    fn test_requested_lines_parsing() {
        let tool = HistoryTool::new(20);
        assert_eq!(tool.requested_lines("5"), 5);
        assert_eq!(tool.requested_lines("  7 "), 7);
        assert_eq!(tool.requested_lines("abc"), 20);
        assert_eq!(tool.requested_lines(""), 20);
        assert_eq!(tool.requested_lines("-3"), 20);
        assert_eq!(tool.requested_lines("500"), 20);
        assert_eq!(tool.requested_lines("99999999999999999999999999"), 20);
        assert_eq!(tool.requested_lines("0"), 0);
    }

    #[test]
    fn test_single_line_log() {
        let (_dir, log) = log_with(&[]);
        log.append(&ConversationMessage::user("Ana", "O que é X?")).unwrap();

        let tool = HistoryTool::new(20);
        assert_eq!(tool.run(&log, "1"), "user::Ana::O que é X?");
        assert_eq!(tool.run(&log, "abc"), "user::Ana::O que é X?");
    }

    #[test]
    fn test_returns_last_lines_in_order() {
        let lines: Vec<String> = (1..=30).map(|i| format!("user::Ana::mensagem {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (_dir, log) = log_with(&refs);

        let tool = HistoryTool::new(20);
        assert_eq!(tool.run(&log, "3"), lines[27..].join("\n"));

        let all = tool.run(&log, "anything");
        assert_eq!(all.lines().count(), 20);
        assert!(all.starts_with("user::Ana::mensagem 11"));
    }

    #[test]
    fn test_missing_and_empty_selections() {
        let (_dir, log) = log_with(&[]);
        let tool = HistoryTool::new(20);
        assert_eq!(tool.run(&log, "5"), NO_HISTORY_FOUND);

        let (_dir, log) = log_with(&["user::Ana::oi"]);
        assert_eq!(tool.run(&log, "0"), NO_HISTORY_AVAILABLE);
    }

    #[test]
    fn test_read_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists at the path but cannot be read as a file
        let log = ConversationLog::new(dir.path());
        let result = HistoryTool::new(20).run(&log, "5");
        assert!(result.starts_with("Error reading history file:"));
    }
}
