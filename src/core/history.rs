use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// How many prompts a session remembers
pub const HISTORY_LIMIT: usize = 5;

/// A prompt submitted during the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub prompt: String,
    pub submitted_at: DateTime<Local>,
}

/// Most recent prompts of one interactive session, oldest first.
///
/// Lives only as long as the session that owns it; nothing is persisted.
#[derive(Debug, Clone)]
pub struct PromptHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for PromptHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    /// Append a prompt, evicting the oldest entries beyond the limit
    pub fn push(&mut self, prompt: impl Into<String>) {
        self.entries.push_back(HistoryEntry {
            prompt: prompt.into(),
            submitted_at: Local::now(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(history: &PromptHistory) -> Vec<&str> {
        history.iter().map(|e| e.prompt.as_str()).collect()
    }

    #[test]
    fn test_history_keeps_submission_order() {
        let mut history = PromptHistory::new();
        history.push("first");
        history.push("second");

        assert_eq!(prompts(&history), vec!["first", "second"]);
        assert_eq!(history.latest().unwrap().prompt, "second");
    }

    #[test]
    fn test_history_drops_oldest_beyond_five() {
        let mut history = PromptHistory::new();
        for i in 1..=7 {
            history.push(format!("prompt {}", i));
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(
            prompts(&history),
            vec!["prompt 3", "prompt 4", "prompt 5", "prompt 6", "prompt 7"]
        );
    }

    #[test]
    fn test_history_allows_repeated_prompts() {
        let mut history = PromptHistory::with_limit(3);
        history.push("same");
        history.push("same");

        assert_eq!(history.len(), 2);
    }
}
