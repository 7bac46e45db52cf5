//! Bounded, per-conversation history of recent chat lines.

use std::collections::VecDeque;

use dashmap::DashMap;

use super::text::ellipsize;
use crate::models::ConversationKey;

/// Longest line, in characters, handed out by a snapshot.
pub const MAX_LINE_CHARS: usize = 200;

/// One recorded chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine {
    /// Who wrote the line.
    pub author_id: u64,
    /// The line as recorded, not yet truncated.
    pub text: String,
}

/// Keeps the last `capacity` lines of every conversation.
///
/// Conversations are sharded through a `DashMap`; recording into one
/// conversation never blocks another.
#[derive(Debug)]
pub struct ContextWindow {
    capacity: usize,
    lines: DashMap<ConversationKey, VecDeque<ContextLine>>,
}

impl ContextWindow {
    /// Creates a window keeping `capacity` lines per conversation.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), lines: DashMap::new() }
    }

    /// Appends a line, evicting the oldest one when the ring is full.
    pub fn record(&self, key: ConversationKey, author_id: u64, text: &str) {
        let mut ring = self.lines.entry(key).or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(ContextLine { author_id, text: text.to_string() });
    }

    /// Returns up to `limit` most recent lines, oldest first. Each line is
    /// flattened to a single line and shortened to [`MAX_LINE_CHARS`].
    pub fn snapshot(&self, key: &ConversationKey, limit: usize) -> Vec<ContextLine> {
        let Some(ring) = self.lines.get(key) else {
            return Vec::new();
        };
        let skip = ring.len().saturating_sub(limit);
        ring.iter()
            .skip(skip)
            .map(|line| ContextLine { author_id: line.author_id, text: clean_line(&line.text) })
            .collect()
    }

    /// Like [`snapshot`](Self::snapshot), rendered as `You: ...` for lines by
    /// `self_author` and `Other: ...` for everyone else.
    pub fn labelled_snapshot(
        &self,
        key: &ConversationKey,
        self_author: u64,
        limit: usize,
    ) -> Vec<String> {
        self.snapshot(key, limit)
            .into_iter()
            .map(|line| {
                let who = if line.author_id == self_author { "You" } else { "Other" };
                format!("{who}: {}", line.text)
            })
            .collect()
    }

    /// Number of conversations with at least one recorded line.
    pub fn conversation_count(&self) -> usize {
        self.lines.len()
    }
}

fn clean_line(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    ellipsize(flat.trim(), MAX_LINE_CHARS)
}
