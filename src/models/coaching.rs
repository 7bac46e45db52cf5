//! The coaching message delivered to a user.

use serde::Serialize;

use super::classification::Severity;

/// The private message sent to an author after a qualifying burst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoachingMessage {
    /// The burst text the coaching refers to.
    pub burst_text: String,
    /// The short de-escalation tip.
    pub tip: String,
    /// Severity of the verdict that triggered the message.
    pub severity: Severity,
    /// Language the tip was requested in.
    pub language: String,
}

impl CoachingMessage {
    /// Renders the message body delivered to the user.
    pub fn render(&self) -> String {
        format!(
            "Quick check-in\n\n\"{}\"\n\n{}\n\nA short pause can help a lot. You've got this.",
            self.burst_text, self.tip
        )
    }
}
