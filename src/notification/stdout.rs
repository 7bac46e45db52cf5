use std::io::Write;

use async_trait::async_trait;

use super::error::NotificationError;
use crate::{models::CoachingMessage, providers::Notifier};

/// Prints coaching messages to standard output. Useful for local runs and
/// for piping into another process.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

impl StdoutNotifier {
    fn format(user_id: u64, message: &CoachingMessage) -> String {
        format!(
            "=== Coaching message for user {user_id} ({}) ===\n{}\n",
            message.severity,
            message.render()
        )
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn deliver(
        &self,
        user_id: u64,
        message: &CoachingMessage,
    ) -> Result<(), NotificationError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", Self::format(user_id, message))?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[test]
    fn test_format_includes_user_and_body() {
        let message = CoachingMessage {
            burst_text: "trash".into(),
            tip: "Breathe.".into(),
            severity: Severity::Medium,
            language: "en".into(),
        };
        let out = StdoutNotifier::format(9, &message);
        assert!(out.starts_with("=== Coaching message for user 9 (medium) ==="));
        assert!(out.contains("\"trash\""));
        assert!(out.contains("Breathe."));
    }

    #[tokio::test]
    async fn test_deliver_succeeds() {
        let message = CoachingMessage {
            burst_text: "trash".into(),
            tip: "Breathe.".into(),
            severity: Severity::Medium,
            language: "en".into(),
        };
        assert!(StdoutNotifier.deliver(1, &message).await.is_ok());
    }
}
