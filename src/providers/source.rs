//! Line-delimited JSON message source.
//!
//! Each non-blank line is one [`InboundMessage`]:
//!
//! ```text
//! {"conversation_id": 1, "channel_id": 2, "author_id": 3, "text": "hello"}
//! ```

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncRead, BufReader, Lines},
};

use super::traits::MessageSource;
use crate::models::InboundMessage;

/// Errors produced while reading messages.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading the underlying stream failed.
    #[error("Failed to read message stream: {0}")]
    Io(#[from] std::io::Error),

    /// A line was not a valid message.
    #[error("Invalid message on line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// The JSON error.
        source: serde_json::Error,
    },
}

/// Reads messages from any async reader, one JSON document per line.
pub struct JsonLinesSource<R> {
    lines: Lines<BufReader<R>>,
    line_number: usize,
}

impl<R: AsyncRead + Unpin + Send> JsonLinesSource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { lines: BufReader::new(reader).lines(), line_number: 0 }
    }
}

impl JsonLinesSource<File> {
    /// Opens `path` for reading.
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self::new(File::open(path).await?))
    }
}

impl JsonLinesSource<tokio::io::Stdin> {
    /// Reads from standard input.
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> MessageSource for JsonLinesSource<R> {
    async fn next_message(&mut self) -> Result<Option<InboundMessage>, SourceError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line)
                .map(Some)
                .map_err(|source| SourceError::Parse { line: self.line_number, source });
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_messages_and_skips_blank_lines() {
        let input = concat!(
            r#"{"channel_id": 2, "author_id": 3, "text": "hi"}"#,
            "\n\n",
            r#"{"conversation_id": 1, "channel_id": 2, "author_id": 4, "is_bot": true}"#,
            "\n"
        );
        let mut source = JsonLinesSource::new(input.as_bytes());

        let first = source.next_message().await.unwrap().unwrap();
        assert_eq!(first.conversation_id, None);
        assert_eq!(first.text, "hi");

        let second = source.next_message().await.unwrap().unwrap();
        assert!(second.is_bot);
        assert_eq!(second.text, "");

        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parse_error_reports_line_number() {
        let input = "\n{\"channel_id\": 1, \"author_id\": 1}\nnot json\n";
        let mut source = JsonLinesSource::new(input.as_bytes());

        assert!(source.next_message().await.unwrap().is_some());
        match source.next_message().await {
            Err(SourceError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
