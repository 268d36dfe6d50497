//! Reading the plain-text activity log shown on the notify page.

use std::{io, path::Path};

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
};

pub const EMPTY_LOG_PLACEHOLDER: &str = "No logs yet.";

/// Lazily yields trimmed lines from a log file.
pub struct LogReader {
    lines: Lines<BufReader<File>>,
}

impl LogReader {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }

    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

/// Every line of the activity log, or a single placeholder when the file does
/// not exist yet.
pub async fn read_activity_log(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let mut reader = match LogReader::open(path).await {
        Ok(reader) => reader,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(vec![EMPTY_LOG_PLACEHOLDER.to_string()]);
        }
        Err(err) => return Err(err),
    };

    let mut lines = Vec::new();
    while let Some(line) = reader.next_line().await? {
        lines.push(line);
    }
    Ok(lines)
}
