//! Recipient list parsing for CSV uploads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns every recipient upload must provide, matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 3] = ["email", "first_name", "last_name"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecipientParseError {
    #[error("File is not valid UTF-8 text")]
    NotUtf8,
    #[error("File is empty")]
    Empty,
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

/// Parse an uploaded CSV document into recipients.
///
/// The first non-empty record is the header. Extra columns are ignored; rows
/// shorter than the header yield empty strings for the missing cells.
pub fn parse_recipients(bytes: &[u8]) -> Result<Vec<Recipient>, RecipientParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| RecipientParseError::NotUtf8)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = split_records(text)?.into_iter();
    let header = records.next().ok_or(RecipientParseError::Empty)?;
    let header: Vec<String> = header
        .iter()
        .map(|cell| cell.trim().to_ascii_lowercase())
        .collect();

    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !header.iter().any(|cell| cell == *column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(RecipientParseError::MissingColumns(missing));
    }

    let index_of = |column: &str| header.iter().position(|cell| cell == column);
    let (Some(email_idx), Some(first_idx), Some(last_idx)) = (
        index_of("email"),
        index_of("first_name"),
        index_of("last_name"),
    ) else {
        return Err(RecipientParseError::MissingColumns(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        ));
    };

    let cell = |row: &[String], idx: usize| row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default();

    Ok(records
        .map(|row| Recipient {
            email: cell(&row, email_idx),
            first_name: cell(&row, first_idx),
            last_name: cell(&row, last_idx),
        })
        .collect())
}

fn split_records(text: &str) -> Result<Vec<Vec<String>>, RecipientParseError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_line = 0;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                line += 1;
                finish_record(&mut records, &mut record, &mut field);
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(RecipientParseError::UnterminatedQuote { line: quote_line });
    }
    finish_record(&mut records, &mut record, &mut field);

    Ok(records)
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    let row = std::mem::take(record);
    if row.iter().any(|cell| !cell.trim().is_empty()) {
        records.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_with_mixed_case_header() {
        let csv = b"Email,First_Name,last_name\nada@example.com,Ada,Lovelace\r\ngrace@example.com,Grace,Hopper\n";
        let recipients = parse_recipients(csv).unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].email, "ada@example.com");
        assert_eq!(recipients[1].last_name, "Hopper");
    }

    #[test]
    fn reports_missing_columns_sorted() {
        let err = parse_recipients(b"email,nickname\nada@example.com,ada\n").unwrap_err();
        assert_eq!(
            err,
            RecipientParseError::MissingColumns(vec![
                "first_name".to_string(),
                "last_name".to_string()
            ])
        );
        assert_eq!(err.to_string(), "Missing columns: first_name, last_name");
    }

    #[test]
    fn quoted_fields_keep_commas_and_quotes() {
        let csv = "last_name,first_name,email\n\"O\"\"Neil, Jr\",Pat,pat@example.com\n";
        let recipients = parse_recipients(csv.as_bytes()).unwrap();
        assert_eq!(recipients[0].last_name, "O\"Neil, Jr");
        assert_eq!(recipients[0].first_name, "Pat");
    }

    #[test]
    fn blank_lines_and_short_rows_are_tolerated() {
        let csv = b"email,first_name,last_name\n\nsolo@example.com\n";
        let recipients = parse_recipients(csv).unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].first_name, "");
    }

    #[test]
    fn rejects_empty_and_binary_uploads() {
        assert_eq!(parse_recipients(b"\n\n"), Err(RecipientParseError::Empty));
        assert_eq!(parse_recipients(&[0xff, 0xfe]), Err(RecipientParseError::NotUtf8));
    }

    #[test]
    fn unterminated_quote_is_reported() {
        let err = parse_recipients(b"email,first_name,last_name\n\"open,a,b\n").unwrap_err();
        assert_eq!(err, RecipientParseError::UnterminatedQuote { line: 2 });
    }
}
