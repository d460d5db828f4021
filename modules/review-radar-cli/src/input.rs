//! Review file loading.

use std::path::Path;

use clap::ValueEnum;
use serde_json::Value;

use review_radar_common::{Result, ReviewRadarError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// One JSON object per line; the review text lives in `--field`.
    Jsonl,
    /// Comma-separated with a header row; the review text is column `--field`.
    Csv,
    /// One review per line.
    Lines,
}

impl InputFormat {
    /// `.jsonl`/`.ndjson`/`.json` files are JSON Lines, `.csv` is CSV,
    /// anything else is plain lines.
    pub fn infer(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jsonl" | "ndjson" | "json") => Self::Jsonl,
            Some("csv") => Self::Csv,
            _ => Self::Lines,
        }
    }
}

/// Parse review texts out of a file body. Every record is checked before
/// anything is returned, so a bad line fails the whole load.
pub fn parse_reviews(contents: &str, format: InputFormat, field: &str) -> Result<Vec<String>> {
    let reviews = match format {
        InputFormat::Lines => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        InputFormat::Jsonl => {
            let mut reviews = Vec::new();
            for (index, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                reviews.push(review_field(line, index + 1, field)?);
            }
            reviews
        }
        InputFormat::Csv => csv_column(contents, field)?,
    };
    Ok(reviews)
}

fn csv_column(contents: &str, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ReviewRadarError::Input(format!("unreadable CSV header: {e}")))?;
    let position = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            ReviewRadarError::Input(format!(
                "CSV has no column '{column}' (found: {})",
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut reviews = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is row 1.
        let row = index + 2;
        let record =
            record.map_err(|e| ReviewRadarError::Input(format!("CSV row {row}: {e}")))?;
        reviews.push(record.get(position).unwrap_or_default().to_string());
    }
    Ok(reviews)
}

fn review_field(line: &str, line_no: usize, field: &str) -> Result<String> {
    let record: Value = serde_json::from_str(line)
        .map_err(|e| ReviewRadarError::Input(format!("line {line_no}: invalid JSON: {e}")))?;
    let object = record
        .as_object()
        .ok_or_else(|| ReviewRadarError::Input(format!("line {line_no}: expected a JSON object")))?;

    match object.get(field) {
        None => Err(ReviewRadarError::Input(format!(
            "line {line_no}: missing field '{field}'"
        ))),
        // Null text counts as an empty review and is skipped downstream.
        Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_skip_blanks() {
        let reviews = parse_reviews("Great phone\n\n  \nBad battery  \n", InputFormat::Lines, "x").unwrap();
        assert_eq!(reviews, vec!["Great phone", "Bad battery"]);
    }

    #[test]
    fn jsonl_reads_the_named_field() {
        let contents = r#"{"review_text": "Great phone", "stars": 5}
{"review_text": "Bad battery"}
"#;
        let reviews = parse_reviews(contents, InputFormat::Jsonl, "review_text").unwrap();
        assert_eq!(reviews, vec!["Great phone", "Bad battery"]);
    }

    #[test]
    fn jsonl_missing_field_is_an_input_error() {
        let contents = "{\"review_text\": \"ok\"}\n{\"body\": \"no text field\"}\n";
        let err = parse_reviews(contents, InputFormat::Jsonl, "review_text").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("review_text"));
    }

    #[test]
    fn jsonl_rejects_malformed_lines() {
        let err = parse_reviews("not json\n", InputFormat::Jsonl, "review_text").unwrap_err();
        assert!(matches!(err, ReviewRadarError::Input(_)));

        let err = parse_reviews("[1, 2]\n", InputFormat::Jsonl, "review_text").unwrap_err();
        assert!(matches!(err, ReviewRadarError::Input(_)));
    }

    #[test]
    fn jsonl_null_becomes_empty_text() {
        let reviews = parse_reviews("{\"t\": null}\n{\"t\": 42}\n", InputFormat::Jsonl, "t").unwrap();
        assert_eq!(reviews, vec!["".to_string(), "42".to_string()]);
    }

    #[test]
    fn csv_reads_the_named_column() {
        let contents = "review_id,review_text,stars\n\
                        1,\"Great phone, fast delivery\",5\n\
                        2,Bad battery,1\n";
        let reviews = parse_reviews(contents, InputFormat::Csv, "review_text").unwrap();
        assert_eq!(reviews, vec!["Great phone, fast delivery", "Bad battery"]);
    }

    #[test]
    fn csv_missing_column_is_an_input_error() {
        let contents = "id,body\n1,Great phone\n";
        let err = parse_reviews(contents, InputFormat::Csv, "review_text").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(err.to_string().contains("review_text"));
        assert!(err.to_string().contains("id, body"));
    }

    #[test]
    fn csv_ragged_row_is_an_input_error() {
        let contents = "review_text,stars\nGreat,5\nBad,1,extra\n";
        let err = parse_reviews(contents, InputFormat::Csv, "review_text").unwrap_err();
        assert!(matches!(err, ReviewRadarError::Input(_)));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(InputFormat::infer(Path::new("reviews.jsonl")), InputFormat::Jsonl);
        assert_eq!(InputFormat::infer(Path::new("dump.JSON")), InputFormat::Jsonl);
        assert_eq!(InputFormat::infer(Path::new("reviews.csv")), InputFormat::Csv);
        assert_eq!(InputFormat::infer(Path::new("reviews.txt")), InputFormat::Lines);
        assert_eq!(InputFormat::infer(Path::new("reviews")), InputFormat::Lines);
    }
}
