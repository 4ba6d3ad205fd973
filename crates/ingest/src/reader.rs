use thiserror::Error;

/// Column every uploaded table must carry.
pub const TEXT_COLUMN: &str = "text";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0:?} (expected a .csv file)")]
    UnsupportedFileType(String),

    #[error("Could not read CSV file: {0}")]
    Malformed(String),

    #[error("CSV file must contain a 'text' column (found: {})", .0.join(", "))]
    MissingColumn(Vec<String>),
}

/// A data row whose text cell is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    /// 0-based position among the file's data rows
    pub row: usize,
    pub text: String,
}

/// Reject anything not named `*.csv`.
pub fn validate_file_name(name: &str) -> Result<(), IngestError> {
    if name.ends_with(".csv") {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFileType(name.to_string()))
    }
}

pub struct CsvReader;

impl CsvReader {
    /// Parse CSV bytes and return the `text` column.
    ///
    /// Rows with an empty or absent text cell are dropped; the remaining rows keep
    /// their original index.
    pub fn read_text_column(bytes: &[u8]) -> Result<Vec<TextRow>, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| IngestError::Malformed(e.to_string()))?
            .clone();

        let columns: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        if columns.iter().all(|c| c.is_empty()) {
            return Err(IngestError::Malformed("no columns to parse from file".to_string()));
        }

        let text_index = columns
            .iter()
            .position(|c| c == TEXT_COLUMN)
            .ok_or_else(|| IngestError::MissingColumn(columns.clone()))?;

        let mut rows = Vec::new();
        let mut dropped = 0;

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| IngestError::Malformed(e.to_string()))?;

            if record.len() > columns.len() {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(IngestError::Malformed(format!(
                    "expected {} fields in line {}, saw {}",
                    columns.len(),
                    line,
                    record.len()
                )));
            }

            match record.get(text_index) {
                Some(text) if !text.is_empty() => rows.push(TextRow {
                    row,
                    text: text.to_string(),
                }),
                _ => dropped += 1,
            }
        }

        tracing::debug!(rows = rows.len(), dropped, "Parsed CSV upload");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_check() {
        assert!(validate_file_name("tweets.csv").is_ok());
        assert!(validate_file_name("archive.csv.csv").is_ok());

        for name in ["tweets.txt", "tweets.CSV", "csv", "tweets.csv.gz", ""] {
            assert!(matches!(
                validate_file_name(name),
                Err(IngestError::UnsupportedFileType(_))
            ));
        }
    }

    #[test]
    fn test_drops_rows_without_text() {
        let data = b"id,text\n1,Paris is lovely.\n2,\n";
        let rows = CsvReader::read_text_column(data).unwrap();

        assert_eq!(
            rows,
            vec![TextRow {
                row: 0,
                text: "Paris is lovely.".to_string()
            }]
        );
    }

    #[test]
    fn test_keeps_original_row_index() {
        let data = b"text,author\n,nobody\nHello Berlin,ann\nshort row\n\"Quoted, with comma\",bob\n";
        let rows = CsvReader::read_text_column(data).unwrap();

        let indices: Vec<usize> = rows.iter().map(|r| r.row).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(rows[2].text, "Quoted, with comma");
    }

    #[test]
    fn test_short_rows_count_as_missing() {
        let data = b"id,author,text\n1,ann\n2,bob,Hi\n";
        let rows = CsvReader::read_text_column(data).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 1);
    }

    #[test]
    fn test_missing_text_column() {
        let err = CsvReader::read_text_column(b"id,body\n1,hello\n").unwrap_err();
        match err {
            IngestError::MissingColumn(found) => assert_eq!(found, vec!["id", "body"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            CsvReader::read_text_column(b""),
            Err(IngestError::Malformed(_))
        ));
        assert!(matches!(
            CsvReader::read_text_column(b"text\nok\ntoo,many\n"),
            Err(IngestError::Malformed(_))
        ));
        assert!(matches!(
            CsvReader::read_text_column(b"text\n\xff\xfe broken\n"),
            Err(IngestError::Malformed(_))
        ));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let rows = CsvReader::read_text_column("\u{feff}text\nhi\n".as_bytes()).unwrap();
        assert_eq!(rows[0].text, "hi");
    }
}
