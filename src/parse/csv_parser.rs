use indexmap::IndexMap;

/// One CSV data row: header name → raw field value, in column order
pub type CsvRecord = IndexMap<String, String>;

/// Tokens that count as "read" regardless of configuration.
/// `sim` is the Portuguese affirmative.
const TRUTHY: &[&str] = &["1", "true", "yes", "sim"];

/// Error type for CSV reading and writing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsvError {
    #[error("malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
    #[error("CSV input has no header row")]
    MissingHeader,
    #[error("could not write CSV: {0}")]
    Write(String),
}

/// Parse a CSV document whose first record is the header.
///
/// Values are returned as raw strings. Rows shorter than the header only
/// carry the fields they have; extra fields beyond the header are dropped.
/// Input with an unterminated quoted field is rejected as a whole.
pub fn parse_csv(text: &str) -> Result<Vec<CsvRecord>, CsvError> {
    let text = text.trim_end_matches(['\r', '\n']);
    check_quotes(text)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::MissingHeader);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(malformed)?;
        let record: CsvRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Coerce a read-column value. Absent or unrecognized values are false.
pub fn is_truthy(value: Option<&str>, extra: &[String]) -> bool {
    let Some(value) = value else {
        return false;
    };
    let value = value.trim();
    TRUTHY.iter().any(|t| value.eq_ignore_ascii_case(t))
        || extra.iter().any(|t| value.eq_ignore_ascii_case(t.trim()))
}

fn malformed(e: csv::Error) -> CsvError {
    let line = e.position().map_or(0, |p| p.line());
    CsvError::Malformed {
        line,
        message: e.to_string(),
    }
}

/// Reject a quoted field that never closes. The csv reader accepts those
/// silently and would swallow the rest of the file into one value.
fn check_quotes(text: &str) -> Result<(), CsvError> {
    let mut chars = text.chars().peekable();
    let mut line = 1u64;
    let mut opened_at = 0u64;
    let mut in_quotes = false;
    let mut field_start = true;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match c {
            '"' if field_start => {
                in_quotes = true;
                opened_at = line;
                field_start = false;
            }
            ',' | '\n' => field_start = true,
            '\r' => {}
            _ => field_start = false,
        }
    }

    if in_quotes {
        return Err(CsvError::Malformed {
            line: opened_at,
            message: "unterminated quoted field".to_string(),
        });
    }
    Ok(())
}
