use super::csv_parser::{CsvError, CsvRecord};

/// Serialize rows under the given column order.
///
/// Emits a header line followed by one `\n`-terminated line per row. Fields
/// holding a comma, quote or line break are quoted with inner quotes
/// doubled. A column missing from a row is written as an empty field.
pub fn serialize_csv(columns: &[&str], rows: &[CsvRecord]) -> Result<String, CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(columns).map_err(write_error)?;
    for row in rows {
        writer
            .write_record(
                columns
                    .iter()
                    .map(|c| row.get(*c).map(String::as_str).unwrap_or("")),
            )
            .map_err(write_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CsvError::Write(e.to_string()))
}

fn write_error(e: csv::Error) -> CsvError {
    CsvError::Write(e.to_string())
}
