pub mod csv_parser;
pub mod csv_serializer;

pub use csv_parser::{CsvError, CsvRecord, is_truthy, parse_csv};
pub use csv_serializer::serialize_csv;
