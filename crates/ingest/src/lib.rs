pub mod reader;

pub use reader::{CsvReader, IngestError, TEXT_COLUMN, TextRow, validate_file_name};
