use thiserror::Error;

/// Errors raised while validating a run or reading its inputs
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid timestamp \"{value}\" for {field}, expected YYYY-MM-DD HH:MM:SS")]
    Timestamp { field: &'static str, value: String },

    #[error("unknown direction sector \"{0}\"")]
    UnknownSector(String),

    #[error("speed class {0} is outside 0-11")]
    UnknownClass(u8),

    #[error("at least two {0} are required")]
    TooFewCategories(&'static str),

    #[error("{0} listed more than once")]
    DuplicateCategory(String),

    #[error("invalid frequency token \"{0}\", expected e.g. \"2MS\"")]
    Frequency(String),

    #[error("no scan frequencies given")]
    NoFrequencies,

    #[error("{field} starts after it ends ({start} > {end})")]
    InvertedRange {
        field: &'static str,
        start: String,
        end: String,
    },

    #[error("scan window starts at {scan_start}, before the reference period ({reference_start})")]
    ScanBeforeReference {
        scan_start: String,
        reference_start: String,
    },

    #[error("last {frequency} window ends at {window_end}, after the reference period ({reference_end}); reduce the scan end")]
    ScanPastReference {
        frequency: String,
        window_end: String,
        reference_end: String,
    },

    #[error("delimiter '{0}' is not a single ASCII character")]
    Delimiter(char),

    #[error("line {line}: {message}")]
    Record { line: u64, message: String },
}
