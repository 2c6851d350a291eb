use miette::Diagnostic;
use thiserror::Error;

// Code layout:
// blobmeter::range -> request type / date range resolution.
// blobmeter::report -> locating, aggregating and assembling reports.
// blobmeter::split -> the per-meter splitter behind the blob trigger.
// blobmeter::io -> object store things.

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Request type not in defined list, got '{0}'.")]
    #[diagnostic(
        code(blobmeter::range::request_type),
        help("Use one of 'MTD', 'PM', 'Custom' or 'CustomMonth'.")
    )]
    InvalidRequestType(String),

    #[error("The '{0}' request type needs a start date.")]
    #[diagnostic(
        code(blobmeter::range::missing_start),
        help("Pass a start date, for example '--start 2023-03-01'.")
    )]
    MissingStartDate(String),

    #[error("Date range starts after it ends: {start} > {end}.")]
    #[diagnostic(code(blobmeter::range::inverted))]
    InvertedRange { start: String, end: String },

    #[error("A bucket must span at least one month.")]
    #[diagnostic(code(blobmeter::range::bucket_size))]
    InvalidBucketSize,

    #[error("Date arithmetic went out of the supported calendar range.")]
    #[diagnostic(code(blobmeter::range::calendar))]
    Calendar(#[from] jiff::Error),

    #[error("No official entries to build the report from.")]
    #[diagnostic(
        code(blobmeter::report::empty_official),
        help("No monthly file matched this client and month, so there is no data for this period.")
    )]
    EmptyOfficialMap,

    #[error("Anchor key '{0}' is not among the official entries.")]
    #[diagnostic(code(blobmeter::report::anchor))]
    AnchorNotFound(String),

    #[error("Column '{column}' is missing in '{object}'.")]
    #[diagnostic(
        code(blobmeter::report::missing_column),
        help("Check that the file is a usage export with the expected header row.")
    )]
    MissingColumn { object: String, column: String },

    #[error("Invalid date '{0}': expected M/D/YYYY or YYYY-MM-DD.")]
    #[diagnostic(code(blobmeter::report::date))]
    InvalidDate(String),

    #[error("Invalid cost value '{0}'.")]
    #[diagnostic(code(blobmeter::report::cost))]
    InvalidCost(String),

    /// Kaboom. A batch headed for one output file carries more than one billing entity.
    #[error("Batch mixes more than one {field}: '{first}' and '{other}'.")]
    #[diagnostic(
        code(blobmeter::split::inconsistent_batch),
        help("Each output file must hold exactly one SubscriptionId, MeterId and month.")
    )]
    InconsistentBatch {
        field: &'static str,
        first: String,
        other: String,
    },

    #[error("{field} '{value}' cannot be used in a file name.")]
    #[diagnostic(
        code(blobmeter::split::unsafe_identifier),
        help("Identifiers must not contain path separators.")
    )]
    UnsafeIdentifier { field: &'static str, value: String },

    #[error("Cannot build a meter file from zero rows.")]
    #[diagnostic(code(blobmeter::split::empty_batch))]
    EmptyBatch,

    #[error("Object '{name}' not found in container '{container}'.")]
    #[diagnostic(code(blobmeter::io::not_found))]
    ObjectNotFound { container: String, name: String },

    #[error("Object path '{0}' leaves its container.")]
    #[diagnostic(
        code(blobmeter::io::invalid_name),
        help("Names must be relative and must not contain '..'.")
    )]
    InvalidObjectName(String),
}
