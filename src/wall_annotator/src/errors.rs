use thiserror::Error;

/// The unified error type for the `wall_annotator` crate.
///
/// The annotation pipeline itself never fails; these cover the edges that read
/// payloads and time zones.
#[derive(Debug, Error)]
pub enum Error {
    /// The bar payload was not a JSON array or `{ "data": [...] }` envelope.
    #[error("Invalid bar payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A configured IANA time zone name is not known.
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// A local time could not be mapped to an instant in the market time zone.
    #[error("Unresolvable local time {naive} in {tz}: {reason}")]
    LocalTime {
        /// The naive wall-clock reading.
        naive: String,
        /// Zone name.
        tz: String,
        /// `ambiguous` or `nonexistent`.
        reason: &'static str,
    },
}
