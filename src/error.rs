//! Error types for configuration and persistence.
//!
//! Rejected user input (a click that hits no separator, a group without a free
//! gap) is not an error: those operations simply return `false`.

use thiserror::Error;

/// Invalid descriptor or palette configuration. Refused at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The color list does not cover every value combination plus the default
    #[error("expected {expected} colors ({values} values ^ {segments} segments + 1), got {actual}")]
    PaletteLength {
        /// Colors the configuration needs
        expected: usize,
        /// Colors supplied
        actual: usize,
        /// Number of allowed values
        values: usize,
        /// Number of editable segments
        segments: usize,
    },
    /// Too many value combinations to give each its own color
    #[error("{values} values ^ {segments} segments exceeds {limit} descriptor combinations")]
    TooManyCombinations {
        /// Number of allowed values
        values: usize,
        /// Number of editable segments
        segments: usize,
        /// Largest supported number of combinations
        limit: usize,
    },
    /// The template contains no placeholder to edit
    #[error("descriptor template {0:?} has no editable segment")]
    NoEditableSegments(String),
    /// No allowed value was configured
    #[error("at least one descriptor value is required")]
    EmptyValues,
    /// The same value appears twice in the allowed list
    #[error("descriptor value {0:?} is listed twice")]
    DuplicateValue(String),
    /// A value is empty or contains the placeholder character
    #[error("descriptor value {0:?} is empty or contains the placeholder")]
    InvalidValue(String),
    /// A palette entry is not a `#RRGGBB[AA]` color
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    /// The number of labels differs from the number of editable segments
    #[error("expected {expected} labels, got {actual}")]
    LabelCount {
        /// One label per editable segment
        expected: usize,
        /// Labels supplied
        actual: usize,
    },
}

/// Failure to read or write an `.lct` document.
#[derive(Debug, Error)]
pub enum LctError {
    /// The XML itself is malformed
    #[error("malformed XML: {0}")]
    Xml(String),
    /// The XML is well-formed but does not follow the `.lct` schema
    #[error("unexpected document structure: {0}")]
    Structure(String),
    /// A `value` attribute does not map onto the configured descriptor values
    #[error("invalid value digits {0:?}")]
    Digit(String),
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
