use thiserror::Error;

/// Result alias used throughout `editor-decor`.
pub type Result<T> = std::result::Result<T, DecorError>;

#[derive(Debug, Error)]
/// Errors produced by the document host, the decoration stores and the overlay engine.
pub enum DecorError {
    #[error("line {line} out of range (document has {line_count} lines)")]
    /// A one-indexed line lookup fell outside the document.
    LineOutOfRange {
        /// The requested one-indexed line number.
        line: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    #[error("offset {offset} out of range (document length {len})")]
    /// A character offset fell outside `[0, len]`.
    OffsetOutOfRange {
        /// The requested character offset.
        offset: usize,
        /// Document length in characters.
        len: usize,
    },

    #[error("invalid range: {from}..{to}")]
    /// A change or query range was inverted or exceeded the document.
    InvalidRange {
        /// Range start.
        from: usize,
        /// Range end.
        to: usize,
    },

    #[error("overlay #{overlay} did not advance the cursor on line {line} at column {column}")]
    /// An overlay's `token` call returned without consuming input.
    OverlayStalled {
        /// Raw id of the misbehaving overlay.
        overlay: u64,
        /// One-indexed line number being scanned.
        line: usize,
        /// Byte position inside the line where the scan stalled.
        column: usize,
    },

    #[error("decorations must be added in sorted order: {from}..{to} after {prev_from}..{prev_to}")]
    /// A bulk decoration set build received ranges out of `(from, to)` order.
    UnsortedDecorations {
        /// Start of the previous range.
        prev_from: usize,
        /// End of the previous range.
        prev_to: usize,
        /// Start of the offending range.
        from: usize,
        /// End of the offending range.
        to: usize,
    },

    #[error("configuration error: {0}")]
    /// Editor configuration JSON could not be parsed.
    Config(#[from] serde_json::Error),
}
