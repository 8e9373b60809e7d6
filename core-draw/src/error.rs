// core-draw/src/error.rs

//! Error kinds surfaced by the compositor.
//!
//! Every error aborts the command buffer that raised it. Effects of
//! commands that already executed stick, and the refresh accumulator is
//! preserved so the host can still present the partial result.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    /// Truncated buffer, unknown opcode or a malformed coordinate run.
    #[error("malformed command stream: {0}")]
    MalformedStream(String),

    /// An image id that is not in the store.
    #[error("unknown image id {0}")]
    UnknownImage(i32),

    /// A font id with no glyph table and no backing image.
    #[error("unknown font id {0}")]
    UnknownFont(i32),

    /// Glyph index past the table, or a rectangle escaping an image.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Surface or glyph-table allocation failed.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// Freeing the display, replacing it, or resizing it away.
    #[error("display invariant violated: {0}")]
    DisplayInvariant(String),
}

pub type Result<T> = std::result::Result<T, DrawError>;
