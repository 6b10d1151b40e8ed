//! Error types for the `bearden-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias. Note that "no room placed" and "no path
//! found" are *not* errors -- they are expected empty results and are
//! returned as `None`.

use bearden_types::Cell;

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A grid was requested with a zero dimension.
    #[error("invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },

    /// A cell outside the grid was written to.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Cell),

    /// A structure footprint does not fit inside the grid.
    #[error("footprint {width}x{height} at {pos} does not fit the grid")]
    FootprintOutOfBounds {
        /// Anchor (top-left) cell of the footprint.
        pos: Cell,
        /// Footprint width in cells.
        width: usize,
        /// Footprint height in cells.
        height: usize,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in grid calculation")]
    ArithmeticOverflow,
}
