/*!
# Language Module

Cursor and matcher primitives for the badge dialect, plus error
reporting. Parsing never looks ahead more than one token; every matcher
is test-and-consume and leaves the cursor unmoved on failure.

*/

#[macro_use]
mod error;
mod cursor;

pub use cursor::Cursor;
pub use cursor::Relation;
pub use error::Error;
pub use error::ErrorCode;

/// A `None` line number is a direct (unnumbered) statement.
pub type LineNumber = Option<u16>;

pub trait MaxValue<T> {
    fn max_value() -> T;
}

impl MaxValue<u16> for LineNumber {
    fn max_value() -> u16 {
        65529
    }
}

/// Longest line the interpreter will accept, in bytes.
pub const MAX_LINE_LEN: usize = 255;
