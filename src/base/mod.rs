//! Foundation types shared by every other module: interned symbols and
//! source positions. Has no dependency on any other `frontcore` module.

mod intern;
mod span;

pub use intern::{Interner, Symbol};
pub use span::{SourceLoc, Span, TextRange, TextSize};
