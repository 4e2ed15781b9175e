//! Structural HTML editing.
//!
//! Documents are parsed into a DOM, edited by node id, and serialized back
//! to markup. Attribute values and text are escaped on output, so callers
//! pass plain strings and never build markup by hand.

pub mod document;
pub mod escape;

pub use document::{BaseDocument, EditableDocument, NewElement};
pub use escape::escape_html;
