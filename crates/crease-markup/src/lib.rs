//! crease-markup: Escaping and lightweight markup for chat messages
//!
//! Both entry points are total: any input produces markup that displays
//! the text literally apart from the tags generated here.

pub mod format;
pub mod sanitize;
pub mod text;

pub use format::{format, plain_paragraph};
pub use sanitize::escape;
pub use text::to_plain_text;
