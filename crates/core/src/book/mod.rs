//! Book data shapes and ISBN handling.

mod isbn;
mod types;

pub use isbn::normalize_isbn;
pub use types::*;
