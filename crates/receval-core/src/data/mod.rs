//! Preference data: the in-memory store plus text readers and writers.
//!
//! - [`store`] - [`PreferenceStore`], the sparse user → item → value map every
//!   other component consumes
//! - [`parser`] - delimited-text parsers with line/column error reporting
//! - [`writer`] - canonical tab-separated output for splits and predictions

pub mod parser;
pub mod store;
pub mod writer;

pub use parser::{Delimiter, DelimitedParser, Parser};
pub use store::{ItemId, PreferenceStore, UserId};
pub use writer::{write_store, write_to};
