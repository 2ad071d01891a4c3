//! Page content model, normalization and storage

mod normalizer;
mod store;
mod table;
mod types;

pub use normalizer::{NormalizeError, normalize};
pub use store::{PageContentStore, PageDomain, StoreError};
pub use table::{TableGrid, TableParseError};
pub use types::*;
