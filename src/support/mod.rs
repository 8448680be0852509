//! External collaborators: concrete bodies for the
//! buffer manager, the blob-file page store, and the relation scanner.
//! The core (`tree`, `cursor`, `index`) depends only on the
//! interfaces these expose, never on `std::fs` directly.

pub mod blob_file;
pub mod buffer_pool;
pub mod relation_scan;
