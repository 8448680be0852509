//! A disk-backed B+-tree secondary index over a single attribute of a
//! fixed-layout record relation.
//!
//! Five pieces compose the core, in dependency order: [`node`] (on-page
//! layout for the three key domains), [`page_handle`] (scoped pin/unpin),
//! [`tree`] (search descent, preemptive split, insertion),
//! [`cursor`] (bounded range scan over the leaf chain), and [`index`]
//! (open/create, meta page, bulk build, close). [`support`] holds the
//! buffer manager, blob-file page store and relation scanner those five
//! are built against.
//!
//! Concurrent access, deletion/rebalancing, transactional recovery,
//! variable-length keys, secondary-value indexing and composite keys are
//! all out of scope: one caller drives one index instance to completion
//! per call, nodes are only ever created by splits, and a key is exactly
//! one `i32`, `f64`, or 10-byte string.

pub mod cursor;
pub mod error;
pub mod index;
pub mod key;
// kept private: a `pub mod log` of this name would shadow the extern
// `log` crate's path for every unqualified `use log::...` elsewhere in
// the crate.
mod log;
pub mod node;
pub mod page_handle;
pub mod page_id;
pub mod rid;
pub mod support;
pub mod tree;

pub use cursor::{Operator, ScanCursor};
pub use error::{IndexError, IndexResult};
pub use index::BTreeIndex;
pub use key::{Datatype, DoubleKey, IntKey, Key, StringKey};
pub use page_id::{PageId, NULL_PAGE_ID};
pub use rid::Rid;

pub use crate::log::init_log;
