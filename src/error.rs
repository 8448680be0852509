use std::{error::Error, fmt};

/// Named failure conditions surfaced to callers of the index.
///
/// These are conditions, not exceptions in the source-language sense --
/// every public operation that can fail returns one of these through a
/// `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// `startScan` was called with a `lowOp`/`highOp` pair outside
    /// `{GT,GTE} x {LT,LTE}`.
    BadOpcodes,

    /// `startScan` was called with `lowVal > highVal`.
    BadScanRange,

    /// `scanNext`/`endScan` called while the cursor is `Idle`.
    ScanNotInitialized,

    /// `scanNext` reached the end of the qualifying range or the end of
    /// the leaf chain.
    IndexScanCompleted,

    /// reserved for point-lookup callers; unused by range scans.
    NoSuchKeyFound,

    /// the meta page does not describe a consistent index (wrong
    /// `attrType`, truncated file, ...).
    BadIndexInfo,

    /// the relation scanner has no more records. Internal to bulk build;
    /// never escapes `IndexLifecycle::create`.
    EndOfFile,

    /// tolerated by `endScan`: the buffer manager had already evicted or
    /// never held the page.
    PageNotPinned,
    HashNotFound,

    /// the underlying blob file / OS call failed.
    Io(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IndexError::BadOpcodes => write!(f, "bad opcodes for scan range"),
            IndexError::BadScanRange => write!(f, "low bound exceeds high bound"),
            IndexError::ScanNotInitialized => write!(f, "scan not initialized"),
            IndexError::IndexScanCompleted => write!(f, "index scan completed"),
            IndexError::NoSuchKeyFound => write!(f, "no such key found"),
            IndexError::BadIndexInfo => write!(f, "bad index info"),
            IndexError::EndOfFile => write!(f, "end of file"),
            IndexError::PageNotPinned => write!(f, "page not pinned"),
            IndexError::HashNotFound => write!(f, "hash not found"),
            IndexError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl Error for IndexError {}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
