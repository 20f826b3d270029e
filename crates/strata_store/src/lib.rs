//! Stamps, build records, and the heap store.
//!
//! A "stamp" is a deterministic string summarizing hashed input state, a
//! parent's output, or a session's own output. A successful build persists a
//! three-stamp record plus its captured output; the next invocation compares
//! fresh stamps against the record to decide whether the session is current.

#![warn(missing_docs)]

pub mod error;
pub mod record;
pub mod stamp;
pub mod store;

pub use error::StoreError;
pub use record::BuildRecord;
pub use stamp::{heap_stamp, sources_stamp, ABSENT_HEAP};
pub use store::{FoundRecord, HeapStore};
