//! Disk-backed cache store
//!
//! Generations survive process restarts. Layout under the store root:
//!
//! ```text
//! <root>/<hex(generation name)>/<sha256(key)>.json   entry metadata
//! <root>/<hex(generation name)>/<sha256(key)>.body   response body
//! ```
//!
//! Files are written under unique temp names and renamed into place. The
//! metadata file is renamed after the body, so an entry only becomes visible
//! once both are on disk. A batch is staged in full before anything is
//! renamed, and entries it replaced are moved back if a rename fails.

pub use self::disk_store::DiskCacheStore;

mod disk_store;
mod types;
mod utils;
