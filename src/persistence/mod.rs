//! Local persistence
//!
//! Features:
//! - AES-256-GCM envelope with an HMAC-SHA256 integrity tag
//! - Atomic temp-file writes
//! - Default-on-failure loading for every record

mod atomic;
pub mod envelope;
pub mod paths;
pub mod progress;
pub mod store;

pub use envelope::Keys;
pub use paths::DataDirs;
pub use progress::{ProgressSnapshot, ProgressStore};
pub use store::SecureStore;
