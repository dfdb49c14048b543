//! volkey-store: on-disk state owned by the service
//!
//! Two stores live here:
//!   - `ConfigStore`: the single JSON configuration document that every
//!     upload merges its form fields into
//!   - `UploadStore`: the directory receiving uploaded files, named after a
//!     sanitized form of the client-supplied file name

pub mod error;
pub mod store;
pub mod uploads;

pub use error::StoreError;
pub use store::{merge, ConfigStore, ReadOutcome};
pub use uploads::{sanitize_filename, UploadStore};
