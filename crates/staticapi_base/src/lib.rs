/* 📖 # Why have staticapi_base as a core library?
staticapi_base provides the error type, tracing setup and the platform abstraction
layer shared by the engine and the CLI. Keeping them in one leaf crate prevents
circular dependencies between crates.
*/

pub mod error;
mod error_tests;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ResultExt, StaticApiError, StaticApiResult};
pub use pal::{DirectoryEntry, EntryKind, FilePath, MockPal, Pal, PalHandle, RealPal};
