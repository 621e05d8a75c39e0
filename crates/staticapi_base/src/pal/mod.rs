/* 📖 # What is the Platform Abstraction Layer?

The PAL provides a trait-based abstraction over storage and the HTTP server,
enabling testable code: MockPal keeps a file tree in memory and dispatches
simulated requests, RealPal works against a base directory on disk.
*/

mod file_path;
pub mod http;
pub mod mock;
mod real_http;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{DirectoryEntry, EntryKind, Pal, PalHandle, ReadSeek};
