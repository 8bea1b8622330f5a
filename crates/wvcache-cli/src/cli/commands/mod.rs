//! CLI command handlers, one per file.

mod fetch;
mod manifest;
mod mark;
mod path;
mod prefetch;

pub use fetch::run_fetch;
pub use manifest::run_manifest;
pub use mark::run_mark;
pub use path::run_path;
pub use prefetch::run_prefetch;
