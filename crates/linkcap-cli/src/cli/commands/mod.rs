//! CLI command handlers, one per file.

mod analyze;
mod export;
mod extract;
mod import_har;
mod summary;
mod verify;

pub use analyze::run_analyze;
pub use export::run_export;
pub use extract::run_extract;
pub use import_har::run_import_har;
pub use summary::run_summary;
pub use verify::run_verify;
