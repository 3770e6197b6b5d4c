// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{DATABASE_FILE, ProviderConfig, format_updated, resolve_database_path};
