/// Data models for the dispatch pipeline
pub mod batch;
pub mod config;
pub mod report;

// Re-export commonly used types
pub use batch::*;
pub use config::*;
pub use report::*;
