/// Email composition modules
pub mod composer;
pub mod message;
pub mod templates;

pub use composer::ReportComposer;
pub use message::build_message;
