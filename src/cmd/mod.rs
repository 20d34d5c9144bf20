//! Command implementations consuming the resource registry.

mod create;
mod delete;
mod get;
mod output;
mod use_cmd;

pub use create::create;
pub use delete::delete;
pub use get::get;
pub use output::OutputFormat;
pub use use_cmd::use_domain;
