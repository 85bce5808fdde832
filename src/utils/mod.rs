pub mod color;
pub mod config;
pub mod dates;
pub mod errors;

pub use config::Config;
pub use errors::status_message;
