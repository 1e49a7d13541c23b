mod log_source;
mod record_store;

pub use log_source::*;
pub use record_store::*;
