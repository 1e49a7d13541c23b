mod decoder;
mod ingest;
mod normalizer;
mod query;

pub use decoder::*;
pub use ingest::*;
pub use normalizer::*;
pub use query::*;
