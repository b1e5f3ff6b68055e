pub mod errors;
pub mod png;

pub use errors::ParseError;
