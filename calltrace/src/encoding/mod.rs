//! Conversion of logged values into redacted, log-safe trees.

mod encoder;
mod node;

pub use encoder::Encoder;
pub use node::StructuredNode;
