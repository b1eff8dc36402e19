pub mod colors;
pub mod streaming;

pub use colors::*;
pub use streaming::StreamingOutput;
