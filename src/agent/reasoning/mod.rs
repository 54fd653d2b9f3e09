//! Agent reasoning step logging.

mod logger;

pub use logger::*;
