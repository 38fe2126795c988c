pub mod cfg;
pub mod error;
pub mod example;
pub mod interp;
pub mod synth;
pub mod task;
pub mod term;

pub use error::{Error, Result};
