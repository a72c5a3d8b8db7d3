pub mod processor;
pub mod strategy;

pub use processor::*;
pub use strategy::*;
