//! Application module: the model the TUI renders and the runtime mutates.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
