//! Turning a folder into a playable catalog.
//!
//! `scan` reads the folder into raw files, `ingest` filters them by
//! extension and hands each to `extract`, which reads tags and album art.

mod display;
mod extract;
mod ingest;
mod model;
mod scan;

pub use ingest::ingest;
pub use model::*;
pub use scan::select_folder;

#[cfg(test)]
pub(crate) mod tests;
