//! Layered settings: struct defaults, then `config.toml`, then `ENCORE__*`
//! environment variables.

mod load;
mod schema;

pub use load::resolve_config_path;
pub use schema::*;
