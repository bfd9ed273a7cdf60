//! Configuration types
//!
//! Board-agnostic run parameters. With the `serde` feature these derive
//! `Serialize`/`Deserialize` so a host tool can load them from TOML or a
//! compiled postcard blob.

pub mod grid;
pub mod types;

pub use grid::GridConfig;
pub use types::*;
