//! Source Map v3 generation: a thin builder over the `sourcemap` crate that
//! tracks the emitter's output position and maps byte offsets in the input
//! stylesheet to generated positions.

pub mod builder;
pub mod utils;

pub use builder::SourceMapBuilder;
pub use utils::{offset_to_line_col, offset_to_line_number};
