//! Runtime for a 2D skeletal sprite character.
//!
//! Loads a bone/slot/attachment skeleton definition and a texture-atlas description, samples
//! keyframe animation over time and composites the posed parts into ordered draw commands for
//! an external renderer.

#![forbid(unsafe_code)]

mod atlas;
mod error;
mod json;
mod model;
mod render;
mod runtime;
mod value;

pub use atlas::*;
pub use error::*;
pub use model::*;
pub use render::*;
pub use runtime::*;
pub use value::*;


#[cfg(test)]
mod render_tests;
