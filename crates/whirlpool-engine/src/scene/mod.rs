//! Drawable scene.
//!
//! Responsibilities:
//! - keep drawables in a fixed, deterministic draw order (insertion order)
//! - model parent-relative placement: `world = parent.world · local`
//! - evaluate world matrices in dependency order once per frame
//!
//! A parent must exist before a child is added, so insertion order is always a
//! valid evaluation order and no sorting is needed.

mod list;
mod node;

pub use list::{Scene, SceneError};
pub use node::{Node, NodeId};
