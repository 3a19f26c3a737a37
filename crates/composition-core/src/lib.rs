//! Karo Composition Core
//!
//! Turns a template definition plus a customization into per-frame layer
//! state:
//! - **Resolve:** Substitute theme, placeholder, and duration tokens
//! - **Timeline:** Decide layer visibility and local elapsed time
//! - **Animation:** Map elapsed time to enter/steady/exit states
//! - **Scale:** Map logical canvas geometry to display pixels
//!
//! This crate is pure computation. No I/O, no clocks, no threads.
//! All inputs are data; all outputs are data.

pub mod animation;
pub mod resolve;
pub mod scale;
pub mod timeline;

pub use animation::{AnimationFrame, AnimationPhase, AnimationSelector, AnimationState};
pub use resolve::{
    resolve, resolve_composition, LayerEnd, ResolveScope, ResolvedComposition, ResolvedLayer,
};
pub use scale::{ScaleError, ScaleMapper};
pub use timeline::{is_visible, local_elapsed, VisibilityChange, VisibilityTracker};
