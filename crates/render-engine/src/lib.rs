//! Karo Render Engine
//!
//! Turns a resolved composition into frames for the live preview, and
//! into render plans and jobs for the server-side renderer.
//!
//! # Pipeline Architecture
//!
//! ```text
//! definition + customization
//!            │
//!            ▼
//!   resolve_composition ──────────────┐
//!            │                        │
//!   playhead (clock) ──┐              ▼
//!            │         │        RenderPlan (overlays, enable windows)
//!   frame loop tick ───┤              │
//!            │         │              ▼
//!   scale mapper ──────┤     RenderJobClient::submit
//!            ▼         │              │
//!      compose_frame ◄─┘              ▼
//!            │               poll_render_job ──► output_url
//!            ▼
//!          Frame
//! ```

pub mod compositor;
pub mod frame_loop;
pub mod plan;
pub mod playhead;
pub mod preview;
pub mod render_job;

pub use compositor::{compose_frame, compose_timeline, Frame, FrameLayer};
pub use frame_loop::{FrameLoop, FrameSubscription, FrameTick};
pub use plan::{Fit, Overlay, OverlayContent, RenderPlan};
pub use playhead::{PlaybackMode, PlaybackState, Playhead};
pub use preview::{PreviewError, PreviewOptions, Previewer};
pub use render_job::*;
