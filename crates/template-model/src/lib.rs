//! Karo Template Model
//!
//! Defines the data contracts shared by the previewer and the renderer:
//! - **Template:** Versioned definition with canvas, themes, placeholders, and layers
//! - **Tokens:** Symbolic references parsed once at load time
//! - **Customization:** Caller-chosen theme, duration, and placeholder values
//! - **Catalog:** Summary of what a template lets the caller customize
//!
//! Positions are logical pixels on the definition's fixed canvas.

pub mod catalog;
pub mod customization;
pub mod geometry;
pub mod layer;
pub mod template;
pub mod token;

pub use catalog::*;
pub use customization::*;
pub use geometry::*;
pub use layer::*;
pub use template::*;
pub use token::*;
