//! overlay-borders
//!
//! Click-through, always-on-top rounded rectangle outlines for highlighting
//! screen regions, positioned by an external controller such as a tiling
//! window manager.
//!
//! Two front ends share one registry of overlays:
//! - [`driver::LineDriver`] reads `key:value` commands line by line (the
//!   `overlay-borders` binary feeds it stdin) and keeps a single overlay;
//! - [`driver::BorderHost`] is called directly by a host process and manages
//!   any number of overlays by id.

pub mod attrs;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod registry;
pub mod style;

pub use attrs::AttributeBundle;
pub use config::Config;
pub use driver::{BorderHost, LineDriver};
pub use error::OverlayError;
pub use geometry::Rect;
pub use registry::{OverlayId, OverlayRegistry};
pub use style::{BorderStyle, Rgba};
