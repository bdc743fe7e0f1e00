//! Command drivers
//!
//! Two front ends over the same registry: [`line::LineDriver`] for a
//! controller piping commands into stdin, [`host::BorderHost`] for a host
//! process calling in directly.

pub mod host;
pub mod line;

pub use host::BorderHost;
pub use line::{read_lines, Exit, Flow, LineDriver, Lines};
