//! Overlay windows
//!
//! An [`OverlayWindow`] is one highlight border on screen. The native side is
//! hidden behind [`OverlayRenderTarget`], built by a [`RenderBackend`] that
//! lives on the UI thread for its whole life.

pub mod paint;
pub mod x11;

use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::Rect;
use crate::style::{BorderStyle, Rgba};

/// One native borderless, click-through, always-on-top surface
pub trait OverlayRenderTarget {
    /// Move/resize to `frame` (screen space, y-up)
    fn resize(&mut self, frame: Rect) -> Result<()>;

    /// Replace the style used by the next repaint
    fn restyle(&mut self, style: BorderStyle);

    /// Redraw the border from the current style and size
    fn repaint(&mut self) -> Result<()>;

    /// Destroy the native surface
    fn close(&mut self) -> Result<()>;
}

/// Factory and owner of native resources, pinned to the UI thread
pub trait RenderBackend {
    type Target: OverlayRenderTarget;

    /// Height of the reference screen used for coordinate inversion
    fn screen_height(&self) -> f64;

    /// Create and show a surface occupying `frame`, without taking focus
    fn construct(&mut self, frame: Rect, style: BorderStyle) -> Result<Self::Target>;

    /// Push batched requests to the display server and drain its event queue
    fn flush(&mut self) -> Result<()>;
}

/// A border around a node frame
pub struct OverlayWindow<T: OverlayRenderTarget> {
    target: T,
    node_frame: Rect,
    style: BorderStyle,
}

impl<T: OverlayRenderTarget> OverlayWindow<T> {
    /// Create the native surface around `node_frame` and paint it.
    ///
    /// A surface that cannot be painted is closed again before the error is
    /// returned.
    pub fn construct<B>(backend: &mut B, node_frame: Rect, style: BorderStyle) -> Result<Self>
    where
        B: RenderBackend<Target = T>,
    {
        let grown = node_frame.grow_for_stroke(style.width);
        let mut target = backend.construct(grown, style)?;
        if let Err(e) = target.repaint() {
            if let Err(close_err) = target.close() {
                warn!("Failed to close unpainted overlay: {}", close_err);
            }
            return Err(e);
        }
        debug!("Overlay constructed at {:?}", grown);

        Ok(Self {
            target,
            node_frame,
            style,
        })
    }

    pub fn style(&self) -> BorderStyle {
        self.style
    }

    /// Frame of the native surface: the node frame grown by the stroke width
    pub fn display_frame(&self) -> Rect {
        self.node_frame.grow_for_stroke(self.style.width)
    }

    pub fn set_geometry(&mut self, node_frame: Rect) {
        self.node_frame = node_frame;
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.style.color = color;
    }

    pub fn set_width(&mut self, width: f64) {
        self.style.width = width;
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.style.radius = radius;
    }

    /// Make pending mutations visible.
    pub fn refresh(&mut self) -> Result<()> {
        self.target.restyle(self.style);
        self.target.resize(self.display_frame())?;
        self.target.repaint()
    }

    /// Close the native surface.
    pub fn hide(mut self) -> Result<()> {
        self.target.close()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend recording every native call

    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::OverlayError;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Construct(u32, Rect, BorderStyle),
        Resize(u32, Rect),
        Restyle(u32, BorderStyle),
        Repaint(u32),
        Close(u32),
    }

    #[derive(Debug, Clone, Default)]
    pub struct Journal(Arc<Mutex<Vec<Call>>>);

    impl Journal {
        pub fn calls(&self) -> Vec<Call> {
            self.0.lock().unwrap().clone()
        }

        fn push(&self, call: Call) {
            self.0.lock().unwrap().push(call);
        }

        /// Surfaces constructed and not yet closed
        pub fn live(&self) -> Vec<u32> {
            let calls = self.calls();
            let mut live = Vec::new();
            for call in calls {
                match call {
                    Call::Construct(n, ..) => live.push(n),
                    Call::Close(n) => live.retain(|l| *l != n),
                    _ => {}
                }
            }
            live
        }
    }

    pub struct RecordingBackend {
        pub journal: Journal,
        pub screen_height: f64,
        next: u32,
        broken_paint: bool,
    }

    impl RecordingBackend {
        pub fn new(journal: Journal, screen_height: f64) -> Self {
            Self {
                journal,
                screen_height,
                next: 0,
                broken_paint: false,
            }
        }

        /// Targets whose every repaint fails
        pub fn with_broken_paint(journal: Journal, screen_height: f64) -> Self {
            Self {
                broken_paint: true,
                ..Self::new(journal, screen_height)
            }
        }
    }

    pub struct RecordingTarget {
        serial: u32,
        journal: Journal,
        broken_paint: bool,
    }

    impl RenderBackend for RecordingBackend {
        type Target = RecordingTarget;

        fn screen_height(&self) -> f64 {
            self.screen_height
        }

        fn construct(&mut self, frame: Rect, style: BorderStyle) -> Result<RecordingTarget> {
            let serial = self.next;
            self.next += 1;
            self.journal.push(Call::Construct(serial, frame, style));
            Ok(RecordingTarget {
                serial,
                journal: self.journal.clone(),
                broken_paint: self.broken_paint,
            })
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl OverlayRenderTarget for RecordingTarget {
        fn resize(&mut self, frame: Rect) -> Result<()> {
            self.journal.push(Call::Resize(self.serial, frame));
            Ok(())
        }

        fn restyle(&mut self, style: BorderStyle) {
            self.journal.push(Call::Restyle(self.serial, style));
        }

        fn repaint(&mut self) -> Result<()> {
            self.journal.push(Call::Repaint(self.serial));
            if self.broken_paint {
                return Err(OverlayError::Paint {
                    width: 0,
                    height: 0,
                });
            }
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.journal.push(Call::Close(self.serial));
            Ok(())
        }
    }
}
