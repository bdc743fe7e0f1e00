//! Call protocol driver
//!
//! Entry points for a host process that manages several borders by id, e.g. a
//! tiling window manager outlining the focused and the marked node. Frames are
//! given top-down in the host's coordinates; updates mutate the existing
//! overlay in place.

use crate::attrs::FrameAttrs;
use crate::config::Config;
use crate::error::Result;
use crate::geometry::{to_screen_rect, Rect};
use crate::overlay::x11::X11Backend;
use crate::registry::{OverlayId, OverlayRegistry};
use crate::style::{BorderStyle, Rgba};

pub struct BorderHost {
    registry: OverlayRegistry,
}

impl BorderHost {
    /// Connect to the X server named in `config` and start the overlay thread.
    ///
    /// Fails if the display or the configured screen is unavailable.
    pub fn initialize(config: &Config) -> Result<Self> {
        let display = config.display.name.clone();
        let screen = config.display.screen;
        let class = config.window.class.clone();

        let registry = OverlayRegistry::spawn(move || {
            X11Backend::connect(display.as_deref(), screen, &class)
        })?;
        Ok(Self::from_registry(registry))
    }

    /// Drive an already running registry, e.g. one with a custom backend.
    pub fn from_registry(registry: OverlayRegistry) -> Self {
        Self { registry }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_border(
        &self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        r: f64,
        g: f64,
        b: f64,
        a: f64,
        border_width: f64,
        corner_radius: f64,
    ) -> OverlayId {
        self.registry.create(
            self.frame(x, y, width, height),
            BorderStyle::new(Rgba::new(r, g, b, a), border_width, corner_radius),
        )
    }

    /// No-op if `id` is unknown.
    #[allow(clippy::too_many_arguments)]
    pub fn update_border(
        &self,
        id: OverlayId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        r: f64,
        g: f64,
        b: f64,
        a: f64,
        border_width: f64,
        corner_radius: f64,
    ) {
        self.registry.update(
            id,
            self.frame(x, y, width, height),
            BorderStyle::new(Rgba::new(r, g, b, a), border_width, corner_radius),
        );
    }

    /// No-op if `id` is unknown.
    pub fn remove_border(&self, id: OverlayId) {
        self.registry.remove(id);
    }

    /// Close every border and stop the overlay thread.
    pub fn shutdown(self) {
        self.registry.shutdown();
    }

    fn frame(&self, x: f64, y: f64, w: f64, h: f64) -> Rect {
        to_screen_rect(&FrameAttrs { x, y, w, h }, self.registry.screen_height())
    }
}
