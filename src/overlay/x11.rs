//! X11 render backend
//!
//! Every overlay is an override-redirect window on a 32-bit ARGB visual with an
//! empty input shape, so pointer events fall through to whatever is below it.
//! The border is rasterized client side and installed as the window's
//! background pixmap; the server then handles exposures on its own and the UI
//! thread never has to react to Expose events.

use std::sync::Arc;

use tracing::{debug, info, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::shape::{self, ConnectionExt as _, SK, SO};
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::paint;
use super::{OverlayRenderTarget, RenderBackend};
use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::style::BorderStyle;

/// `_NET_WM_DESKTOP` value meaning "all desktops"
const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// Largest native window side; a square this big still fits the paint budget
const MAX_WINDOW_SIDE: u16 = 8192;

/// Interned atoms used on overlay windows
#[derive(Debug)]
struct Atoms {
    net_wm_window_type: Atom,
    net_wm_window_type_dock: Atom,
    net_wm_state: Atom,
    net_wm_state_above: Atom,
    net_wm_state_sticky: Atom,
    net_wm_state_skip_taskbar: Atom,
    net_wm_state_skip_pager: Atom,
    net_wm_desktop: Atom,
    compton_shadow: Atom,
}

impl Atoms {
    fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_wm_window_type: intern("_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_dock: intern("_NET_WM_WINDOW_TYPE_DOCK")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_above: intern("_NET_WM_STATE_ABOVE")?,
            net_wm_state_sticky: intern("_NET_WM_STATE_STICKY")?,
            net_wm_state_skip_taskbar: intern("_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_skip_pager: intern("_NET_WM_STATE_SKIP_PAGER")?,
            net_wm_desktop: intern("_NET_WM_DESKTOP")?,
            compton_shadow: intern("_COMPTON_SHADOW")?,
        })
    }
}

/// Connection-wide state shared by all overlays
pub struct X11Backend {
    conn: Arc<RustConnection>,
    root: Window,
    visual: Visualid,
    colormap: Colormap,
    screen_height: f64,
    atoms: Atoms,
    class: String,
    has_shape: bool,
}

impl X11Backend {
    /// Connect to `display` (or `$DISPLAY`) and prepare overlays on `screen`
    /// (or the connection's preferred screen).
    pub fn connect(display: Option<&str>, screen: Option<usize>, class: &str) -> Result<Self> {
        let (conn, preferred) = x11rb::connect(display)?;
        let screen_num = screen.unwrap_or(preferred);
        let xscreen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or(OverlayError::NoScreen(screen_num))?
            .clone();

        info!(
            "Connected to X server, screen {} ({}x{})",
            screen_num, xscreen.width_in_pixels, xscreen.height_in_pixels
        );

        let visual = find_argb_visual(&xscreen).ok_or(OverlayError::NoArgbVisual(screen_num))?;
        let colormap = conn.generate_id()?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, xscreen.root, visual)?;

        let has_shape = conn
            .extension_information(shape::X11_EXTENSION_NAME)?
            .is_some();
        if !has_shape {
            warn!("SHAPE extension not available, overlays will swallow pointer input");
        }

        let atoms = Atoms::new(&conn)?;
        conn.flush()?;

        Ok(Self {
            conn: Arc::new(conn),
            root: xscreen.root,
            visual,
            colormap,
            screen_height: f64::from(xscreen.height_in_pixels),
            atoms,
            class: class.to_string(),
            has_shape,
        })
    }

    fn set_hints(&self, window: Window) -> Result<()> {
        let conn = self.conn.as_ref();
        let atoms = &self.atoms;

        let mut class = Vec::with_capacity(self.class.len() * 2 + 2);
        for _ in 0..2 {
            class.extend_from_slice(self.class.as_bytes());
            class.push(0);
        }
        conn.change_property8(PropMode::REPLACE, window, AtomEnum::WM_CLASS, AtomEnum::STRING, &class)?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            self.class.as_bytes(),
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.net_wm_window_type,
            AtomEnum::ATOM,
            &[atoms.net_wm_window_type_dock],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.net_wm_state,
            AtomEnum::ATOM,
            &[
                atoms.net_wm_state_above,
                atoms.net_wm_state_sticky,
                atoms.net_wm_state_skip_taskbar,
                atoms.net_wm_state_skip_pager,
            ],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.net_wm_desktop,
            AtomEnum::CARDINAL,
            &[ALL_DESKTOPS],
        )?;
        // picom/compton: no drop shadow
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.compton_shadow,
            AtomEnum::CARDINAL,
            &[0],
        )?;
        Ok(())
    }
}

impl RenderBackend for X11Backend {
    type Target = X11Target;

    fn screen_height(&self) -> f64 {
        self.screen_height
    }

    fn construct(&mut self, frame: Rect, style: BorderStyle) -> Result<X11Target> {
        let conn = self.conn.as_ref();
        let (x, y, width, height) = to_x11_geometry(frame, self.screen_height);
        let window = conn.generate_id()?;

        conn.create_window(
            32,
            window,
            self.root,
            x,
            y,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            self.visual,
            &CreateWindowAux::new()
                .background_pixel(0)
                .border_pixel(0)
                .colormap(self.colormap)
                .override_redirect(1),
        )?;

        // Empty input region: clicks pass through
        if self.has_shape {
            conn.shape_rectangles(SO::SET, SK::INPUT, ClipOrdering::UNSORTED, window, 0, 0, &[])?;
        }
        self.set_hints(window)?;

        conn.map_window(window)?;
        conn.configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;

        debug!("Created overlay window {} at {}x{}+{}+{}", window, width, height, x, y);

        Ok(X11Target {
            conn: self.conn.clone(),
            window,
            screen_height: self.screen_height,
            size: (width, height),
            style,
        })
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        while let Some(event) = self.conn.poll_for_event()? {
            if let Event::Error(e) = event {
                warn!("X11 error on overlay: {:?}", e);
            }
        }
        Ok(())
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        let _ = self.conn.free_colormap(self.colormap);
        let _ = self.conn.flush();
    }
}

/// One overlay window
pub struct X11Target {
    conn: Arc<RustConnection>,
    window: Window,
    screen_height: f64,
    size: (u16, u16),
    style: BorderStyle,
}

impl OverlayRenderTarget for X11Target {
    fn resize(&mut self, frame: Rect) -> Result<()> {
        let (x, y, width, height) = to_x11_geometry(frame, self.screen_height);
        self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new()
                .x(i32::from(x))
                .y(i32::from(y))
                .width(u32::from(width))
                .height(u32::from(height))
                .stack_mode(StackMode::ABOVE),
        )?;
        self.size = (width, height);
        Ok(())
    }

    fn restyle(&mut self, style: BorderStyle) {
        self.style = style;
    }

    fn repaint(&mut self) -> Result<()> {
        let conn = self.conn.as_ref();
        let (width, height) = self.size;
        let surface = paint::render_border(u32::from(width), u32::from(height), &self.style)?;
        let data = to_server_order(surface.data(), conn.setup().image_byte_order);

        let pixmap = conn.generate_id()?;
        conn.create_pixmap(32, pixmap, self.window, width, height)?;
        let gc = conn.generate_id()?;
        conn.create_gc(gc, pixmap, &CreateGCAux::new().graphics_exposures(0))?;

        // Split large surfaces so each PutImage fits in one request
        let stride = usize::from(width) * 4;
        let rows_per_request = (conn.maximum_request_bytes().saturating_sub(64) / stride).max(1);
        for (i, chunk) in data.chunks(stride * rows_per_request).enumerate() {
            let rows = chunk.len() / stride;
            conn.put_image(
                ImageFormat::Z_PIXMAP,
                pixmap,
                gc,
                width,
                rows as u16,
                0,
                (i * rows_per_request) as i16,
                0,
                32,
                chunk,
            )?;
        }

        conn.change_window_attributes(
            self.window,
            &ChangeWindowAttributesAux::new().background_pixmap(pixmap),
        )?;
        conn.clear_area(false, self.window, 0, 0, 0, 0)?;

        // The window keeps its own reference to the background
        conn.free_gc(gc)?;
        conn.free_pixmap(pixmap)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        debug!("Destroying overlay window {}", self.window);
        self.conn.destroy_window(self.window)?;
        Ok(())
    }
}

fn find_argb_visual(screen: &Screen) -> Option<Visualid> {
    screen
        .allowed_depths
        .iter()
        .filter(|depth| depth.depth == 32)
        .flat_map(|depth| depth.visuals.iter())
        .find(|visual| visual.class == VisualClass::TRUE_COLOR)
        .map(|visual| visual.visual_id)
}

/// Screen-space (y-up) frame to X11 window geometry (y-down, integral).
///
/// Sizes are at least one pixel, since X refuses zero-sized windows, and at
/// most [`MAX_WINDOW_SIDE`].
fn to_x11_geometry(frame: Rect, screen_height: f64) -> (i16, i16, u16, u16) {
    let top_left = frame.to_top_left(screen_height);
    let coord = |v: f64| (v.round() as i64).clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
    let size = |v: f64| (v.round() as i64).clamp(1, i64::from(MAX_WINDOW_SIDE)) as u16;
    (
        coord(top_left.x),
        coord(top_left.y),
        size(top_left.width),
        size(top_left.height),
    )
}

/// Premultiplied RGBA to the 32-bit ZPixmap layout the server expects.
fn to_server_order(rgba: &[u8], order: ImageOrder) -> Vec<u8> {
    let mut data = rgba.to_vec();
    for px in data.chunks_exact_mut(4) {
        if order == ImageOrder::LSB_FIRST {
            // B G R A
            px.swap(0, 2);
        } else {
            // A R G B
            px.rotate_right(1);
        }
    }
    data
}
