//! Library error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to connect to X server: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("X11 connection error: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("X11 request failed: {0}")]
    ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error("screen {0} does not exist")]
    NoScreen(usize),

    #[error("screen {0} has no 32-bit TrueColor visual")]
    NoArgbVisual(usize),

    #[error("cannot paint a {width}x{height} surface")]
    Paint { width: u32, height: u32 },

    #[error("the overlay UI thread is gone")]
    UiThreadGone,
}

pub type Result<T> = std::result::Result<T, OverlayError>;
