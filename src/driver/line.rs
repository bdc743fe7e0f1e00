//! Line protocol driver
//!
//! Reads one command per line and keeps at most one overlay on screen:
//!
//! - `clear` removes the overlay
//! - `quit` stops the driver
//! - anything else is a list of `key:value` attributes describing the overlay
//!   to show instead of the current one
//!
//! Nothing is ever written back. A redraw always replaces the overlay; the
//! call protocol is the one that mutates overlays in place.

use std::future::Future;
use std::io::{self, BufRead};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::attrs::AttributeBundle;
use crate::geometry::to_screen_rect;
use crate::registry::{OverlayId, OverlayRegistry};

/// Lines read so far; the channel closes at end of input
pub type Lines = mpsc::UnboundedReceiver<io::Result<String>>;

/// What to do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Why the driver stopped listening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    EndOfInput,
    /// Stopped from outside, e.g. by a signal
    Stopped,
}

/// Read `reader` line by line on a dedicated thread.
///
/// Blocking reads never run on the async runtime, so an idle pipe cannot hold
/// up shutdown. The thread ends after the first read error or at end of input.
pub fn read_lines<R>(reader: R) -> io::Result<Lines>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("overlay-stdin".into())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

pub struct LineDriver {
    registry: OverlayRegistry,
    current: Option<OverlayId>,
}

impl LineDriver {
    pub fn new(registry: OverlayRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Id of the overlay currently on screen
    pub fn current(&self) -> Option<OverlayId> {
        self.current
    }

    /// Execute one command line.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match line.trim() {
            "clear" => self.clear(),
            "quit" => return Flow::Quit,
            command => self.show(AttributeBundle::parse_line(command)),
        }
        Flow::Continue
    }

    /// Process `lines` until `quit` or end of input.
    ///
    /// Input that is not valid UTF-8 ends the loop as if the stream had closed.
    pub async fn run(&mut self, lines: &mut Lines) -> io::Result<Exit> {
        while let Some(line) = lines.recv().await {
            match line {
                Ok(line) => {
                    if self.handle_line(&line) == Flow::Quit {
                        info!("Quit requested");
                        return Ok(Exit::Quit);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("Undecodable input, no longer listening: {}", e);
                    return Ok(Exit::EndOfInput);
                }
                Err(e) => return Err(e),
            }
        }
        info!("End of input");
        Ok(Exit::EndOfInput)
    }

    /// Run until `quit` or until `stop` resolves.
    ///
    /// End of input only ends the listen loop: the overlay stays on screen
    /// until `stop`.
    pub async fn serve<F>(&mut self, mut lines: Lines, stop: F) -> io::Result<Exit>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let exit = tokio::select! {
            exit = self.run(&mut lines) => exit?,
            () = &mut stop => return Ok(Exit::Stopped),
        };
        if exit == Exit::EndOfInput {
            info!("Keeping overlay {:?} until stopped", self.current);
            stop.await;
        }
        Ok(exit)
    }

    /// Stop driving overlays; queued work is drained and the overlay closed.
    pub fn shutdown(self) {
        self.registry.shutdown();
    }

    fn clear(&mut self) {
        if let Some(id) = self.current.take() {
            debug!("Clearing overlay {}", id);
            self.registry.remove(id);
        }
    }

    fn show(&mut self, attrs: AttributeBundle) {
        let node = to_screen_rect(&attrs.frame, self.registry.screen_height());
        let grown = node.grow_for_stroke(attrs.stroke.size);

        self.clear();
        if node.is_empty() || grown.is_empty() {
            debug!("Empty frame {:?}, nothing to show", node);
            return;
        }

        self.current = Some(self.registry.create(node, attrs.style()));
    }
}
