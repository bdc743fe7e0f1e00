//! Overlay registry
//!
//! Owns every [`OverlayWindow`] behind an opaque id. Native surfaces may only be
//! touched from one thread, so the registry runs a dedicated UI thread that
//! owns the backend and the id map, and the public operations only enqueue
//! tasks for it. Tasks run strictly in submission order; nothing ever waits
//! for a task to finish and nothing is ever dropped because of backlog.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::overlay::{OverlayWindow, RenderBackend};
use crate::style::BorderStyle;

/// Opaque overlay identifier. Never reused within one registry.
pub type OverlayId = u32;

/// Work for the UI thread
#[derive(Debug)]
enum Task {
    Create {
        id: OverlayId,
        frame: Rect,
        style: BorderStyle,
    },
    Update {
        id: OverlayId,
        frame: Rect,
        style: BorderStyle,
    },
    Remove {
        id: OverlayId,
    },
    Shutdown,
}

/// Handle to the overlay UI thread
pub struct OverlayRegistry {
    tasks: mpsc::UnboundedSender<Task>,
    next_id: AtomicU32,
    screen_height: f64,
    thread: Option<JoinHandle<()>>,
}

impl OverlayRegistry {
    /// Start the UI thread.
    ///
    /// `factory` runs on the new thread and builds the backend there. This call
    /// blocks until the backend is up and fails if the factory does.
    pub fn spawn<B, F>(factory: F) -> Result<Self>
    where
        B: RenderBackend + 'static,
        F: FnOnce() -> Result<B> + Send + 'static,
    {
        let (tasks, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<f64>>(1);

        let thread = std::thread::Builder::new()
            .name("overlay-ui".into())
            .spawn(move || {
                let backend = match factory() {
                    Ok(backend) => backend,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(backend.screen_height()));
                run_ui_thread(backend, rx);
            })
            .map_err(|_| OverlayError::UiThreadGone)?;

        let screen_height = match ready_rx.recv() {
            Ok(Ok(height)) => height,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(OverlayError::UiThreadGone);
            }
        };

        info!("Overlay UI thread started (screen height {})", screen_height);

        Ok(Self {
            tasks,
            next_id: AtomicU32::new(0),
            screen_height,
            thread: Some(thread),
        })
    }

    /// Height of the reference screen, for inverting top-down frames
    pub fn screen_height(&self) -> f64 {
        self.screen_height
    }

    /// Queue a new overlay around `frame`.
    ///
    /// The id is usable right away, even if the window does not exist yet:
    /// later updates and removals queue up behind the construction.
    pub fn create(&self, frame: Rect, style: BorderStyle) -> OverlayId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.submit(Task::Create { id, frame, style });
        id
    }

    /// Queue a geometry/style change. Unknown ids are ignored.
    pub fn update(&self, id: OverlayId, frame: Rect, style: BorderStyle) {
        self.submit(Task::Update { id, frame, style });
    }

    /// Queue removal. Unknown ids are ignored.
    pub fn remove(&self, id: OverlayId) {
        self.submit(Task::Remove { id });
    }

    /// Run all queued work, close every overlay and stop the UI thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn submit(&self, task: Task) {
        if let Err(e) = self.tasks.send(task) {
            warn!("Overlay UI thread is gone, dropping {:?}", e.0);
        }
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.submit(Task::Shutdown);
            if thread.join().is_err() {
                warn!("Overlay UI thread panicked");
            }
        }
    }
}

impl Drop for OverlayRegistry {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_ui_thread<B: RenderBackend>(mut backend: B, mut tasks: mpsc::UnboundedReceiver<Task>) {
    let mut windows: HashMap<OverlayId, OverlayWindow<B::Target>> = HashMap::new();

    while let Some(task) = tasks.blocking_recv() {
        match task {
            Task::Create { id, frame, style } => {
                match OverlayWindow::construct(&mut backend, frame, style) {
                    Ok(window) => {
                        debug!("Overlay {} created", id);
                        windows.insert(id, window);
                    }
                    Err(e) => warn!("Failed to create overlay {}: {}", id, e),
                }
            }
            Task::Update { id, frame, style } => {
                let Some(window) = windows.get_mut(&id) else {
                    debug!("Update for unknown overlay {}", id);
                    continue;
                };
                window.set_geometry(frame);
                window.set_color(style.color);
                window.set_width(style.width);
                window.set_radius(style.radius);
                if let Err(e) = window.refresh() {
                    warn!("Failed to refresh overlay {}: {}", id, e);
                }
            }
            Task::Remove { id } => match windows.remove(&id) {
                Some(window) => {
                    debug!("Overlay {} removed", id);
                    if let Err(e) = window.hide() {
                        warn!("Failed to close overlay {}: {}", id, e);
                    }
                }
                None => debug!("Remove for unknown overlay {}", id),
            },
            Task::Shutdown => break,
        }

        if let Err(e) = backend.flush() {
            warn!("Failed to flush overlay backend: {}", e);
        }
    }

    info!("Closing {} remaining overlays", windows.len());
    for (id, window) in windows.drain() {
        if let Err(e) = window.hide() {
            warn!("Failed to close overlay {}: {}", id, e);
        }
    }
    let _ = backend.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::testing::{Call, Journal, RecordingBackend};
    use crate::style::Rgba;
    use std::sync::Arc;

    fn spawn(journal: &Journal) -> OverlayRegistry {
        let journal = journal.clone();
        OverlayRegistry::spawn(move || Ok(RecordingBackend::new(journal, 900.0))).unwrap()
    }

    fn style(width: f64) -> BorderStyle {
        BorderStyle::new(Rgba::RED, width, width + 4.0)
    }

    #[test]
    fn test_spawn_reports_screen_height() {
        let journal = Journal::default();
        let registry = spawn(&journal);
        assert_eq!(registry.screen_height(), 900.0);
    }

    #[test]
    fn test_spawn_failure_is_returned() {
        let result = OverlayRegistry::spawn(|| -> Result<RecordingBackend> {
            Err(OverlayError::NoScreen(3))
        });
        assert!(matches!(result, Err(OverlayError::NoScreen(3))));
    }

    #[test]
    fn test_ids_are_sequential() {
        let journal = Journal::default();
        let registry = spawn(&journal);
        let first = registry.create(Rect::new(0.0, 0.0, 10.0, 10.0), style(2.0));
        let second = registry.create(Rect::new(0.0, 0.0, 10.0, 10.0), style(2.0));
        assert_eq!(first, 0);
        assert_eq!(second, first + 1);

        registry.remove(first);
        let third = registry.create(Rect::new(0.0, 0.0, 10.0, 10.0), style(2.0));
        assert_eq!(third, 2);
    }

    #[test]
    fn test_create_then_remove_leaves_nothing() {
        let journal = Journal::default();
        let registry = spawn(&journal);
        let id = registry.create(Rect::new(1.0, 2.0, 3.0, 4.0), style(1.0));
        registry.remove(id);
        registry.shutdown();

        assert!(journal.live().is_empty());
        assert_eq!(
            journal.calls(),
            vec![
                Call::Construct(0, Rect::new(0.0, 1.0, 5.0, 6.0), style(1.0)),
                Call::Repaint(0),
                Call::Close(0),
            ]
        );
    }

    #[test]
    fn test_update_mutates_in_place() {
        let journal = Journal::default();
        let registry = spawn(&journal);
        let id = registry.create(Rect::new(0.0, 0.0, 10.0, 10.0), style(2.0));
        let moved = Rect::new(50.0, 60.0, 70.0, 80.0);
        let restyled = BorderStyle::new(Rgba::new(0.0, 0.0, 1.0, 0.5), 3.0, 0.0);
        registry.update(id, moved, restyled);
        registry.shutdown();

        let calls = journal.calls();
        assert_eq!(
            calls[2..5],
            [
                Call::Restyle(0, restyled),
                Call::Resize(0, moved.grow_for_stroke(3.0)),
                Call::Repaint(0),
            ]
        );
        // only one surface was ever built; shutdown closed it
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Construct(..))).count(), 1);
        assert_eq!(calls.last(), Some(&Call::Close(0)));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let journal = Journal::default();
        let registry = spawn(&journal);
        let id = registry.create(Rect::new(0.0, 0.0, 10.0, 10.0), style(2.0));
        registry.update(42, Rect::new(5.0, 5.0, 5.0, 5.0), style(9.0));
        registry.remove(42);
        registry.remove(id);
        registry.remove(id);
        registry.shutdown();

        assert_eq!(
            journal.calls(),
            vec![
                Call::Construct(0, Rect::new(-2.0, -2.0, 14.0, 14.0), style(2.0)),
                Call::Repaint(0),
                Call::Close(0),
            ]
        );
    }

    #[test]
    fn test_failed_construction_leaves_no_window() {
        let journal = Journal::default();
        let inner = journal.clone();
        let registry =
            OverlayRegistry::spawn(move || Ok(RecordingBackend::with_broken_paint(inner, 900.0)))
                .unwrap();
        let id = registry.create(Rect::new(0.0, 0.0, 10.0, 10.0), style(2.0));
        registry.update(id, Rect::new(5.0, 5.0, 10.0, 10.0), style(2.0));
        registry.shutdown();

        let calls = journal.calls();
        assert!(journal.live().is_empty());
        assert!(!calls.iter().any(|c| matches!(c, Call::Resize(..))));
        assert_eq!(calls.last(), Some(&Call::Close(0)));
    }

    #[test]
    fn test_drop_closes_remaining_overlays() {
        let journal = Journal::default();
        let registry = spawn(&journal);
        for i in 0..3 {
            registry.create(Rect::new(f64::from(i) * 20.0, 0.0, 10.0, 10.0), style(1.0));
        }
        drop(registry);

        assert!(journal.live().is_empty());
        let closed = journal
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Close(_)))
            .count();
        assert_eq!(closed, 3);
    }

    #[test]
    fn test_concurrent_callers() {
        let journal = Journal::default();
        let registry = Arc::new(spawn(&journal));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| registry.create(Rect::new(0.0, 0.0, 4.0, 4.0), style(1.0)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<OverlayId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());

        for id in &ids {
            registry.remove(*id);
        }
        drop(Arc::try_unwrap(registry).ok().unwrap());
        assert!(journal.live().is_empty());
    }
}
