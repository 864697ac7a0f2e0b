// # Template Watcher
//
// Re-renders when the template file is edited.
//
// ## Scope
//
// The watch is placed on the template's parent directory, non-recursive,
// so a file replaced by rename is still seen.
//
// ## Matching
//
// Only events whose path is exactly the (canonicalized) template path and
// whose kind is a data write, a create, or a rename onto the template
// trigger a reaction. Everything else in the directory is ignored.
//
// A single save can produce several notifications (truncate, write,
// rename). After the first one the watcher waits briefly and swallows the
// rest, so one save renders once, from the finished file.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::engine::{ReactionEngine, Trigger};
use crate::error::{Error, Result};

/// Quiet period after a template notification before rendering
const SETTLE: Duration = Duration::from_millis(50);

/// Watches the template file's directory for edits
pub struct TemplateWatcher {
    /// Canonical template path
    path: PathBuf,

    /// Keeps the OS subscription alive
    _watcher: RecommendedWatcher,

    /// Raw notifications forwarded from the watcher thread
    events: UnboundedReceiverStream<notify::Result<Event>>,
}

impl TemplateWatcher {
    /// Subscribe to changes of the given template file
    ///
    /// The file must exist; subscription failures are returned so they can
    /// be treated as startup errors.
    pub fn new(template: &Path) -> Result<Self> {
        let path = template.canonicalize().map_err(|e| {
            Error::watch(format!(
                "error watching template file {} for changes: {}",
                template.display(),
                e
            ))
        })?;
        let dir = path
            .parent()
            .ok_or_else(|| Error::watch(format!("{} has no parent directory", path.display())))?
            .to_path_buf();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the watcher task has exited
            let _ = tx.send(res);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        debug!("watching {} for changes to {}", dir.display(), path.display());

        Ok(Self {
            path,
            _watcher: watcher,
            events: UnboundedReceiverStream::new(rx),
        })
    }

    /// The canonical template path being matched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// React to template edits until shutdown
    ///
    /// Watch errors are logged and the loop keeps going.
    pub async fn run(self, engine: Arc<ReactionEngine>, shutdown: CancellationToken) {
        let Self {
            path,
            _watcher,
            events,
        } = self;
        watch_events(events, &path, &engine, &shutdown).await;
    }
}

/// Drive reactions from a stream of filesystem notifications
async fn watch_events<S>(
    mut events: S,
    template: &Path,
    engine: &ReactionEngine,
    shutdown: &CancellationToken,
) where
    S: Stream<Item = notify::Result<Event>> + Unpin,
{
    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("template watcher stopping");
                break;
            }

            event = events.next() => match event {
                Some(Ok(event)) => {
                    if is_template_change(&event, template) {
                        info!("[CHANGE] template changed: {:?}", event.kind);
                        settle(&mut events).await;
                        engine.react(Trigger::TemplateChanged).await;
                    }
                }
                Some(Err(e)) => {
                    error!("watch error: {}", e);
                }
                None => {
                    error!("template watch channel closed");
                    break;
                }
            },
        }
    }
}

/// Let an in-progress save finish and discard the notifications it queued
///
/// An in-place save truncates before writing; rendering right after the
/// first notification could publish an empty template.
async fn settle<S>(events: &mut S)
where
    S: Stream<Item = notify::Result<Event>> + Unpin,
{
    tokio::time::sleep(SETTLE).await;
    while let Ok(Some(event)) = tokio::time::timeout(Duration::ZERO, events.next()).await {
        if let Err(e) = event {
            error!("watch error: {}", e);
        }
    }
}

/// Whether a filesystem event is a write/create of the template file
pub fn is_template_change(event: &Event, template: &Path) -> bool {
    match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().any(|p| p == template)
        }
        // paths are [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().is_some_and(|p| p == template)
        }
        _ => false,
    }
}
