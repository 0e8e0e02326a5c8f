use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, trace};
use notify::{Event, EventHandler, RecommendedWatcher, RecursiveMode, Watcher as _, WatcherKind};
use notify_debouncer_mini::{Config as DebounceConfig, DebounceEventResult, Debouncer, new_debouncer_opt};

/// One debounced batch of changed paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildRequest {
    pub paths: Vec<PathBuf>,
}

/// The platform watcher with access events removed. Builds read every file
/// under the source root, so forwarding opens would make each build schedule
/// the next one.
pub struct ChangeWatcher {
    inner: RecommendedWatcher,
}

impl notify::Watcher for ChangeWatcher {
    fn new<F: EventHandler>(mut event_handler: F, config: notify::Config) -> notify::Result<Self> {
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = &res
                    && event.kind.is_access()
                {
                    trace!("Ignoring access: {:?}", event.paths);
                    return;
                }
                event_handler.handle_event(res);
            },
            config,
        )?;

        Ok(Self { inner })
    }

    fn watch(&mut self, path: &Path, recursive_mode: RecursiveMode) -> notify::Result<()> {
        self.inner.watch(path, recursive_mode)
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        self.inner.unwatch(path)
    }

    fn configure(&mut self, option: notify::Config) -> notify::Result<bool> {
        self.inner.configure(option)
    }

    fn kind() -> WatcherKind {
        RecommendedWatcher::kind()
    }
}

/// Keeps a recursive, debounced subscription alive. Changes within one
/// debounce window arrive as a single `RebuildRequest`. Dropping it stops the
/// notifications, which in turn lets the rebuild worker exit.
pub struct Watcher {
    _debouncer: Debouncer<ChangeWatcher>,
}

impl Watcher {
    pub fn watch(source_root: &Path, debounce: Duration, tx: Sender<RebuildRequest>) -> notify::Result<Self> {
        let config = DebounceConfig::default().with_timeout(debounce);
        let mut debouncer = new_debouncer_opt::<_, ChangeWatcher>(config, move |res: DebounceEventResult| match res {
            Ok(events) => {
                let paths: Vec<PathBuf> = events.into_iter().map(|event| event.path).collect();
                debug!("Change detected: {:?}", paths);
                if tx.send(RebuildRequest { paths }).is_err() {
                    debug!("Rebuild worker has stopped, dropping change batch");
                }
            }
            Err(e) => error!("Watch error: {}", e),
        })?;

        debouncer.watcher().watch(source_root, RecursiveMode::Recursive)?;
        info!("Watching for changes in {}", source_root.display());

        Ok(Self { _debouncer: debouncer })
    }
}

/// The only thread that runs builds in watch mode.
///
/// Every batch queued when a build starts is folded into that build, so
/// batches that arrive while a build runs become exactly one follow-up build.
pub struct RebuildWorker {
    handle: JoinHandle<usize>,
}

impl RebuildWorker {
    pub fn spawn<F, E>(rx: Receiver<RebuildRequest>, on_rebuild: F) -> std::io::Result<Self>
    where
        F: FnMut() -> Result<(), E> + Send + 'static,
        E: Display,
    {
        let handle = thread::Builder::new()
            .name("statica-rebuild".to_string())
            .spawn(move || run(rx, on_rebuild))?;

        Ok(Self { handle })
    }

    /// Waits for the worker to exit, which happens once every sender is
    /// dropped. Returns the number of builds it ran.
    pub fn join(self) -> thread::Result<usize> {
        self.handle.join()
    }
}

fn run<F, E>(rx: Receiver<RebuildRequest>, mut on_rebuild: F) -> usize
where
    F: FnMut() -> Result<(), E>,
    E: Display,
{
    let mut builds = 0;

    while let Ok(request) = rx.recv() {
        let changed = request.paths.len() + rx.try_iter().map(|queued| queued.paths.len()).sum::<usize>();
        debug!("Coalesced {} changed paths", changed);

        builds += 1;
        info!("Rebuilding site...");
        match on_rebuild() {
            Ok(()) => info!("Site rebuilt"),
            Err(e) => error!("Build failed: {}", e),
        }
    }

    builds
}
