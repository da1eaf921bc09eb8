//! Recursive file watcher feeding the dev rebuild loop.
//!
//! Events for ignored paths are dropped. Changes to one path are debounced
//! on the trailing edge: a path is reported once it has stayed quiet for the
//! whole window, so the last write of a burst always gets through.

use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Directory names never worth rebuilding for.
pub const DEFAULT_IGNORES: &[&str] = &["node_modules", "elm-stuff", ".git"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    /// Map a notify event kind onto a change. Access and other
    /// non-mutating events map to `None`.
    fn from_kind(kind: &EventKind, path: &Path) -> Option<Self> {
        let path = path.to_path_buf();
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }
}

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Watch `root` recursively.
    ///
    /// `ignore_patterns` entries are either `*.ext` suffixes or paths
    /// relative to `root`; a bare name matches that name at any depth.
    /// Hidden files and directories are always ignored.
    ///
    /// Must be called from inside a tokio runtime; the debounce timer runs
    /// as a task on it.
    ///
    /// # Errors
    ///
    /// Fails if `root` does not exist, if there is no runtime, or if the
    /// platform watcher cannot start.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CliError::Custom(format!("file watcher needs a tokio runtime: {e}")))?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::channel(100);
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    return;
                }
            };

            for path in &event.paths {
                let Some(change) = FileChange::from_kind(&event.kind, path) else {
                    continue;
                };
                if should_ignore(path, &watch_root, &ignore_patterns) {
                    continue;
                }

                // The debounce task is gone once the dev loop exits.
                if raw_tx.send(change).is_err() {
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        runtime.spawn(debounce_changes(
            raw_rx,
            tx,
            Debouncer::new(Duration::from_millis(debounce_ms)),
        ));
        tracing::debug!(root = %root.display(), debounce_ms, "watching for changes");

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Pending changes keyed by path, each with the deadline it flushes at.
///
/// Entries leave the map when they flush, so it only ever holds paths that
/// changed within the last window.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, (FileChange, Instant)>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record `change` and push its path's deadline out by one window.
    ///
    /// A create followed by writes is still reported as a create.
    fn push(&mut self, change: FileChange, now: Instant) {
        let path = change.path().to_path_buf();
        let change = match (self.pending.get(&path), change) {
            (Some((FileChange::Created(_), _)), FileChange::Modified(p)) => FileChange::Created(p),
            (_, change) => change,
        };
        self.pending.insert(path, (change, now + self.window));
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(_, deadline)| *deadline).min()
    }

    /// Remove and return every change whose deadline has passed, oldest
    /// deadline first.
    fn drain_due(&mut self, now: Instant) -> Vec<FileChange> {
        let mut due = Vec::new();
        self.pending.retain(|_, (change, deadline)| {
            if *deadline <= now {
                due.push((*deadline, change.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, change)| change).collect()
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

async fn debounce_changes(
    mut raw: mpsc::UnboundedReceiver<FileChange>,
    tx: mpsc::Sender<FileChange>,
    mut debouncer: Debouncer,
) {
    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            received = raw.recv() => match received {
                Some(change) => debouncer.push(change, Instant::now()),
                // Watcher dropped.
                None => return,
            },
            () = sleep_until(deadline) => {
                for change in debouncer.drain_due(Instant::now()) {
                    if tx.send(change).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

/// Whether a change to `path` should be ignored.
pub fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) => return true,
    };

    let names: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    if names.iter().any(|name| name.starts_with('.')) {
        return true;
    }

    let rel_str = names.join("/");
    ignore_patterns.iter().any(|pattern| {
        if let Some(suffix) = pattern.strip_prefix('*') {
            return rel_str.ends_with(suffix);
        }
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        if pattern.is_empty() {
            return false;
        }
        if pattern.contains('/') {
            rel_str == pattern || rel_str.starts_with(&format!("{pattern}/"))
        } else {
            names.iter().any(|name| *name == pattern)
        }
    })
}
