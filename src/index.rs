use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::debounce::Debouncer;
use crate::state::AppContext;

/// Window in which successive `schedule_scan` calls coalesce into one scan.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Directory entry name that marks its parent as a repository root.
const GIT_DIR: &str = ".git";

const WORKER_COUNT: usize = 4;
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Why a scan ended before walking anything. Recovered internally and
/// surfaced only as diagnostics, never to the user.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No base path configured yet; the list is left untouched.
    #[error("no base path configured")]
    MisconfiguredRoot,
    /// The base path itself is missing or unreadable; the list was cleared
    /// at scan start and stays empty.
    #[error("base path not readable: {path}")]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Walks the configured base path for Git repositories and publishes the
/// results into the shared [`AppContext`] project list.
///
/// `schedule_scan` is the debounced entry point for configuration changes;
/// `run_scan` scans immediately (used at startup and by the debounce timer
/// when it fires).
pub struct Indexer {
    ctx: Arc<AppContext>,
    generation: Arc<AtomicU64>,
    debouncer: Debouncer,
}

impl Indexer {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self::with_debounce(ctx, DEBOUNCE_WINDOW)
    }

    pub fn with_debounce(ctx: Arc<AppContext>, window: Duration) -> Self {
        let generation = Arc::new(AtomicU64::new(0));
        let debouncer = {
            let ctx = ctx.clone();
            let generation = generation.clone();
            Debouncer::new(window, move || run_scan(&ctx, &generation))
        };
        Self {
            ctx,
            generation,
            debouncer,
        }
    }

    /// Signal that configuration may have changed. Never scans
    /// synchronously; N calls inside the debounce window produce one scan,
    /// reading the configuration as of fire time.
    pub fn schedule_scan(&self) {
        self.debouncer.trigger();
    }

    /// Clear the project list and rescan, blocking until the walk drains.
    /// With no base path configured this is a no-op and the list is left
    /// untouched.
    pub fn run_scan(&self) {
        run_scan(&self.ctx, &self.generation);
    }
}

fn run_scan(ctx: &AppContext, generation: &AtomicU64) {
    match try_scan(ctx, generation) {
        Ok(_) => {}
        Err(err @ IndexError::MisconfiguredRoot) => debug!(%err, "scan skipped"),
        Err(err) => debug!(%err, "scan ended empty"),
    }
}

fn try_scan(ctx: &AppContext, generation: &AtomicU64) -> Result<usize, IndexError> {
    let (base_path, max_depth) = {
        let config = ctx.config();
        let Some(base_path) = config.base_path.clone() else {
            return Err(IndexError::MisconfiguredRoot);
        };
        (base_path, config.max_depth)
    };

    // Bump the generation first so any still-draining previous walk goes
    // stale before we clear the list it would otherwise append to.
    let scan_gen = generation.fetch_add(1, Ordering::SeqCst) + 1;
    ctx.projects().clear();

    // Probe the root before spinning up workers so a bad base path is
    // reported apart from a mid-walk unreadable directory.
    if let Err(source) = fs::read_dir(&base_path) {
        return Err(IndexError::InvalidPath {
            path: base_path,
            source,
        });
    }

    let walk = Walk {
        ctx,
        generation,
        scan_gen,
        max_depth,
        visited: Mutex::new(HashSet::new()),
        pending: AtomicUsize::new(0),
    };
    walk.run(base_path.clone());

    let found = ctx.projects().len();
    info!(projects = found, base = %base_path.display(), "scan finished");
    Ok(found)
}

struct WalkItem {
    path: PathBuf,
    depth: u32,
}

/// One scan's walk: a queue of (path, depth) items drained by a small pool
/// of workers. Sibling directories are listed concurrently, so discovery
/// order across branches is not deterministic.
struct Walk<'a> {
    ctx: &'a AppContext,
    generation: &'a AtomicU64,
    scan_gen: u64,
    max_depth: u32,
    /// Canonicalized paths already queued for descent; stops symlink
    /// cycles the depth bound alone would not catch.
    visited: Mutex<HashSet<PathBuf>>,
    /// Items queued or in flight; the walk is done when this hits zero.
    pending: AtomicUsize,
}

impl Walk<'_> {
    fn run(&self, base_path: PathBuf) {
        let (tx, rx) = unbounded::<WalkItem>();

        if let Ok(real) = base_path.canonicalize() {
            self.visited_insert(real);
        }
        self.pending.store(1, Ordering::SeqCst);
        let _ = tx.send(WalkItem {
            path: base_path,
            depth: 0,
        });

        thread::scope(|scope| {
            for _ in 0..WORKER_COUNT {
                let tx = tx.clone();
                let rx = rx.clone();
                scope.spawn(move || self.work(tx, rx));
            }
        });
    }

    fn work(&self, tx: Sender<WalkItem>, rx: Receiver<WalkItem>) {
        loop {
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            let item = match rx.recv_timeout(IDLE_POLL) {
                Ok(item) => item,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            };
            // A newer scan supersedes this one; drop the item unprocessed.
            if self.generation.load(Ordering::SeqCst) == self.scan_gen {
                self.visit(&item, &tx);
            }
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// List one directory. A `.git` child records the parent as a project
    /// and is never descended into; every other child directory within the
    /// depth bound is queued. Read errors abandon this directory only.
    fn visit(&self, item: &WalkItem, tx: &Sender<WalkItem>) {
        let entries = match fs::read_dir(&item.path) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(path = %item.path.display(), %err, "skipping unreadable directory");
                return;
            }
        };

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            let is_dir = if file_type.is_symlink() {
                path.is_dir()
            } else {
                file_type.is_dir()
            };
            if !is_dir {
                continue;
            }

            if entry.file_name() == GIT_DIR {
                self.record_project(item.path.clone());
                continue;
            }

            let depth = item.depth + 1;
            if depth > self.max_depth {
                continue;
            }

            let Ok(real) = path.canonicalize() else {
                continue;
            };
            if !self.visited_insert(real) {
                continue;
            }

            self.pending.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(WalkItem { path, depth });
        }
    }

    /// Append a discovered project unless this walk has been superseded.
    ///
    /// The generation is re-checked while the list lock is held: a newer
    /// scan bumps the generation before taking the lock to clear, so once
    /// the check passes under the lock, any later clear also wipes this
    /// append. Checking before locking would leave a window for a stale
    /// path to land in the new scan's list.
    fn record_project(&self, path: PathBuf) {
        let mut projects = self.ctx.projects();
        if self.generation.load(Ordering::SeqCst) == self.scan_gen && projects.insert(path.clone())
        {
            debug!(project = %path.display(), "discovered repository");
        }
    }

    fn visited_insert(&self, real: PathBuf) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(real)
    }
}
