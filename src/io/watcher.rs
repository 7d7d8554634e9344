use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::model::board::{ACTIVITY_FILE, LOCK_FILE};

/// Quiet period after the last relevant event before a refresh is posted
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Posted once per burst of file changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshToken;

/// Shared cancellation flag for the debounce thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Watches the board directory and posts one [`RefreshToken`] per burst.
pub struct BoardWatcher {
    watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<RefreshToken>,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
}

/// Whether a path change should trigger a reload
fn is_relevant(path: &Path, board_dir: &Path) -> bool {
    if !path.starts_with(board_dir) {
        return false;
    }
    if let Some(name) = path.file_name().and_then(|n| n.to_str())
        && (name == LOCK_FILE || name == ACTIVITY_FILE || name.starts_with(".tmp"))
    {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("yml")
    )
}

impl BoardWatcher {
    /// Start watching `board_dir` recursively.
    pub fn start(board_dir: &Path, cancel: CancelToken) -> Result<Self, notify::Error> {
        let (raw_tx, raw_rx) = mpsc::channel::<Result<Event, notify::Error>>();
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result| {
                let _ = raw_tx.send(result);
            },
            Config::default(),
        )?;
        watcher.watch(board_dir, RecursiveMode::Recursive)?;

        let dir: PathBuf = board_dir.to_path_buf();
        let worker_cancel = cancel.clone();
        let worker = thread::spawn(move || debounce_loop(&dir, raw_rx, tx, worker_cancel));

        Ok(BoardWatcher {
            watcher: Some(watcher),
            rx,
            cancel,
            worker: Some(worker),
        })
    }

    /// Non-blocking: true when at least one refresh is pending. Drains
    /// every queued token so a burst yields a single reload.
    pub fn poll(&self) -> bool {
        let mut pending = false;
        while self.rx.try_recv().is_ok() {
            pending = true;
        }
        pending
    }
}

impl Drop for BoardWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Dropping the notify watcher closes the raw channel
        self.watcher.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Collapse bursts of raw events into single refresh tokens.
///
/// Exits when the raw channel closes, the receiver of refresh tokens is
/// gone, or `cancel` fires.
fn debounce_loop(
    board_dir: &Path,
    raw_rx: mpsc::Receiver<Result<Event, notify::Error>>,
    tx: mpsc::Sender<RefreshToken>,
    cancel: CancelToken,
) {
    let mut dirty = false;
    loop {
        if cancel.is_cancelled() {
            debug!("watcher cancelled");
            return;
        }
        match raw_rx.recv_timeout(DEBOUNCE) {
            Ok(Ok(event)) => {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    continue;
                }
                if event.paths.iter().any(|p| is_relevant(p, board_dir)) {
                    dirty = true;
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "file watcher error");
            }
            Err(RecvTimeoutError::Timeout) => {
                if dirty {
                    dirty = false;
                    if tx.send(RefreshToken).is_err() {
                        return;
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
