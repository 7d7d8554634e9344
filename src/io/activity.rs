use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{KanbanError, Result};
use crate::io::atomic::atomic_write;
use crate::io::lock::FileLock;
use crate::model::activity::{Action, ActivityEntry};
use crate::model::board::ACTIVITY_FILE;

/// Maximum number of entries kept in the log.
pub const MAX_LOG_LINES: usize = 10_000;

/// Lines longer than this mark the log as corrupt; rotation refuses to run.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Filters for [`read`]. `limit == 0` means unlimited.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub since: Option<DateTime<Utc>>,
    pub action: Option<Action>,
    pub task_id: Option<u32>,
    pub limit: usize,
}

impl LogFilter {
    fn matches(&self, entry: &ActivityEntry) -> bool {
        if let Some(since) = self.since
            && entry.timestamp < since
        {
            return false;
        }
        if let Some(action) = self.action
            && entry.action != action
        {
            return false;
        }
        if let Some(id) = self.task_id
            && entry.task_id != id
        {
            return false;
        }
        true
    }
}

/// Append an entry under the board lock, dropping the oldest lines when
/// the log would grow past `cap`.
pub fn append_capped(board_dir: &Path, entry: &ActivityEntry, cap: usize) -> Result<()> {
    let _lock = FileLock::acquire_default(board_dir)?;
    let path = board_dir.join(ACTIVITY_FILE);
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let existing = count_lines(&path).map_err(|e| KanbanError::Read {
        path: path.clone(),
        source: e,
    })?;

    if existing + 1 > cap {
        let keep = cap.saturating_sub(1);
        let mut kept = newest_lines(&path, keep).map_err(|e| KanbanError::Read {
            path: path.clone(),
            source: e,
        })?;
        kept.extend_from_slice(line.as_bytes());
        return atomic_write(&path, &kept).map_err(|e| KanbanError::Write { path, source: e });
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| KanbanError::Write {
            path: path.clone(),
            source: e,
        })?;
    file.write_all(line.as_bytes())
        .map_err(|e| KanbanError::Write { path, source: e })
}

/// Append with the default cap.
pub fn append(board_dir: &Path, entry: &ActivityEntry) -> Result<()> {
    append_capped(board_dir, entry, MAX_LOG_LINES)
}

/// Record a mutation. Failures are logged and otherwise ignored: a
/// mutation never fails because its log entry could not be written.
pub fn log_mutation(board_dir: &Path, action: Action, task_id: u32, detail: impl Into<String>) {
    let entry = ActivityEntry::new(action, task_id, detail);
    if let Err(e) = append(board_dir, &entry) {
        warn!(error = %e, action = %action, task_id, "could not append to activity log");
    }
}

/// Read entries oldest-first, skipping malformed lines. With a limit, the
/// newest `limit` matches are returned.
pub fn read(board_dir: &Path, filter: &LogFilter) -> Result<Vec<ActivityEntry>> {
    let path = board_dir.join(ACTIVITY_FILE);
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(KanbanError::Read { path, source: e }),
    };

    let mut matches = VecDeque::new();
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| KanbanError::Read {
                path: path.clone(),
                source: e,
            })?;
        if n == 0 {
            break;
        }
        let Ok(entry) = serde_json::from_slice::<ActivityEntry>(trim_line(&buf)) else {
            continue;
        };
        if !filter.matches(&entry) {
            continue;
        }
        matches.push_back(entry);
        if filter.limit > 0 && matches.len() > filter.limit {
            matches.pop_front();
        }
    }
    Ok(matches.into_iter().collect())
}

fn count_lines(path: &Path) -> io::Result<usize> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut count = 0;
    for_each_line(file, |_| count += 1)?;
    Ok(count)
}

/// The newest `keep` lines, each newline-terminated. Lines are kept as
/// raw bytes so a corrupt line never stops rotation.
fn newest_lines(path: &Path, keep: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut ring: VecDeque<Vec<u8>> = VecDeque::with_capacity(keep + 1);
    for_each_line(file, |line| {
        if keep == 0 {
            return;
        }
        ring.push_back(line.to_vec());
        if ring.len() > keep {
            ring.pop_front();
        }
    })?;
    let mut out = Vec::new();
    for line in ring {
        out.extend_from_slice(&line);
        out.push(b'\n');
    }
    Ok(out)
}

fn trim_line(buf: &[u8]) -> &[u8] {
    let mut end = buf.len();
    while end > 0 && matches!(buf[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &buf[..end]
}

/// Scan lines with a bounded buffer; an over-long line is an error.
fn for_each_line(file: File, mut f: impl FnMut(&[u8])) -> io::Result<()> {
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .by_ref()
            .take(MAX_LINE_BYTES as u64 + 1)
            .read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(());
        }
        if buf.len() > MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("activity log line exceeds {MAX_LINE_BYTES} bytes"),
            ));
        }
        f(trim_line(&buf));
    }
}
