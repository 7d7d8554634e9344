use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{KanbanError, Result};
use crate::io::atomic::atomic_write;
use crate::model::task::Task;
use crate::parse::{extract_id, parse_task, serialize_task, slugify};

/// A task file that could not be read during a lenient scan
#[derive(Debug, Clone, Serialize)]
pub struct ReadWarning {
    pub file: PathBuf,
    pub error: String,
}

/// Read one task file; the returned task carries `file`.
pub fn read_task(path: &Path) -> Result<Task> {
    let content = fs::read_to_string(path).map_err(|e| KanbanError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut task = parse_task(&content).map_err(|e| KanbanError::TaskFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    task.file = Some(path.to_path_buf());
    Ok(task)
}

/// `.md` files directly inside `dir`, sorted by path. A missing directory
/// is an empty board.
pub fn task_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(KanbanError::Read {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| KanbanError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Read every task, aborting on the first malformed file.
pub fn read_all(dir: &Path) -> Result<Vec<Task>> {
    task_files(dir)?.iter().map(|p| read_task(p)).collect()
}

/// Read every task, collecting a warning for each file that fails.
/// Only a failure to list the directory itself is an error.
pub fn read_all_lenient(dir: &Path) -> Result<(Vec<Task>, Vec<ReadWarning>)> {
    let mut tasks = Vec::new();
    let mut warnings = Vec::new();
    for path in task_files(dir)? {
        match read_task(&path) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping malformed task file");
                warnings.push(ReadWarning {
                    file: path,
                    error: match e {
                        KanbanError::TaskFile { source, .. } => source.to_string(),
                        other => other.to_string(),
                    },
                });
            }
        }
    }
    Ok((tasks, warnings))
}

/// Find a task by id.
///
/// Stage 1 reads only files whose numeric prefix equals `id`. Stage 2
/// falls back to reading every file. When both miss but a stage-1
/// candidate failed to parse, that parse error is returned instead of
/// `TASK_NOT_FOUND`.
pub fn find_by_id(dir: &Path, id: u32) -> Result<Task> {
    let files = task_files(dir)?;
    let mut candidate_error = None;

    for path in &files {
        let name = file_name(path);
        if extract_id(name) != Some(id) {
            continue;
        }
        match read_task(path) {
            Ok(task) if task.id == id => return Ok(task),
            Ok(_) => {}
            Err(e) => {
                if candidate_error.is_none() {
                    candidate_error = Some(e);
                }
            }
        }
    }

    debug!(id, "task not found by filename, scanning all files");
    for path in &files {
        if let Ok(task) = read_task(path)
            && task.id == id
        {
            return Ok(task);
        }
    }

    Err(candidate_error.unwrap_or(KanbanError::TaskNotFound(id)))
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// First free path for `id`/`title` in `dir`: `NNN-slug.md`, then
/// `NNN-slug-2.md`, `NNN-slug-3.md`, ... A path equal to `current` counts
/// as free so a task can keep its own file.
pub fn canonical_path(dir: &Path, id: u32, title: &str, current: Option<&Path>) -> PathBuf {
    let slug = slugify(title);
    let mut n = 1;
    loop {
        let name = if n == 1 {
            format!("{:03}-{}.md", id, slug)
        } else {
            format!("{:03}-{}-{}.md", id, slug, n)
        };
        let path = dir.join(name);
        if !path.exists() || current == Some(path.as_path()) {
            return path;
        }
        n += 1;
    }
}

/// Serialize a task and atomically write it to `path`.
pub fn write_task_to(task: &Task, path: &Path) -> Result<()> {
    let content = serialize_task(task)?;
    atomic_write(path, content.as_bytes()).map_err(|e| KanbanError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write a task to its existing file, or to a fresh canonical path in `dir`
/// when it has none. Updates `task.file`.
pub fn save_task(dir: &Path, task: &mut Task) -> Result<()> {
    let path = match &task.file {
        Some(p) => p.clone(),
        None => canonical_path(dir, task.id, &task.title, None),
    };
    write_task_to(task, &path)?;
    task.file = Some(path);
    Ok(())
}

/// Write a task to its canonical path in `dir`, removing the old file only
/// after the new one is safely on disk. Returns the new path.
pub fn relocate_task(dir: &Path, task: &mut Task) -> Result<PathBuf> {
    let old = task.file.clone();
    let new_path = canonical_path(dir, task.id, &task.title, old.as_deref());
    write_task_to(task, &new_path)?;
    if let Some(old) = old
        && old != new_path
    {
        fs::remove_file(&old).map_err(|e| KanbanError::Write {
            path: old.clone(),
            source: e,
        })?;
    }
    task.file = Some(new_path.clone());
    Ok(new_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;
    use tempfile::TempDir;

    fn task(id: u32, title: &str) -> Task {
        Task::new(id, title.into(), "todo".into(), "low".into(), now())
    }

    fn write(dir: &Path, name: &str, t: &Task) {
        write_task_to(t, &dir.join(name)).unwrap();
    }

    #[test]
    fn read_all_sorts_and_skips_non_md() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "002-b.md", &task(2, "b"));
        write(tmp.path(), "001-a.md", &task(1, "a"));
        fs::write(tmp.path().join("notes.txt"), "hi").unwrap();
        fs::create_dir(tmp.path().join("sub.md")).unwrap();

        let tasks = read_all(tmp.path()).unwrap();
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(tasks[0].file.as_ref().unwrap().ends_with("001-a.md"));
    }

    #[test]
    fn strict_read_aborts_lenient_read_warns() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "001-a.md", &task(1, "a"));
        fs::write(tmp.path().join("002-broken.md"), "no preamble").unwrap();

        assert!(read_all(tmp.path()).is_err());

        let (tasks, warnings) = read_all_lenient(tmp.path()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].file.ends_with("002-broken.md"));
        assert!(warnings[0].error.contains("opening"));
    }

    #[test]
    fn missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_all(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn find_by_filename_prefix() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "001-a.md", &task(1, "a"));
        write(tmp.path(), "007-g.md", &task(7, "g"));
        assert_eq!(find_by_id(tmp.path(), 7).unwrap().title, "g");
    }

    #[test]
    fn find_falls_back_to_full_scan() {
        let tmp = TempDir::new().unwrap();
        // filename says 99, preamble says 3
        write(tmp.path(), "099-c.md", &task(3, "c"));
        assert_eq!(find_by_id(tmp.path(), 3).unwrap().title, "c");
    }

    #[test]
    fn find_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "001-a.md", &task(1, "a"));
        assert_eq!(find_by_id(tmp.path(), 5).unwrap_err().code(), "TASK_NOT_FOUND");
    }

    #[test]
    fn find_returns_candidate_parse_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("004-bad.md"), "---\nid: 4\n").unwrap();
        let err = find_by_id(tmp.path(), 4).unwrap_err();
        assert!(matches!(err, KanbanError::TaskFile { .. }));
    }

    #[test]
    fn canonical_path_skips_occupied_names() {
        let tmp = TempDir::new().unwrap();
        let first = canonical_path(tmp.path(), 4, "b", None);
        assert!(first.ends_with("004-b.md"));
        fs::write(&first, "x").unwrap();
        let second = canonical_path(tmp.path(), 4, "b", None);
        assert!(second.ends_with("004-b-2.md"));
        // a task's own file is not a collision
        assert_eq!(canonical_path(tmp.path(), 4, "b", Some(&first)), first);
    }

    #[test]
    fn relocate_moves_file() {
        let tmp = TempDir::new().unwrap();
        let mut t = task(3, "c");
        write(tmp.path(), "099-c.md", &t);
        t.file = Some(tmp.path().join("099-c.md"));

        let new_path = relocate_task(tmp.path(), &mut t).unwrap();
        assert!(new_path.ends_with("003-c.md"));
        assert!(!tmp.path().join("099-c.md").exists());
        assert_eq!(read_task(&new_path).unwrap().id, 3);
    }
}
