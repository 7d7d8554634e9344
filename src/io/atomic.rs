use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `content` to `path` atomically using a sibling temp file + rename.
/// Readers see either the old bytes or the new bytes, never a mix.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn writes_and_replaces() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        // no temp files left behind
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}
