use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Replace `path` with `bytes` without ever exposing a half-written file.
///
/// The bytes land in a sibling temp file that is renamed over `path`. An
/// existing file keeps its permissions.
///
/// # Errors
/// Returns an error if the temp file cannot be written or renamed.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
    let staged = parent.join(format!(".{file_name}.addon-migrator.{}", std::process::id()));

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let written = (|| -> io::Result<()> {
        let mut file = File::create(&staged)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        if let Some(permissions) = permissions {
            fs::set_permissions(&staged, permissions)?;
        }
        fs::rename(&staged, path)
    })();

    if written.is_err() {
        let _ = fs::remove_file(&staged);
    }
    written
}

/// Recursively copy a file or directory tree.
///
/// Directory entries whose file name appears in `skip` are not descended into
/// (matched at any depth). Symlinks are recreated as copies of their targets.
/// Returns the number of files copied.
///
/// # Errors
/// Returns an error if `src` does not exist or any entry cannot be copied.
pub fn copy_recursive(src: &Path, dst: &Path, skip: &[&str]) -> io::Result<u64> {
    let meta = fs::metadata(src)?;

    if meta.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        return Ok(1);
    }

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| skip.contains(&name))
        });

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}
