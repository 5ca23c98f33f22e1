//! Build fingerprinting: a 64-bit hash over the invocation arguments and
//! every input file's bytes (or mtime), persisted next to the atlas.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::Context;
use crunch_core::hash;
use walkdir::WalkDir;

/// Folds the raw argv tail, in order.
pub fn hash_args<I, S>(args: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut h = 0u64;
    for arg in args {
        hash::fold_str(&mut h, arg.as_ref());
    }
    h
}

/// Folds one file: full byte content, or seconds-since-epoch mtime when
/// `use_time` is set.
pub fn hash_file(h: &mut u64, path: &Path, use_time: bool) -> anyhow::Result<()> {
    if use_time {
        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .with_context(|| format!("failed to stat file: {}", path.display()))?;
        let secs = mtime
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        hash::combine(h, secs);
    } else {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
        hash::fold_bytes(h, &bytes);
    }
    Ok(())
}

/// Folds a directory tree depth-first. Directory entries contribute their
/// path string, files their content or mtime.
pub fn hash_tree(h: &mut u64, root: &Path, use_time: bool) -> anyhow::Result<()> {
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_dir() {
            hash::fold_str(h, &entry.path().to_string_lossy());
        } else {
            hash_file(h, entry.path(), use_time)?;
        }
    }
    Ok(())
}

/// Reads a previously saved fingerprint; `None` when absent or unparsable.
pub fn load(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Writes the fingerprint as a decimal integer plus newline.
pub fn save(path: &Path, hash: u64) -> std::io::Result<()> {
    fs::write(path, format!("{hash}\n"))
}
