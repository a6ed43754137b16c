//! On-disk rotation helpers: backup naming, gzip, retention
//!
//! Layout for an active file `/var/log/app.log`:
//! - backups: `/var/log/app.log.20250301-123456` (UTC, second resolution)
//! - same-second collisions: `/var/log/app.log.20250301-123456.1`, `.2`, ...
//! - compressed backups: any of the above plus `.gz`

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

/// chrono format of the backup timestamp suffix
pub const BACKUP_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Length of a formatted backup timestamp (`YYYYMMDD-HHMMSS`)
const BACKUP_TIME_LEN: usize = 15;

/// `<base>.<suffix>` without going through UTF-8
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Backup path for `base` rotated at `at`
pub fn rotated_filename(base: &Path, at: DateTime<Utc>) -> PathBuf {
    with_suffix(base, &at.format(BACKUP_TIME_FORMAT).to_string())
}

/// Backup path for rotating `base` at `at`
///
/// Rotations within the same second get `.1`, `.2`, ... numbered past the
/// highest sequence already on disk, so a newer backup never takes a slot
/// that pruning freed.
pub fn next_backup_path(base: &Path, at: DateTime<Utc>) -> PathBuf {
    let candidate = rotated_filename(base, at);
    let stamp = at.format(BACKUP_TIME_FORMAT).to_string();

    let mut seq = match highest_sequence(base, &stamp) {
        Some(highest) => highest + 1,
        None if !backup_exists(&candidate) => return candidate,
        None => 1,
    };
    loop {
        let numbered = with_suffix(&candidate, &seq.to_string());
        if !backup_exists(&numbered) {
            return numbered;
        }
        seq += 1;
    }
}

fn backup_exists(path: &Path) -> bool {
    path.exists() || with_suffix(path, "gz").exists()
}

/// Directory holding the active file and its backups
fn backup_dir(base: &Path) -> PathBuf {
    match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Highest collision sequence among existing backups stamped `stamp`
fn highest_sequence(base: &Path, stamp: &str) -> Option<u32> {
    let base_name = base.file_name()?.to_str()?;
    fs::read_dir(backup_dir(base))
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let (found, seq) = parse_backup_name(base_name, &name)?;
            (found == stamp).then_some(seq)
        })
        .max()
}

/// Split a backup name into its timestamp and collision sequence (0 when
/// absent)
///
/// Accepts `<base>.<stamp>`, `<base>.<stamp>.<seq>`, each optionally
/// followed by `.gz`.
fn parse_backup_name<'a>(base_name: &str, candidate: &'a str) -> Option<(&'a str, u32)> {
    let rest = candidate.strip_prefix(base_name)?.strip_prefix('.')?;
    let rest = rest.strip_suffix(".gz").unwrap_or(rest);

    let (stamp, seq) = match rest.split_once('.') {
        Some((stamp, seq)) => (stamp, seq),
        None => (rest, ""),
    };

    let bytes = stamp.as_bytes();
    let stamp_ok = bytes.len() == BACKUP_TIME_LEN
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 8 { *b == b'-' } else { b.is_ascii_digit() });
    if !stamp_ok {
        return None;
    }

    if seq.is_empty() {
        return Some((stamp, 0));
    }
    if !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    seq.parse().ok().map(|seq| (stamp, seq))
}

/// Open (or create) a file for writing with the given permission bits
pub(crate) fn open_with_mode(path: &Path, mode: u32, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}

/// Gzip `src` into `src.gz` and remove `src`
///
/// On failure the partial `.gz` is removed and `src` is left in place.
pub fn compress_file(src: &Path, mode: u32) -> io::Result<PathBuf> {
    let dst = with_suffix(src, "gz");

    let result = write_gzip(src, &dst, mode);
    if let Err(e) = result {
        let _ = fs::remove_file(&dst);
        return Err(e);
    }

    fs::remove_file(src)?;
    debug!(src = %src.display(), dst = %dst.display(), "Backup compressed");
    Ok(dst)
}

fn write_gzip(src: &Path, dst: &Path, mode: u32) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    let out = open_with_mode(dst, mode, false)?;

    let mut encoder = GzEncoder::new(BufWriter::new(out), Compression::default());
    io::copy(&mut reader, &mut encoder)?;

    let mut writer = encoder.finish()?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

/// Delete the oldest backups of `base` (by modification time) so that at
/// most `max_backups` remain
///
/// Returns how many files were removed. Individual removal failures are
/// logged and skipped.
pub fn prune_backups(base: &Path, max_backups: usize) -> io::Result<usize> {
    if max_backups == 0 {
        return Ok(0);
    }

    let Some(base_name) = base.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let dir = backup_dir(base);

    // Sorted by mtime; equal mtimes fall back to the name's stamp and sequence
    let mut backups: Vec<(SystemTime, String, u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let Ok(entry) = entry else { continue };
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some((stamp, seq)) = parse_backup_name(base_name, name) else {
            continue;
        };
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        backups.push((modified, stamp.to_string(), seq, entry.path()));
    }

    if backups.len() <= max_backups {
        return Ok(0);
    }

    backups.sort();
    let excess = backups.len() - max_backups;

    let mut removed = 0;
    for (_, _, _, path) in backups.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                debug!(path = %path.display(), "Old backup removed");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove old backup"),
        }
    }
    Ok(removed)
}
