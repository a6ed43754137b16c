//! FileSink - appends entries to one active file and rotates it on disk
//!
//! All mutating operations (write, rotate, flush, close) serialize through a
//! single lock. Rotation runs inside that lock, so a write never lands in a
//! file that is being archived.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use contracts::{Context, ContractError, RotationPolicy, Sink, SinkConfig, DEFAULT_FILE_MODE};

use super::rotation::{compress_file, next_backup_path, open_with_mode, prune_backups};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Active file path
    pub path: PathBuf,
    pub rotation: RotationPolicy,
    /// Name override (default `file(<basename>)`)
    pub name: Option<String>,
    /// Permission bits for created files (0 = default)
    pub file_mode: u32,
}

impl FileSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation: RotationPolicy::default(),
            name: None,
            file_mode: DEFAULT_FILE_MODE,
        }
    }

    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<&SinkConfig> for FileSinkConfig {
    fn from(config: &SinkConfig) -> Self {
        Self {
            path: config.path.clone(),
            rotation: config.rotation,
            name: config.name.clone(),
            file_mode: config.effective_file_mode(),
        }
    }
}

/// Mutable state guarded by the sink lock
#[derive(Debug)]
struct FileState {
    file: Option<File>,
    /// Bytes in the active file, including partially written entries
    size: u64,
    /// Start of the active file's age window
    created: SystemTime,
    closed: bool,
}

/// Sink that appends entries to a rotating file
#[derive(Debug)]
pub struct FileSink {
    name: String,
    path: PathBuf,
    policy: RotationPolicy,
    file_mode: u32,
    /// Picks the backup destination for a rotation
    backup_path: fn(&Path, DateTime<Utc>) -> PathBuf,
    state: Mutex<FileState>,
}

impl FileSink {
    /// Open (or create) the active file and seed size and age from it
    ///
    /// # Errors
    /// - `EmptyPath` when no path is configured
    /// - `Io` when the directory or file cannot be created or inspected
    pub fn new(config: FileSinkConfig) -> Result<Self, ContractError> {
        if config.path.as_os_str().is_empty() {
            return Err(ContractError::EmptyPath);
        }

        let file_mode = if config.file_mode == 0 {
            DEFAULT_FILE_MODE
        } else {
            config.file_mode
        };
        let name = file_sink_name(config.name.as_deref(), &config.path);

        let (file, size, created) = open_active(&config.path, file_mode)?;
        debug!(sink = %name, path = %config.path.display(), size, "FileSink opened");

        Ok(Self {
            name,
            path: config.path,
            policy: config.rotation.normalized(),
            file_mode,
            backup_path: next_backup_path,
            state: Mutex::new(FileState {
                file: Some(file),
                size,
                created,
                closed: false,
            }),
        })
    }

    /// Active file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Rotation is due before appending `incoming` bytes
    fn should_rotate(&self, state: &FileState, now: SystemTime, incoming: usize) -> bool {
        if let Some(limit) = self.policy.size_limit() {
            if state.size.saturating_add(incoming as u64) > limit {
                return true;
            }
        }
        if let Some(max_age) = self.policy.age_limit() {
            let age = now.duration_since(state.created).unwrap_or_default();
            if age >= max_age {
                return true;
            }
        }
        false
    }

    /// Archive the active file and open a fresh one; caller holds the lock
    ///
    /// A failed rename leaves the active file in place (reopened) and
    /// returns the rename error. Compression and pruning failures are
    /// swallowed.
    fn rotate_locked(&self, state: &mut FileState) -> Result<(), ContractError> {
        state.file = None;

        if self.path.exists() {
            let backup = (self.backup_path)(&self.path, Utc::now());
            if let Err(e) = fs::rename(&self.path, &backup) {
                if let Err(reopen) = self.reopen_locked(state) {
                    // Left without a handle; the next write reopens
                    warn!(sink = %self.name, error = %reopen, "Reopen after failed rename failed");
                }
                return Err(e.into());
            }

            let mut compressed = false;
            if self.policy.compress {
                match compress_file(&backup, self.file_mode) {
                    Ok(_) => compressed = true,
                    Err(e) => {
                        warn!(sink = %self.name, backup = %backup.display(), error = %e, "Backup compression failed");
                        observability::record_best_effort_failure(&self.name, "compress");
                    }
                }
            }

            if let Some(max_backups) = self.policy.backup_limit() {
                if let Err(e) = prune_backups(&self.path, max_backups) {
                    warn!(sink = %self.name, error = %e, "Backup pruning failed");
                    observability::record_best_effort_failure(&self.name, "prune");
                }
            }

            info!(sink = %self.name, backup = %backup.display(), compressed, "Log file rotated");
            observability::record_rotation(&self.name, compressed);
        }

        self.reopen_locked(state)
    }

    fn reopen_locked(&self, state: &mut FileState) -> Result<(), ContractError> {
        let (file, size, created) = open_active(&self.path, self.file_mode)?;
        state.file = Some(file);
        state.size = size;
        state.created = created;
        Ok(())
    }

    #[cfg(test)]
    fn with_state<R>(&self, f: impl FnOnce(&mut FileState) -> R) -> R {
        f(&mut self.state.lock())
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, ctx, entry),
        fields(sink = %self.name, bytes = entry.len())
    )]
    async fn write(&self, ctx: &Context, entry: &[u8]) -> Result<(), ContractError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let mut state = self.state.lock();
        if state.closed {
            return Err(ContractError::Closed);
        }

        if state.file.is_none() {
            warn!(sink = %self.name, "Active file handle missing, reopening");
            self.reopen_locked(&mut state)?;
        }

        if self.should_rotate(&state, SystemTime::now(), entry.len()) {
            if let Err(e) = self.rotate_locked(&mut state) {
                warn!(sink = %self.name, error = %e, "Rotation failed, entry not written");
                observability::record_rotation_failure(&self.name);
                return Err(e);
            }
        }

        let FileState { file, size, .. } = &mut *state;
        let Some(file) = file.as_mut() else {
            return Err(ContractError::sink_write(&self.name, "active file unavailable"));
        };

        let (written, result) = write_counted(file, entry);
        *size += written as u64;
        result.map_err(Into::into)
    }

    #[instrument(name = "file_sink_flush", skip(self, ctx), fields(sink = %self.name))]
    async fn flush(&self, ctx: &Context) -> Result<(), ContractError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let state = self.state.lock();
        if state.closed {
            return Err(ContractError::Closed);
        }
        match state.file.as_ref() {
            Some(file) => Ok(file.sync_all()?),
            None => Ok(()),
        }
    }

    #[instrument(name = "file_sink_close", skip(self, _ctx), fields(sink = %self.name))]
    async fn close(&self, _ctx: &Context) -> Result<(), ContractError> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;

        if let Some(file) = state.file.take() {
            file.sync_all()?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

/// Name a FileSink reports: the override, or `file(<basename>)`
pub fn file_sink_name(name: Option<&str>, path: &Path) -> String {
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("file({base})")
}

/// Open the active file in append mode, returning it with its size and mtime
fn open_active(path: &Path, mode: u32) -> io::Result<(File, u64, SystemTime)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = open_with_mode(path, mode, true)?;
    let metadata = file.metadata()?;
    let created = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    Ok((file, metadata.len(), created))
}

/// `write_all` that reports how many bytes reached the file even on error
fn write_counted(file: &mut File, mut buf: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while !buf.is_empty() {
        match file.write(buf) {
            Ok(0) => {
                return (
                    written,
                    Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole entry")),
                );
            }
            Ok(n) => {
                written += n;
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }
    (written, Ok(()))
}
