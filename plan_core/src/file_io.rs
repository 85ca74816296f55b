//! # File I/O
//!
//! Design documents on disk:
//! - **Atomic saves**: write `.plan.tmp`, sync, rename over the target
//! - **Advisory locking**: OS lock plus a `.plan.lock` file naming the holder
//! - **Version checks**: documents from an incompatible schema are refused
//!
//! ## Example
//!
//! ```rust,no_run
//! use plan_core::design::generate;
//! use plan_core::document::DesignDocument;
//! use plan_core::file_io::{load_design, save_design, FileLock};
//! use plan_core::geometry::Direction;
//! use plan_core::program::{BedroomConfig, BuildingType, DesignInput};
//! use plan_core::rules::RuleTables;
//! use std::path::Path;
//!
//! let rules = RuleTables::builtin()?;
//! let input = DesignInput::new(1200.0, Direction::East, BuildingType::IndependentHouse, BedroomConfig::new(3), 2);
//! let doc = DesignDocument::new("East plot", generate(&input, &rules)?);
//! let path = Path::new("east_plot.plan");
//!
//! let lock = FileLock::acquire(path, "architect@studio.in")?;
//! save_design(&doc, path)?;
//! drop(lock);
//!
//! let loaded = load_design(path)?;
//! assert_eq!(loaded.meta.id, doc.meta.id);
//! # Ok::<(), plan_core::errors::PlanError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::document::{DesignDocument, SCHEMA_VERSION};
use crate::errors::{PlanError, PlanResult};

/// Locks older than this are treated as abandoned
const STALE_LOCK_HOURS: i64 = 24;

/// Contents of a `.lock` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Who holds the lock (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on a design file, released on drop.
///
/// Holds the OS-level lock (fs2) for the lifetime of the guard and writes a
/// `.lock` file so other users can see who has the document open.
#[derive(Debug)]
pub struct FileLock {
    document_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock for `path`.
    ///
    /// Fails with [`PlanError::FileLocked`] when another live process holds
    /// it. Stale locks (dead process on this machine, or older than a day)
    /// are taken over.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> PlanResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = live_lock(&lock_path) {
            return Err(PlanError::file_locked(
                path.display().to_string(),
                existing.holder(),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| io_error("create lock", &lock_path, e))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            PlanError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let json = serde_json::to_string_pretty(&info).map_err(|e| PlanError::serialization(e.to_string()))?;
        lock_file
            .write_all(json.as_bytes())
            .map_err(|e| io_error("write lock", &lock_path, e))?;
        lock_file.sync_all().map_err(|e| io_error("sync lock", &lock_path, e))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "Lock acquired");
        Ok(FileLock {
            document_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Who holds the lock on `path`, if anyone.
    pub fn check(path: &Path) -> Option<LockInfo> {
        live_lock(&lock_path_for(path))
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // the OS lock goes with the handle
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn io_error(operation: &str, path: &Path, e: std::io::Error) -> PlanError {
    PlanError::file_error(operation, path.display().to_string(), e.to_string())
}

/// `house.plan` -> `house.plan.lock`
fn lock_path_for(path: &Path) -> PathBuf {
    let mut lock_path = path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

/// `house.plan` -> `house.plan.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp_path = path.to_path_buf();
    let extension = tmp_path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp_path.set_extension(extension);
    tmp_path
}

fn read_lock_info(lock_path: &Path) -> PlanResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    serde_json::from_str(&contents).map_err(|e| PlanError::serialization(e.to_string()))
}

/// Lock info from an existing, non-stale lock file
fn live_lock(lock_path: &Path) -> Option<LockInfo> {
    if !lock_path.exists() {
        return None;
    }
    let info = read_lock_info(lock_path).ok()?;
    if is_lock_stale(&info) {
        tracing::warn!(path = %lock_path.display(), holder = %info.holder(), "Ignoring stale lock");
        return None;
    }
    Some(info)
}

fn is_lock_stale(info: &LockInfo) -> bool {
    if hostname().as_deref() == Some(info.machine.as_str()) && !process_alive(info.pid) {
        return true;
    }
    (Utc::now() - info.locked_at).num_hours() > STALE_LOCK_HOURS
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists() || !Path::new("/proc").exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    match Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()),
        Err(_) => true,
    }
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

fn read_to_string(path: &Path, operation: &str) -> PlanResult<String> {
    let mut file = File::open(path).map_err(|e| io_error(operation, path, e))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| io_error(operation, path, e))?;
    Ok(contents)
}

// ============================================================================
// Save / load
// ============================================================================

/// Save a document atomically.
///
/// 1. Serialize to JSON
/// 2. Write `<path>.tmp` and fsync it
/// 3. Rename over `path`
///
/// An interrupted save leaves the previous file intact.
pub fn save_design(doc: &DesignDocument, path: &Path) -> PlanResult<()> {
    let json = serde_json::to_string_pretty(doc).map_err(|e| PlanError::serialization(e.to_string()))?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| io_error("create temp file", &tmp_path, e))?;
    let written = tmp_file
        .write_all(json.as_bytes())
        .and_then(|()| tmp_file.sync_all())
        .map_err(|e| io_error("write temp file", &tmp_path, e));
    drop(tmp_file);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_error("rename to final", path, e)
    })?;

    tracing::info!(path = %path.display(), id = %doc.meta.id, "Design saved");
    Ok(())
}

/// Load a document and check its schema version.
///
/// Floor plans are rebuilt through their consistency checks, so a file
/// whose geometry was edited into an invalid state fails here with
/// `SerializationError`.
pub fn load_design(path: &Path) -> PlanResult<DesignDocument> {
    let contents = read_to_string(path, "read")?;

    // check the header first so an old file reports a version error rather
    // than whichever field changed shape
    let header: VersionProbe = serde_json::from_str(&contents)
        .map_err(|e| PlanError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;
    validate_version(&header.meta.version)?;

    let doc: DesignDocument = serde_json::from_str(&contents)
        .map_err(|e| PlanError::serialization(format!("Invalid design in {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), floors = doc.design.floors.len(), "Design loaded");
    Ok(doc)
}

#[derive(Deserialize)]
struct VersionProbe {
    meta: VersionField,
}

#[derive(Deserialize)]
struct VersionField {
    version: String,
}

/// Load a document and report whether someone else has it locked.
///
/// `Some(LockInfo)` means the caller should treat the document as read-only.
pub fn load_design_with_lock_check(path: &Path) -> PlanResult<(DesignDocument, Option<LockInfo>)> {
    let doc = load_design(path)?;
    Ok((doc, FileLock::check(path)))
}

/// Major must match; while in 0.x a newer minor is also refused.
pub fn validate_version(file_version: &str) -> PlanResult<()> {
    let mismatch = || PlanError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Option<Vec<u32>> { v.split('.').map(|p| p.parse().ok()).collect() };

    let file_parts = parse(file_version).filter(|p| !p.is_empty()).ok_or_else(mismatch)?;
    let current_parts = parse(SCHEMA_VERSION).filter(|p| !p.is_empty()).ok_or_else(mismatch)?;

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }
    if current_parts[0] == 0 {
        let file_minor = file_parts.get(1).copied().unwrap_or(0);
        let current_minor = current_parts.get(1).copied().unwrap_or(0);
        if file_minor > current_minor {
            return Err(mismatch());
        }
    }
    Ok(())
}
