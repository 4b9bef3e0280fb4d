// Whole-database import and export.
//
// Import never leaves the user without a working database: the live file is
// backed up before the candidate is copied in, and any failure after that
// point restores the backup and reopens it. On success the backup stays on
// disk as a safety net. A process-wide lock serializes transfers; a second
// transfer while one is running is refused, not queued.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::constants::DB_BACKUP_SUFFIX;
use crate::db::{integrity, Store};
use crate::error::{FilmlogError, Result};

static TRANSFER_LOCK: Mutex<()> = Mutex::new(());

/// Where an import ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Copying,
    Verifying,
    Adopted,
    RolledBack,
}

#[derive(Debug)]
pub struct ImportOutcome {
    /// The live handle after the operation, over either the adopted
    /// candidate or the restored original.
    pub store: Store,
    pub phase: TransferPhase,
    /// Why the candidate was refused, when it was.
    pub rejection: Option<String>,
}

/// Import failure modes.
#[derive(Debug)]
pub enum ImportError {
    /// The request was rejected before the live file was touched; the
    /// untouched handle comes back with the reason.
    Refused { store: Store, reason: FilmlogError },
    /// The live database could not be brought back after a failure.
    Unrecoverable(FilmlogError),
}

fn backup_path(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(DB_BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Byte copy with a size check on the result. A short copy removes the
/// partial destination before reporting the error.
fn copy_verified(source: &Path, destination: &Path) -> Result<u64> {
    let copied = fs::copy(source, destination)?;
    let expected = fs::metadata(source)?.len();
    if copied != expected || fs::metadata(destination)?.len() != expected {
        let _ = fs::remove_file(destination);
        return Err(FilmlogError::Other(format!(
            "Copy of {} was incomplete",
            source.display()
        )));
    }
    Ok(copied)
}

/// Copy the live database to `destination`. The write-ahead log is
/// checkpointed first so the copy is a complete, self-contained file.
pub fn export_database(store: &Store, destination: &Path) -> Result<u64> {
    let _guard = TRANSFER_LOCK
        .try_lock()
        .map_err(|_| FilmlogError::TransferBusy)?;

    store
        .conn()
        .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;

    let bytes = copy_verified(store.path(), destination)?;
    log::info!(
        "Exported database to {} ({} bytes)",
        destination.display(),
        bytes
    );
    Ok(bytes)
}

/// Replace the live database with `candidate`.
///
/// Requests rejected before the live file is touched (busy transfer,
/// missing candidate, backup failure) come back as `Refused` with the live
/// handle intact. Once the candidate has been copied in, the operation runs
/// to either adoption or a restore of the backup; `Unrecoverable` is
/// returned only when the restore itself fails.
pub fn import_database(
    store: Store,
    candidate: &Path,
) -> std::result::Result<ImportOutcome, ImportError> {
    let _guard = match TRANSFER_LOCK.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            return Err(ImportError::Refused {
                store,
                reason: FilmlogError::TransferBusy,
            });
        }
    };

    if !candidate.is_file() {
        return Err(ImportError::Refused {
            store,
            reason: FilmlogError::InvalidPath(format!("{} is not a file", candidate.display())),
        });
    }

    let live_path = match store.close() {
        Ok(path) => path,
        Err(err) => return Err(ImportError::Unrecoverable(err)),
    };

    let backup = backup_path(&live_path);
    if let Err(err) = copy_verified(&live_path, &backup) {
        // The live file is still untouched; reopen it and refuse
        return match Store::open(&live_path) {
            Ok(store) => Err(ImportError::Refused { store, reason: err }),
            Err(reopen) => Err(ImportError::Unrecoverable(reopen)),
        };
    }
    log::info!("Backed up live database to {}", backup.display());

    if let Err(err) = copy_verified(candidate, &live_path) {
        return roll_back(&live_path, &backup, TransferPhase::Copying, err.to_string());
    }

    // Opening runs the migrations; a file that is not a database, or is
    // newer than this build understands, fails here
    let imported = match Store::open(&live_path) {
        Ok(imported) => imported,
        Err(err) => {
            return roll_back(&live_path, &backup, TransferPhase::Copying, err.to_string());
        }
    };

    // From here every failure restores the backup, including the verifier
    // erroring out rather than reporting mismatches
    let report = match integrity::verify_database(imported.conn()) {
        Ok(report) => report,
        Err(err) => {
            let _ = imported.close();
            return roll_back(&live_path, &backup, TransferPhase::Verifying, err.to_string());
        }
    };
    if !report.is_valid() {
        let _ = imported.close();
        return roll_back(
            &live_path,
            &backup,
            TransferPhase::Verifying,
            format!("Schema verification failed: {}", report.failures.join("; ")),
        );
    }

    log::info!("Imported database from {}", candidate.display());
    Ok(ImportOutcome {
        store: imported,
        phase: TransferPhase::Adopted,
        rejection: None,
    })
}

fn roll_back(
    live_path: &Path,
    backup: &Path,
    failed_in: TransferPhase,
    reason: String,
) -> std::result::Result<ImportOutcome, ImportError> {
    log::warn!("Import refused ({:?} phase): {}", failed_in, reason);

    if let Err(err) = fs::copy(backup, live_path) {
        return Err(ImportError::Unrecoverable(err.into()));
    }
    let store = match Store::open(live_path) {
        Ok(store) => store,
        Err(err) => return Err(ImportError::Unrecoverable(err)),
    };

    Ok(ImportOutcome {
        store,
        phase: TransferPhase::RolledBack,
        rejection: Some(reason),
    })
}
