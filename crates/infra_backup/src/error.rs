//! Backup error types
//!
//! Only failures that stop a whole export or import live here. Problems with
//! individual rows are collected as [`ImportIssue`](crate::report::ImportIssue)
//! values in the import report.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that abort a backup or restore
#[derive(Debug, Error)]
pub enum BackupError {
    /// Reading or writing the backup file failed
    #[error("Backup I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV layer failed
    #[error("Backup CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A storage port failed while reading or writing the dataset
    #[error("Storage error during backup: {0}")]
    Port(#[from] PortError),
}

impl BackupError {
    /// Checks if this error came from the file rather than the store
    pub fn is_file_error(&self) -> bool {
        matches!(self, BackupError::Io(_) | BackupError::Csv(_))
    }
}
