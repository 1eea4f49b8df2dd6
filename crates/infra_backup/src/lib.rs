//! Backup and Restore
//!
//! The whole dataset (guardians, residents, payments, invoices and
//! settings) is saved as one flat CSV file. Every row starts with a tag
//! naming its kind and shares one fixed column layout (see [`layout`]).
//!
//! - [`exporter`] snapshots the store and writes the file
//! - [`importer`] restores a file into a store, skipping rows that are
//!   already present and reporting the ones it cannot apply
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_backup::{export_to_writer, import_from_reader, BackupStore};
//!
//! let mut file = Vec::new();
//! export_to_writer(&live_store, &mut file).await?;
//!
//! let restored = BackupStore::in_memory();
//! let report = import_from_reader(&restored, file.as_slice()).await?;
//! assert!(report.is_clean());
//! ```

pub mod error;
pub mod layout;
pub mod row;
pub mod report;
pub mod store;
pub mod exporter;
pub mod importer;

pub use error::BackupError;
pub use layout::{header_record, Column, RowTag, COLUMN_COUNT};
pub use row::{BackupRow, DecodeError, Decoded};
pub use report::{ExportSummary, ImportIssue, ImportReport, TypeCounts};
pub use store::BackupStore;
pub use exporter::{backup_file_name, export_to_dir, export_to_writer, write_snapshot, Snapshot};
pub use importer::{import_from_path, import_from_reader};
