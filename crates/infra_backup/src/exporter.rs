//! Backup exporter
//!
//! Reads every collection into a [`Snapshot`] first and only then writes,
//! so a failing read never leaves a half-written file behind.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument};

use core_kernel::temporal::format_date;
use core_kernel::Setting;
use domain_billing::{Invoice, Payment};
use domain_registry::{Guardian, Resident};

use crate::error::BackupError;
use crate::layout::header_record;
use crate::report::ExportSummary;
use crate::row::BackupRow;
use crate::store::BackupStore;

/// Every record of the store at one point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub guardians: Vec<Guardian>,
    pub residents: Vec<Resident>,
    pub payments: Vec<Payment>,
    pub invoices: Vec<Invoice>,
    pub settings: Vec<Setting>,
}

impl Snapshot {
    pub async fn capture(store: &BackupStore) -> Result<Self, BackupError> {
        let mut snapshot = Self {
            guardians: store.guardians.list_guardians().await?,
            residents: store.residents.list_residents().await?,
            payments: store.payments.list_payments().await?,
            invoices: store.invoices.list_invoices().await?,
            settings: store.settings.list().await?,
        };
        snapshot.guardians.sort_by_key(|g| g.id);
        snapshot.residents.sort_by_key(|r| r.id);
        snapshot.payments.sort_by_key(|p| p.id);
        snapshot.invoices.sort_by_key(|i| i.id);
        snapshot.settings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(snapshot)
    }

    /// Rows in file order
    pub fn rows(&self) -> impl Iterator<Item = BackupRow> + '_ {
        let guardians = self.guardians.iter().cloned().map(BackupRow::Guardian);
        let residents = self.residents.iter().cloned().map(BackupRow::Resident);
        let payments = self.payments.iter().cloned().map(BackupRow::Payment);
        let invoices = self.invoices.iter().cloned().map(BackupRow::Invoice);
        let settings = self.settings.iter().cloned().map(BackupRow::Config);
        guardians
            .chain(residents)
            .chain(payments)
            .chain(invoices)
            .chain(settings)
    }
}

/// Writes a full backup of `store` to `writer`
#[instrument(skip_all)]
pub async fn export_to_writer<W: Write>(
    store: &BackupStore,
    writer: W,
) -> Result<ExportSummary, BackupError> {
    let snapshot = Snapshot::capture(store).await?;
    write_snapshot(&snapshot, writer)
}

/// Serializes an already captured snapshot
pub fn write_snapshot<W: Write>(snapshot: &Snapshot, writer: W) -> Result<ExportSummary, BackupError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header_record())?;

    let mut summary = ExportSummary::default();
    for row in snapshot.rows() {
        csv.write_record(row.encode())?;
        summary.add(row.tag());
    }
    csv.flush()?;

    info!(rows = summary.total(), %summary, "backup written");
    Ok(summary)
}

/// Writes a backup into `dir` under the conventional file name
#[instrument(skip(store, dir), fields(dir = %dir.display()))]
pub async fn export_to_dir(
    store: &BackupStore,
    dir: &Path,
    context: &str,
    date: NaiveDate,
) -> Result<(PathBuf, ExportSummary), BackupError> {
    let snapshot = Snapshot::capture(store).await?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(backup_file_name(context, date));
    let summary = write_snapshot(&snapshot, File::create(&path)?)?;
    info!(path = %path.display(), "backup saved");
    Ok((path, summary))
}

/// `backup_<context>_<YYYY-MM-DD>.csv`
///
/// Characters other than ASCII letters, digits, `-` and `_` in the context
/// become `_`.
pub fn backup_file_name(context: &str, date: NaiveDate) -> String {
    let context: String = context
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let context = if context.is_empty() { "data".to_string() } else { context };
    format!("backup_{}_{}.csv", context, format_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::GuardianId;
    use domain_registry::NewGuardian;

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
        assert_eq!(backup_file_name("lar", date), "backup_lar_2025-10-31.csv");
        assert_eq!(
            backup_file_name("Lar São Vicente", date),
            "backup_Lar_S_o_Vicente_2025-10-31.csv"
        );
        assert_eq!(backup_file_name("  ", date), "backup_data_2025-10-31.csv");
    }

    #[tokio::test]
    async fn test_empty_store_writes_only_header() {
        let store = BackupStore::in_memory();
        let mut out = Vec::new();
        let summary = export_to_writer(&store, &mut out).await.unwrap();

        assert_eq!(summary.total(), 0);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("TYPE,ID,NAME,"));
    }

    #[tokio::test]
    async fn test_rows_follow_kind_then_id_order() {
        let store = BackupStore::in_memory();
        for id in [3, 1, 2] {
            store
                .guardians
                .insert_guardian(Guardian::from_request(
                    GuardianId::new(id),
                    NewGuardian::named(format!("Guardian {id}")),
                ))
                .await
                .unwrap();
        }
        store.settings.put(Setting::new("institution_name", "Lar")).await.unwrap();

        let mut out = Vec::new();
        export_to_writer(&store, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let tags: Vec<String> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').take(2).collect::<Vec<_>>().join(","))
            .collect();

        assert_eq!(tags, vec!["GUARDIAN,1", "GUARDIAN,2", "GUARDIAN,3", "CONFIG,"]);
    }
}
