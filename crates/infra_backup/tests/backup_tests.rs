//! Tests for infra_backup

use rust_decimal_macros::dec;

use core_kernel::{Money, PaymentId, ResidentId};
use domain_billing::PaymentStatus;
use infra_backup::{
    export_to_dir, export_to_writer, import_from_path, import_from_reader, BackupStore, Column,
    ImportIssue, ImportReport, RowTag,
};
use test_utils::{
    assert_payment_figures, assert_same_records, SampleDataset, TemporalFixtures,
    TestPaymentBuilder, TestResidentBuilder,
};

async fn seeded_store(dataset: &SampleDataset) -> BackupStore {
    let store = BackupStore::in_memory();
    for guardian in &dataset.guardians {
        store.guardians.insert_guardian(guardian.clone()).await.unwrap();
    }
    for resident in &dataset.residents {
        store.residents.insert_resident(resident.clone()).await.unwrap();
    }
    for payment in &dataset.payments {
        store.payments.insert_payment(payment.clone()).await.unwrap();
    }
    for invoice in &dataset.invoices {
        store.invoices.insert_invoice(invoice.clone()).await.unwrap();
    }
    for setting in &dataset.settings {
        store.settings.insert(setting.clone()).await.unwrap();
    }
    store
}

async fn export(store: &BackupStore) -> Vec<u8> {
    let mut file = Vec::new();
    export_to_writer(store, &mut file).await.unwrap();
    file
}

async fn import_text(text: &str) -> (BackupStore, ImportReport) {
    let store = BackupStore::in_memory();
    let report = import_from_reader(&store, text.as_bytes()).await.unwrap();
    (store, report)
}

// ============================================================================
// Round Trip Tests
// ============================================================================

mod round_trip_tests {
    use super::*;

    #[tokio::test]
    async fn test_export_then_import_reproduces_every_field() {
        let dataset = SampleDataset::new();
        let source = seeded_store(&dataset).await;
        let file = export(&source).await;

        let target = BackupStore::in_memory();
        let report = import_from_reader(&target, file.as_slice()).await.unwrap();

        assert!(report.is_clean(), "{:?}", report.issues);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.inserted.total(), dataset.len());
        assert_eq!(report.skipped.total(), 0);

        assert_same_records(
            &target.guardians.list_guardians().await.unwrap(),
            &dataset.guardians,
            |g| g.id,
        );
        assert_same_records(
            &target.residents.list_residents().await.unwrap(),
            &dataset.residents,
            |r| r.id,
        );
        assert_same_records(
            &target.payments.list_payments().await.unwrap(),
            &dataset.payments,
            |p| p.id,
        );
        assert_same_records(
            &target.invoices.list_invoices().await.unwrap(),
            &dataset.invoices,
            |i| i.id,
        );
        assert_same_records(
            &target.settings.list().await.unwrap(),
            &dataset.settings,
            |s| s.key.clone(),
        );
    }

    #[tokio::test]
    async fn test_second_import_inserts_nothing() {
        let dataset = SampleDataset::new();
        let file = export(&seeded_store(&dataset).await).await;

        let target = BackupStore::in_memory();
        import_from_reader(&target, file.as_slice()).await.unwrap();
        let again = import_from_reader(&target, file.as_slice()).await.unwrap();

        assert_eq!(again.inserted.total(), 0);
        assert_eq!(again.skipped.total(), dataset.len());
        assert!(again.is_clean(), "{:?}", again.issues);
    }

    #[tokio::test]
    async fn test_import_into_partially_restored_store_completes_it() {
        let dataset = SampleDataset::new();
        let file = export(&seeded_store(&dataset).await).await;

        // a restore that stopped after the registry
        let target = BackupStore::in_memory();
        for guardian in &dataset.guardians {
            target.guardians.insert_guardian(guardian.clone()).await.unwrap();
        }
        target
            .residents
            .insert_resident(dataset.residents[0].clone())
            .await
            .unwrap();

        let report = import_from_reader(&target, file.as_slice()).await.unwrap();

        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.skipped.guardians, dataset.guardians.len());
        assert_eq!(report.skipped.residents, 1);
        assert_eq!(report.inserted.total(), dataset.len() - dataset.guardians.len() - 1);
    }

    #[tokio::test]
    async fn test_derived_payment_figures_survive_the_round_trip() {
        let dataset = SampleDataset::new();
        let file = export(&seeded_store(&dataset).await).await;
        let (target, _) = import_text(std::str::from_utf8(&file).unwrap()).await;

        let october = target.payments.get_payment(PaymentId::new(1)).await.unwrap();
        assert_payment_figures(&october, PaymentStatus::Paid, "1062.60", "2162.40");
    }

    #[tokio::test]
    async fn test_export_to_dir_uses_conventional_name() {
        let dataset = SampleDataset::new();
        let store = seeded_store(&dataset).await;
        let dir = std::env::temp_dir().join(format!("care-backup-{}", std::process::id()));

        let (path, summary) = export_to_dir(&store, &dir, "lar", TemporalFixtures::service_date())
            .await
            .unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("backup_lar_2025-10-31.csv")
        );
        assert_eq!(summary.total(), dataset.len());

        let target = BackupStore::in_memory();
        let report = import_from_path(&target, &path).await.unwrap();
        assert_eq!(report.inserted, summary);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

// ============================================================================
// File Format Tests
// ============================================================================

mod format_tests {
    use super::*;

    #[tokio::test]
    async fn test_text_with_commas_quotes_and_newlines_is_quoted() {
        let dataset = SampleDataset::new();
        let file = export(&seeded_store(&dataset).await).await;
        let text = String::from_utf8(file).unwrap();

        assert!(text.contains("\"Ana Paula, \"\"Tia\"\" Ribeiro\""));
        assert!(text.contains("\"Quarto 12, ala \"\"B\"\"\nrevisar em dezembro\""));
    }

    #[tokio::test]
    async fn test_money_is_written_with_two_decimals() {
        let store = BackupStore::in_memory();
        let resident = TestResidentBuilder::new()
            .with_benefit(Money::new(dec!(1518)))
            .build();
        let payment = TestPaymentBuilder::for_resident(&resident)
            .with_amount_paid(Money::new(dec!(3225)))
            .build();
        store.payments.insert_payment(payment).await.unwrap();

        let text = String::from_utf8(export(&store).await).unwrap();
        let row = text.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split(',').collect();

        assert_eq!(cells[Column::AmountPaid.index()], "3225.00");
        assert_eq!(cells[Column::EligibleInvoiceAmount.index()], "1062.60");
        assert_eq!(cells[Column::ReferenceMonth.index()], "10");
    }

    #[tokio::test]
    async fn test_file_without_header_is_accepted() {
        let dataset = SampleDataset::new();
        let text = String::from_utf8(export(&seeded_store(&dataset).await).await).unwrap();
        let body = text.split_once('\n').unwrap().1;

        let (_, report) = import_text(body).await;
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.inserted.total(), dataset.len());
    }

    #[tokio::test]
    async fn test_file_in_reverse_order_still_resolves() {
        let dataset = SampleDataset::new();
        let text = String::from_utf8(export(&seeded_store(&dataset).await).await).unwrap();
        // the sample notes contain a newline inside quotes, so reverse records
        // rather than lines
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        let mut records: Vec<csv::StringRecord> =
            reader.records().map(|r| r.unwrap()).collect();
        records.reverse();

        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &records {
            writer.write_record(record).unwrap();
        }
        let reversed = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let (_, report) = import_text(&reversed).await;
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.inserted.total(), dataset.len());
    }
}

// ============================================================================
// Import Issue Tests
// ============================================================================

mod issue_tests {
    use super::*;

    #[tokio::test]
    async fn test_payment_with_unknown_resident_is_the_only_issue() {
        let mut dataset = SampleDataset::new();
        let stray = TestPaymentBuilder::for_resident(&dataset.residents[0])
            .with_id(9)
            .with_resident_id(77)
            .build();
        dataset.payments.push(stray);

        // seed through a store that does not check references
        let file = export(&seeded_store(&dataset).await).await;
        let (target, report) = import_text(std::str::from_utf8(&file).unwrap()).await;

        assert_eq!(report.issues.len(), 1);
        match &report.issues[0] {
            ImportIssue::DanglingReference {
                entity,
                id,
                field,
                target: missing,
                ..
            } => {
                assert_eq!(*entity, RowTag::Payment);
                assert_eq!(id, "9");
                assert_eq!(*field, Column::ResidentId);
                assert_eq!(*missing, RowTag::Resident);
            }
            other => panic!("unexpected issue {other:?}"),
        }
        assert_eq!(report.inserted.total(), dataset.len() - 1);
        assert!(target
            .payments
            .payments_of(ResidentId::new(77))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invoice_pointing_at_refused_payment_is_dangling_too() {
        let text = [
            "GUARDIAN,1,Carlos,,,,true,,,,,,,,,,,,,,,,,,,,,,,,,",
            "RESIDENT,1,Maria,,,,true,,1,,,REGULAR,0.00,1518.00,,,,,,,,,,,,,,,,,,",
            "PAYMENT,1,,,,,,,,2,,,,,10,2025,100.00,,,,,,,,,,,,,,,",
            "INVOICE,1,,,,,,,,1,1,,,,10,2025,,,55,,,,,,,,100.00,Mensalidade,,,,",
        ]
        .join("\n");

        let (_, report) = import_text(&text).await;

        assert_eq!(report.inserted.guardians, 1);
        assert_eq!(report.inserted.residents, 1);
        let fields: Vec<(RowTag, Column)> = report
            .issues
            .iter()
            .map(|issue| match issue {
                ImportIssue::DanglingReference { entity, field, .. } => (*entity, *field),
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                (RowTag::Payment, Column::ResidentId),
                (RowTag::Invoice, Column::PaymentId)
            ]
        );
    }

    #[tokio::test]
    async fn test_unreadable_money_imports_as_zero_with_warning() {
        let text = [
            "GUARDIAN,1,Carlos,,,,,,,,,,,,,,,,,,,,,,,,,,,,2025-10-01T09:30:00Z,2025-10-01T09:30:00Z",
            "RESIDENT,1,Maria,,,,,,1,,,REGULAR,abc,\"1.518,00\",,,,,,,,,,,,,,,,,2025-10-01T09:30:00Z,2025-10-01T09:30:00Z",
        ]
        .join("\n");

        let (target, report) = import_text(&text).await;

        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.warnings.len(), 1);
        let maria = target.residents.get_resident(ResidentId::new(1)).await.unwrap();
        assert!(maria.base_fee_amount.is_zero());
        assert_eq!(maria.benefit_income_amount, Money::new(dec!(1518.00)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{free_text_strategy, money_strategy, person_name_strategy};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_resident_text_and_money_survive_round_trip(
            name in person_name_strategy(),
            notes in free_text_strategy(),
            benefit in money_strategy(),
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let dataset = SampleDataset::new();
                let source = seeded_store(&dataset).await;
                let mut resident = TestResidentBuilder::new()
                    .with_id(50)
                    .with_name(name)
                    .with_benefit(benefit)
                    .build();
                resident.notes = Some(notes);
                source.residents.insert_resident(resident.clone()).await.unwrap();

                let file = export(&source).await;
                let target = BackupStore::in_memory();
                let report = import_from_reader(&target, file.as_slice()).await.unwrap();

                prop_assert!(report.is_clean());
                let restored = target.residents.get_resident(ResidentId::new(50)).await.unwrap();
                prop_assert_eq!(restored, resident);
                Ok(())
            })?;
        }
    }
}
