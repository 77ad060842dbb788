//! # End-to-End Flows
//!
//! Complete runs over the file-backed adapters, plus a property check that
//! any valid allocation table distributes the supply exactly.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use genesis_orchestrator::adapters::{
        FileManifestWriter, InMemoryCheckpointStore, InMemoryCredentialStore, InMemoryLedger,
        InMemoryManifestSink, UnconfiguredLockEnforcer,
    };
    use genesis_orchestrator::domain::{plan, OperationKind};
    use genesis_orchestrator::ports::outbound::{CredentialProvider, ManifestSink};
    use genesis_orchestrator::{
        AllocationCategory, AssetParams, DistributionConfig, GenesisError, GenesisOrchestrator,
        LedgerSettings, LockStatus, Percentage, RunManifest, StorageSettings,
        CONTROLLER_CREDENTIAL,
    };
    use proptest::prelude::*;

    use crate::harness::{Workspace, FUNDING, STANDARD_CONFIG};

    #[tokio::test]
    async fn test_standard_distribution_over_files() {
        let workspace = Workspace::funded();
        let outcome = workspace
            .orchestrator(workspace.open_ledger())
            .run()
            .await
            .unwrap();

        let quantities: Vec<u64> = outcome
            .manifest
            .body
            .issuances
            .iter()
            .map(|r| r.quantity)
            .collect();
        assert_eq!(
            quantities,
            vec![
                400_000_000_000_000_000,
                250_000_000_000_000_000,
                200_000_000_000_000_000,
                100_000_000_000_000_000,
                50_000_000_000_000_000,
            ]
        );

        // what landed on disk is what the run returned
        let on_disk: RunManifest = serde_json::from_slice(
            &std::fs::read(workspace.storage().manifest_path()).unwrap(),
        )
        .unwrap();
        assert_eq!(on_disk, outcome.manifest);
        assert!(on_disk.verify_digest());

        let schedule = &on_disk.body.release_schedule;
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].category, "team");
        assert_eq!(schedule[0].status, LockStatus::Intended);
    }

    #[tokio::test]
    async fn test_completed_run_does_not_touch_ledger() {
        let workspace = Workspace::funded();
        let first = workspace
            .orchestrator(workspace.open_ledger())
            .run()
            .await
            .unwrap();

        let ledger = workspace.open_ledger();
        ledger.set_unavailable(true);
        let second = workspace.orchestrator(ledger.clone()).run().await.unwrap();

        assert_eq!(second.manifest, first.manifest);
        assert!(second.steps_executed.is_empty());
        assert_eq!(second.steps_skipped.len(), plan(workspace.config().table()).len());
        assert_eq!(ledger.submission_count(OperationKind::Issue), 0);
    }

    #[tokio::test]
    async fn test_needs_funding_reports_persisted_identity() {
        let workspace = Workspace::standard();
        let err = workspace
            .orchestrator(workspace.open_ledger())
            .run()
            .await
            .unwrap_err();

        let GenesisError::NeedsFunding { identity } = err else {
            panic!("expected NeedsFunding, got {err}");
        };
        assert_eq!(
            workspace
                .credentials()
                .peek_identity(CONTROLLER_CREDENTIAL)
                .unwrap(),
            Some(identity)
        );
        assert!(workspace.checkpoint().is_some());
    }

    #[tokio::test]
    async fn test_changed_allocation_refused_mid_run() {
        let workspace = Workspace::funded();
        let ledger = workspace.open_ledger();
        ledger.reject_after(OperationKind::Issue, 2, "node busy");
        assert!(workspace.orchestrator(ledger).run().await.is_err());

        // community and team were issued under 40/25; move 5 points between them
        let changed = Workspace::new(
            &STANDARD_CONFIG
                .replace("percentage = \"40\"", "percentage = \"35\"")
                .replace("percentage = \"25\"", "percentage = \"30\""),
        );
        let config = changed
            .config()
            .clone()
            .with_storage(StorageSettings::new(workspace.path()));
        let orchestrator = GenesisOrchestrator::new(
            config,
            workspace.open_ledger(),
            Arc::new(workspace.credentials()),
            Arc::new(workspace.checkpoint_store()),
            Arc::new(FileManifestWriter::new(workspace.storage().manifest_path())),
            Arc::new(UnconfiguredLockEnforcer),
        );

        assert!(matches!(
            orchestrator.run().await,
            Err(GenesisError::CheckpointMismatch(_))
        ));
    }

    #[test]
    fn test_manifest_file_is_never_overwritten() {
        let workspace = Workspace::standard();
        let rt = tokio::runtime::Runtime::new().unwrap();
        workspace.fund_controller(FUNDING);
        let outcome = rt
            .block_on(workspace.orchestrator(workspace.open_ledger()).run())
            .unwrap();

        let writer = FileManifestWriter::new(workspace.storage().manifest_path());
        let mut other = outcome.manifest.body.clone();
        other.total_issued = 1;
        let forged = RunManifest::new(other).unwrap();

        assert!(matches!(
            writer.write(&forged),
            Err(GenesisError::ReportFailed { .. })
        ));
        // rewriting identical content is accepted
        writer.write(&outcome.manifest).unwrap();
        assert_eq!(writer.read().unwrap(), Some(outcome.manifest));
    }

    /// Random tables of 1-6 categories with whole-number shares summing to 100.
    fn share_splits() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::btree_set(1u64..100, 0..6).prop_map(|cuts| {
            let mut bounds: Vec<u64> = std::iter::once(0)
                .chain(cuts)
                .chain(std::iter::once(100))
                .collect();
            bounds.dedup();
            bounds.windows(2).map(|w| w[1] - w[0]).collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_any_table_distributes_exact_supply(
            shares in share_splits(),
            total_supply in 1u64..=10_000_000_000,
            decimals in 0u8..=9,
        ) {
            let categories: Vec<AllocationCategory> = shares
                .iter()
                .enumerate()
                .map(|(i, pct)| AllocationCategory::new(format!("c{i}"), Percentage::whole(*pct).unwrap()))
                .collect();
            let config = DistributionConfig::new(
                AssetParams {
                    name: "Prop".into(),
                    symbol: "PRP".into(),
                    decimals,
                    total_supply,
                    retain_freeze_authority: false,
                    metadata_uri: None,
                },
                categories,
                LedgerSettings {
                    confirmation_timeout: Duration::from_secs(1),
                    poll_interval: Duration::from_millis(1),
                },
                StorageSettings::default(),
            )
            .unwrap();

            let ledger = Arc::new(InMemoryLedger::new());
            let credentials = Arc::new(InMemoryCredentialStore::new());
            let controller = credentials.load_or_create(CONTROLLER_CREDENTIAL).unwrap();
            ledger.fund(&controller.identity(), FUNDING).unwrap();

            let orchestrator = GenesisOrchestrator::new(
                config.clone(),
                ledger.clone(),
                credentials,
                Arc::new(InMemoryCheckpointStore::new()),
                Arc::new(InMemoryManifestSink::new()),
                Arc::new(UnconfiguredLockEnforcer),
            );
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let outcome = rt.block_on(orchestrator.run()).unwrap();

            let expected = config.total_units().unwrap();
            prop_assert_eq!(outcome.manifest.body.total_issued, expected);
            let supply = ledger.asset(&outcome.manifest.body.asset.asset_id).unwrap().supply;
            prop_assert_eq!(supply, expected);
            for record in &outcome.manifest.body.issuances {
                let held = ledger.holding(&record.destination).unwrap().amount;
                prop_assert_eq!(held, record.quantity);
            }
        }
    }
}
