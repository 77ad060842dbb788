//! # Crash / Resume
//!
//! A run killed at any point and started again must end with exactly the
//! configured supply on the ledger: no category issued twice, none skipped,
//! and recipient identities unchanged across the restart.
//!
//! A full standard run writes the checkpoint 27 times:
//!
//! | Writes | Step |
//! |--------|------|
//! | 1 | run created |
//! | 2 | asset-init (pending, confirmed) |
//! | 10 | provision x5 |
//! | 10 | issue x5 |
//! | 2 | finalize |
//! | 1 | schedule-release |
//! | 1 | report |

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use genesis_orchestrator::domain::OperationKind;
    use genesis_orchestrator::ports::outbound::CredentialProvider;
    use genesis_orchestrator::{GenesisError, Step};

    use crate::harness::{CrashingStore, Workspace, FUNDING};

    const FULL_RUN_WRITES: usize = 27;

    /// Supply, authority and every holding match configuration exactly.
    fn assert_distribution_exact(workspace: &Workspace) {
        let ledger = workspace.open_ledger();
        let checkpoint = workspace.checkpoint().expect("checkpoint");
        let asset = checkpoint.confirmed_asset().expect("asset");
        let account = ledger.asset(&asset.asset_id).expect("asset on ledger");

        assert_eq!(account.supply, workspace.config().total_units().unwrap());
        assert_eq!(account.mint_authority, None);
        for allocation in workspace.config().allocations() {
            let recipient = checkpoint
                .confirmed_recipient(&allocation.category)
                .expect("recipient");
            let holding = ledger
                .holding(&recipient.holding_account)
                .expect("holding on ledger");
            assert_eq!(holding.amount, allocation.quantity, "{}", allocation.category);
        }
    }

    #[tokio::test]
    async fn test_crash_at_every_checkpoint_write() {
        for writes in 0..FULL_RUN_WRITES {
            let workspace = Workspace::funded();
            let crashing = Arc::new(CrashingStore::new(workspace.checkpoint_store(), writes));

            let err = workspace
                .orchestrator_with_store(workspace.open_ledger(), crashing)
                .run()
                .await
                .unwrap_err();
            assert!(
                matches!(err, GenesisError::Storage { .. }),
                "crash after {writes} writes surfaced as {err}"
            );

            workspace
                .orchestrator(workspace.open_ledger())
                .run()
                .await
                .unwrap_or_else(|e| panic!("resume after {writes} writes failed: {e}"));
            assert_distribution_exact(&workspace);
        }
    }

    #[tokio::test]
    async fn test_crash_between_submit_and_record_does_not_reissue() {
        let workspace = Workspace::funded();
        // run created, asset x2, provision x10, issue[community] pending
        let crashing = Arc::new(CrashingStore::new(workspace.checkpoint_store(), 14));
        assert!(workspace
            .orchestrator_with_store(workspace.open_ledger(), crashing)
            .run()
            .await
            .is_err());

        let checkpoint = workspace.checkpoint().unwrap();
        assert!(checkpoint
            .pending_tx(&Step::Issue("community".into()))
            .is_some());

        let ledger = workspace.open_ledger();
        workspace.orchestrator(ledger.clone()).run().await.unwrap();
        // community was recovered from its pending record, not resubmitted
        assert_eq!(ledger.submission_count(OperationKind::Issue), 4);
        assert_distribution_exact(&workspace);
    }

    #[tokio::test]
    async fn test_confirmation_observed_after_restart() {
        let workspace = Workspace::funded();
        let ledger = workspace.open_ledger();
        ledger.withhold_next(OperationKind::Issue, u32::MAX);

        let err = workspace.orchestrator(ledger).run().await.unwrap_err();
        assert!(matches!(err, GenesisError::ConfirmationTimeout { .. }));
        assert!(err.is_retryable());

        // the withheld confirmation is visible to a fresh connection
        let ledger = workspace.open_ledger();
        workspace.orchestrator(ledger.clone()).run().await.unwrap();
        assert_eq!(ledger.submission_count(OperationKind::Issue), 4);
        assert_distribution_exact(&workspace);
    }

    #[tokio::test]
    async fn test_dropped_submission_resubmitted_after_restart() {
        let workspace = Workspace::funded();
        let ledger = workspace.open_ledger();
        ledger.lose_next(OperationKind::DefineAsset);

        let err = workspace.orchestrator(ledger).run().await.unwrap_err();
        assert!(matches!(
            err,
            GenesisError::ConfirmationTimeout {
                step: Step::AssetInit,
                ..
            }
        ));

        let ledger = workspace.open_ledger();
        workspace.orchestrator(ledger.clone()).run().await.unwrap();
        assert_eq!(ledger.submission_count(OperationKind::DefineAsset), 1);
        assert_distribution_exact(&workspace);
    }

    #[tokio::test]
    async fn test_recipient_identities_survive_restart() {
        let workspace = Workspace::funded();
        let ledger = workspace.open_ledger();
        ledger.reject_after(OperationKind::CreateHoldingAccount, 3, "node busy");
        assert!(workspace.orchestrator(ledger).run().await.is_err());

        let before = workspace.checkpoint().unwrap();
        workspace
            .orchestrator(workspace.open_ledger())
            .run()
            .await
            .unwrap();
        let after = workspace.checkpoint().unwrap();

        let credentials = workspace.credentials();
        for category in ["community", "team", "treasury"] {
            let recorded = before.confirmed_recipient(category).unwrap().public_identity;
            assert_eq!(
                after.confirmed_recipient(category).unwrap().public_identity,
                recorded
            );
            assert_eq!(
                credentials
                    .peek_identity(&format!("recipient-{category}"))
                    .unwrap(),
                Some(recorded)
            );
        }
    }

    #[tokio::test]
    async fn test_insufficient_funding_resumes_after_top_up() {
        let workspace = Workspace::standard();
        // covers asset creation and two holding accounts only
        workspace.fund_controller(1_466_600 + 2 * 2_044_280);

        let err = workspace
            .orchestrator(workspace.open_ledger())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenesisError::InsufficientFunding { ref step, .. } if *step == Step::Provision("treasury".into())
        ));

        workspace.fund_controller(FUNDING);
        workspace
            .orchestrator(workspace.open_ledger())
            .run()
            .await
            .unwrap();
        assert_distribution_exact(&workspace);
    }
}
