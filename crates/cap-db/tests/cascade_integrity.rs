//! End-to-end integrity checks against a real libSQL database: cascades,
//! compensation, rename propagation, concurrency and the activity log.

use cap_core::entities::{
    NewAllocation, NewInvestor, NewProject, NewRedemption, NewSignatory, NewSubscription, NewWallet,
};
use cap_core::enums::{ActivityStatus, EntityKind, Permission, Role};
use cap_core::identity::{Actor, Capability, EntityRef, Scope};
use cap_db::error::DatabaseError;
use cap_db::repos::activity::ActivityQuery;
use cap_db::service::CapService;
use cap_db::updates::project::ProjectUpdateBuilder;
use pretty_assertions::assert_eq;

fn admin() -> Actor {
    Actor::new("usr-admin", "admin@example.com", Role::Admin)
}

fn cap(permission: Permission, kind: EntityKind) -> Capability {
    admin().grant(permission, Scope::Kind(kind)).unwrap()
}

async fn memory_service() -> CapService {
    CapService::new_local(":memory:").await.unwrap()
}

async fn count(svc: &CapService, table: &str) -> i64 {
    let mut rows = svc
        .db()
        .conn()
        .query(&format!("SELECT COUNT(*) FROM {table}"), ())
        .await
        .unwrap();
    rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
}

/// One project with two subscribed investors, each with an allocation.
/// Returns `(project_id, [investor_ids])`.
async fn seeded_project(svc: &CapService, name: &str) -> (String, Vec<String>) {
    let (project, _) = svc
        .create_project(
            &cap(Permission::Create, EntityKind::Project),
            NewProject::draft(name, "token"),
        )
        .await
        .unwrap();
    let mut investors = Vec::new();
    for (i, investor_name) in ["Ada", "Grace"].iter().enumerate() {
        let investor = svc
            .create_investor(
                &cap(Permission::Create, EntityKind::Investor),
                NewInvestor::individual(
                    *investor_name,
                    format!("{}-{name}@example.com", investor_name.to_lowercase()),
                ),
            )
            .await
            .unwrap();
        let subscription = svc
            .add_investor_to_project(
                &cap(Permission::Create, EntityKind::Subscription),
                &project.id,
                &investor.id,
                NewSubscription::new(format!("SA-{i}"), "EUR", 1_000.0),
            )
            .await
            .unwrap();
        svc.add_token_allocation(
            &cap(Permission::Create, EntityKind::TokenAllocation),
            &subscription.id,
            NewAllocation::undistributed(100.0, "AUR"),
        )
        .await
        .unwrap();
        investors.push(investor.id);
    }
    (project.id, investors)
}

#[tokio::test]
async fn project_cascade_leaves_no_dependent_rows() {
    let svc = memory_service().await;
    let (project_id, investors) = seeded_project(&svc, "Aurora").await;
    let (other_id, _) = seeded_project(&svc, "Borealis").await;

    let report = svc
        .delete_project(&cap(Permission::Delete, EntityKind::Project), &project_id)
        .await
        .unwrap();
    assert_eq!(report.rows_deleted("projects"), 1);
    assert_eq!(report.rows_deleted("subscriptions"), 2);
    assert_eq!(report.rows_deleted("token_allocations"), 2);
    assert_eq!(report.rows_deleted("cap_table_investors"), 2);
    assert_eq!(report.rows_deleted("cap_tables"), 1);
    assert!(report.skipped.is_empty());

    assert!(matches!(
        svc.get_project(&project_id).await,
        Err(DatabaseError::NotFound { .. })
    ));
    assert!(svc.list_project_subscriptions(&project_id).await.unwrap().is_empty());

    // Investors survive a project delete; the other project is untouched.
    for id in &investors {
        svc.get_investor(id).await.unwrap();
    }
    assert_eq!(svc.list_project_subscriptions(&other_id).await.unwrap().len(), 2);
    assert_eq!(count(&svc, "cap_tables").await, 1);
    assert_eq!(count(&svc, "token_allocations").await, 2);
}

#[tokio::test]
async fn investor_cascade_removes_links_and_requests() {
    let svc = memory_service().await;
    let (project_id, investors) = seeded_project(&svc, "Aurora").await;
    let ada = &investors[0];

    let group = svc
        .create_investor_group(&cap(Permission::Create, EntityKind::InvestorGroup), "Syndicate")
        .await
        .unwrap();
    svc.add_investor_to_group(
        &cap(Permission::Update, EntityKind::InvestorGroup),
        &group.id,
        ada,
    )
    .await
    .unwrap();
    let request = svc
        .create_redemption_request(
            &cap(Permission::Create, EntityKind::RedemptionRequest),
            ada,
            NewRedemption {
                token_amount: 10.0,
                token_type: "AUR".into(),
            },
        )
        .await
        .unwrap();
    svc.add_redemption_approver(
        &cap(Permission::Update, EntityKind::RedemptionRequest),
        &request.id,
        "usr-cfo",
    )
    .await
    .unwrap();

    let report = svc
        .delete_investor(&cap(Permission::Delete, EntityKind::Investor), ada)
        .await
        .unwrap();
    assert_eq!(report.rows_deleted("investors"), 1);
    assert_eq!(report.rows_deleted("redemption_approvers"), 1);
    assert_eq!(report.rows_deleted("redemption_requests"), 1);
    assert_eq!(report.rows_deleted("investor_groups_investors"), 1);

    assert!(svc.list_group_members(&group.id).await.unwrap().is_empty());
    let remaining = svc.list_project_investors(&project_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(&remaining[0].id, &investors[1]);
    assert_eq!(count(&svc, "subscriptions").await, 1);
    assert_eq!(count(&svc, "token_allocations").await, 1);
}

#[tokio::test]
async fn duplicate_project_name_writes_nothing() {
    let svc = memory_service().await;
    let create = cap(Permission::Create, EntityKind::Project);
    svc.create_project(&create, NewProject::draft("Aurora", "token"))
        .await
        .unwrap();

    let err = svc
        .create_project(&create, NewProject::draft("Aurora", "equity"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateName { ref name } if name == "Aurora"));
    assert_eq!(count(&svc, "projects").await, 1);
    assert_eq!(count(&svc, "cap_tables").await, 1);
}

#[tokio::test]
async fn failed_cap_table_insert_rolls_back_project() {
    let svc = memory_service().await;
    svc.db()
        .conn()
        .execute(
            "CREATE TRIGGER reject_cap_tables BEFORE INSERT ON cap_tables
             BEGIN SELECT RAISE(ABORT, 'cap tables disabled'); END",
            (),
        )
        .await
        .unwrap();

    let result = svc
        .create_project(
            &cap(Permission::Create, EntityKind::Project),
            NewProject::draft("Aurora", "token"),
        )
        .await;
    assert!(result.is_err());
    assert_eq!(count(&svc, "projects").await, 0);
    assert_eq!(count(&svc, "cap_tables").await, 0);
}

#[tokio::test]
async fn rename_updates_only_the_default_cap_table_name() {
    let svc = memory_service().await;
    let create = cap(Permission::Create, EntityKind::Project);
    let update = cap(Permission::Update, EntityKind::Project);
    let (aurora, _) = svc
        .create_project(&create, NewProject::draft("Aurora", "token"))
        .await
        .unwrap();
    let (borealis, custom) = svc
        .create_project(&create, NewProject::draft("Borealis", "token"))
        .await
        .unwrap();
    svc.db()
        .conn()
        .execute(
            "UPDATE cap_tables SET name = 'Series A ledger' WHERE id = ?1",
            [custom.id.as_str()],
        )
        .await
        .unwrap();

    svc.update_project(
        &update,
        &aurora.id,
        ProjectUpdateBuilder::new().name("Aurora Prime").build(),
    )
    .await
    .unwrap();
    svc.update_project(
        &update,
        &borealis.id,
        ProjectUpdateBuilder::new().name("Borealis Two").build(),
    )
    .await
    .unwrap();

    let renamed = svc.get_project_cap_table(&aurora.id).await.unwrap();
    assert_eq!(renamed.name, "Cap Table - Aurora Prime");
    let untouched = svc.get_project_cap_table(&borealis.id).await.unwrap();
    assert_eq!(untouched.name, "Series A ledger");
}

#[tokio::test]
async fn concurrent_deletes_of_one_investor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("captable.db");
    let path = path.to_str().unwrap();
    let first = CapService::new_local(path).await.unwrap();
    let second = CapService::new_local(path).await.unwrap();
    let (_, investors) = seeded_project(&first, "Aurora").await;
    let target = investors[0].clone();
    let delete = cap(Permission::Delete, EntityKind::Investor);

    let (a, b) = tokio::join!(
        first.delete_investor(&delete, &target),
        second.delete_investor(&delete, &target)
    );
    let outcomes = [a, b];
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for outcome in &outcomes {
        if let Err(error) = outcome {
            assert!(
                matches!(
                    error,
                    DatabaseError::NotFound { .. } | DatabaseError::Backend(_)
                ),
                "unexpected error: {error}"
            );
        }
    }

    assert!(matches!(
        first.get_investor(&target).await,
        Err(DatabaseError::NotFound { .. })
    ));
    assert_eq!(count(&first, "subscriptions").await, 1);
    assert_eq!(count(&first, "cap_table_investors").await, 1);
}

#[tokio::test]
async fn best_effort_failure_does_not_block_investor_delete() {
    let svc = memory_service().await;
    let investor = svc
        .create_investor(
            &cap(Permission::Create, EntityKind::Investor),
            NewInvestor::individual("Ada", "ada@example.com"),
        )
        .await
        .unwrap();
    svc.create_redemption_request(
        &cap(Permission::Create, EntityKind::RedemptionRequest),
        &investor.id,
        NewRedemption {
            token_amount: 5.0,
            token_type: "AUR".into(),
        },
    )
    .await
    .unwrap();
    svc.db()
        .conn()
        .execute("DROP TABLE redemption_approvers", ())
        .await
        .unwrap();

    let report = svc
        .delete_investor(&cap(Permission::Delete, EntityKind::Investor), &investor.id)
        .await
        .unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].table, "redemption_approvers");
    assert_eq!(report.rows_deleted("redemption_requests"), 1);
    assert_eq!(report.rows_deleted("investors"), 1);
    assert_eq!(count(&svc, "investors").await, 0);
}

#[tokio::test]
async fn fatal_failure_rolls_back_and_logs_failure() {
    let svc = memory_service().await;
    let (_, investors) = seeded_project(&svc, "Aurora").await;
    let ada = &investors[0];
    svc.create_redemption_request(
        &cap(Permission::Create, EntityKind::RedemptionRequest),
        ada,
        NewRedemption {
            token_amount: 5.0,
            token_type: "AUR".into(),
        },
    )
    .await
    .unwrap();
    svc.db()
        .conn()
        .execute(
            "CREATE TRIGGER keep_redemptions BEFORE DELETE ON redemption_requests
             BEGIN SELECT RAISE(ABORT, 'redemptions are retained'); END",
            (),
        )
        .await
        .unwrap();

    // The redemption step is skipped, so the investor row is still
    // referenced and its delete violates the foreign key.
    let err = svc
        .delete_investor(&cap(Permission::Delete, EntityKind::Investor), ada)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Backend(_)));

    svc.get_investor(ada).await.unwrap();
    assert_eq!(count(&svc, "subscriptions").await, 2);
    assert_eq!(count(&svc, "token_allocations").await, 2);
    assert_eq!(count(&svc, "cap_table_investors").await, 2);

    let failures = svc
        .list_activity(&ActivityQuery {
            status: Some(ActivityStatus::Failure),
            page: 1,
            page_size: 20,
            ..ActivityQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(failures.entries.len(), 1);
    assert_eq!(failures.entries[0].action, "delete_investors");
    assert_eq!(failures.entries[0].entity_id.as_deref(), Some(ada.as_str()));
}

#[tokio::test]
async fn activity_rows_are_immutable() {
    let svc = memory_service().await;
    seeded_project(&svc, "Aurora").await;
    let before = count(&svc, "audit_logs").await;
    assert!(before > 0);

    let conn = svc.db().conn();
    assert!(conn.execute("UPDATE audit_logs SET action = 'tampered'", ()).await.is_err());
    assert!(conn.execute("DELETE FROM audit_logs", ()).await.is_err());
    assert_eq!(count(&svc, "audit_logs").await, before);
}

#[tokio::test]
async fn capabilities_are_enforced() {
    let svc = memory_service().await;
    let (aurora, _) = seeded_project(&svc, "Aurora").await;
    let (borealis, _) = seeded_project(&svc, "Borealis").await;

    let viewer = Actor::new("usr-view", "viewer@example.com", Role::Viewer);
    assert!(viewer
        .grant(Permission::Delete, Scope::Kind(EntityKind::Project))
        .is_err());

    let manager = Actor::new("usr-mgr", "manager@example.com", Role::Manager);
    assert!(manager
        .grant(Permission::Delete, Scope::Entity(EntityRef::project(&aurora)))
        .is_err());

    let only_aurora = admin()
        .grant(Permission::Delete, Scope::Entity(EntityRef::project(&aurora)))
        .unwrap();
    let err = svc.delete_project(&only_aurora, &borealis).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Forbidden(_)));
    svc.get_project(&borealis).await.unwrap();

    // A row-scoped capability cannot create.
    let err = svc
        .create_project(
            &admin()
                .grant(Permission::Create, Scope::Entity(EntityRef::project(&aurora)))
                .unwrap(),
            NewProject::draft("Cygnus", "token"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Forbidden(_)));

    svc.delete_project(&only_aurora, &aurora).await.unwrap();
    assert_eq!(count(&svc, "projects").await, 1);
}

#[tokio::test]
async fn wallet_cascade_leaves_other_wallets_alone() {
    let svc = memory_service().await;
    let create = cap(Permission::Create, EntityKind::MultiSigWallet);
    let update = cap(Permission::Update, EntityKind::MultiSigWallet);

    let treasury = svc
        .create_wallet(&create, NewWallet::new("0xaaa", "Treasury"))
        .await
        .unwrap();
    let ops = svc
        .create_wallet(&create, NewWallet::new("0xbbb", "Operations"))
        .await
        .unwrap();
    for wallet in [&treasury, &ops] {
        svc.add_signatory(
            &update,
            &wallet.id,
            NewSignatory {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role: "owner".into(),
            },
        )
        .await
        .unwrap();
        svc.add_to_whitelist(&update, &wallet.id, "0xccc", Some("Exchange"))
            .await
            .unwrap();
    }

    let report = svc
        .delete_wallet(&cap(Permission::Delete, EntityKind::MultiSigWallet), &treasury.id)
        .await
        .unwrap();
    assert_eq!(report.rows_deleted("multi_sig_wallets"), 1);
    assert_eq!(report.rows_deleted("wallet_signatories"), 1);
    assert_eq!(report.rows_deleted("wallet_whitelist"), 1);

    assert!(matches!(
        svc.get_wallet(&treasury.id).await.unwrap_err(),
        DatabaseError::NotFound { .. }
    ));
    assert_eq!(svc.list_signatories(&ops.id).await.unwrap().len(), 1);
    assert_eq!(svc.list_whitelist(&ops.id).await.unwrap().len(), 1);
    assert_eq!(count(&svc, "wallet_signatories").await, 1);
}
