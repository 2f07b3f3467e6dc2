//! Loading the admin dashboard and exporting complaints through a live session.

use std::sync::atomic::Ordering;

use dashboard::{CategoryStat, Dashboard, DashboardError, DashboardStats, Export};
use integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, RESIDENT_EMAIL, RESIDENT_PASSWORD, StubService, admin, complaint,
};
use serde_json::json;
use session::SessionStore;
use types::Role;

async fn admin_store(stub: &StubService) -> SessionStore {
    let store = SessionStore::new(stub.client());
    store.check_session().await;
    store
        .login(ADMIN_EMAIL, &ADMIN_PASSWORD.to_string().into(), Role::Admin)
        .await
        .unwrap();
    store
}

fn seed(stub: &StubService) {
    stub.state().set_complaints(vec![
        complaint("c1", "Pothole on Elm", "Roads", "Pending", "2024-02-01T08:00:00.000Z"),
        complaint("c2", "Burst main", "Water", "Completed", "2024-02-02T08:00:00.000Z"),
        complaint("c3", "Dark corner", "Lighting", "In Progress", "2024-02-03T08:00:00.000Z"),
        complaint("c4", "Crater on Oak", "Roads", "Completed", "2024-02-04T08:00:00.000Z"),
        complaint("c5", "Low pressure", "Water", "Pending", "2024-02-05T08:00:00.000Z"),
        complaint("c6", "Sinkhole", "Roads", "Pending", "2024-02-06T08:00:00.000Z"),
    ]);
    stub.state().set_user_count(json!({ "count": 42 }));
}

#[tokio::test]
async fn admin_sees_derived_dashboard() {
    let stub = StubService::spawn().await;
    seed(&stub);
    let store = admin_store(&stub).await;

    let dashboard = Dashboard::load(store.client(), &store.snapshot())
        .await
        .unwrap();

    assert_eq!(dashboard.admin, admin());
    assert_eq!(
        dashboard.stats,
        DashboardStats {
            total_complaints: 6,
            pending: 3,
            resolved: 2,
            total_users: 42,
        }
    );

    let recent: Vec<_> = dashboard.recent.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(recent, ["c6", "c5", "c4", "c3", "c2"]);

    assert_eq!(
        dashboard.top_categories,
        vec![
            CategoryStat {
                name: "Roads".into(),
                count: 3,
                percentage: 50.0,
            },
            CategoryStat {
                name: "Water".into(),
                count: 2,
                percentage: 33.3,
            },
            CategoryStat {
                name: "Lighting".into(),
                count: 1,
                percentage: 16.7,
            },
        ]
    );
}

#[tokio::test]
async fn non_admin_is_turned_away_before_fetching() {
    let stub = StubService::spawn().await;
    let store = SessionStore::new(stub.client());
    store.check_session().await;

    let anonymous = Dashboard::load(store.client(), &store.snapshot()).await;
    assert!(matches!(anonymous, Err(DashboardError::Unauthorized)));

    store
        .login(RESIDENT_EMAIL, &RESIDENT_PASSWORD.to_string().into(), Role::User)
        .await
        .unwrap();
    let resident = Dashboard::load(store.client(), &store.snapshot()).await;
    assert!(matches!(resident, Err(DashboardError::Unauthorized)));

    assert_eq!(stub.state().hits("/api/complaints/all"), 0);
}

#[tokio::test]
async fn fetch_failures_surface_one_message() {
    let stub = StubService::spawn().await;
    seed(&stub);
    let store = admin_store(&stub).await;

    stub.state().fail_user_count.store(true, Ordering::SeqCst);
    let error = Dashboard::load(store.client(), &store.snapshot())
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Failed to fetch users count");

    stub.state().fail_complaints.store(true, Ordering::SeqCst);
    let error = Dashboard::load(store.client(), &store.snapshot())
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Failed to fetch complaints");
}

#[tokio::test]
async fn export_writes_csv_file() {
    let stub = StubService::spawn().await;
    stub.state().set_complaints(vec![complaint(
        "c9",
        r#"He said "hi""#,
        "Noise",
        "Pending",
        "2024-02-07T22:00:00.000Z",
    )]);
    let store = admin_store(&stub).await;
    let dir = tempfile::tempdir().unwrap();

    let export = Export::fetch(store.client(), &store.snapshot())
        .await
        .unwrap();
    let path = export.save_in(dir.path()).await.unwrap();

    assert_eq!(export.rows, 1);
    assert!(export.file_name.starts_with("complaints-export-"));
    assert!(export.file_name.ends_with(".csv"));
    assert_eq!(path, dir.path().join(&export.file_name));

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "ID,Title,Category,Status,Priority,Created Date,User Email\n\
         c9,\"He said \"\"hi\"\"\",Noise,Pending,High,2024-02-07,resident@example.com"
    );
}
