use std::env;

use gears_dashboard::db::Database;
use gears_dashboard::models::{MentorInput, StudentInput, TeamInput};
use gears_dashboard::store::RecordStore;

/// Integration smoke test for the record store.
/// Marked ignored so it never runs against a real database by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn team_delete_detaches_members_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let store = RecordStore::new(db.pool.clone());

    let team = store
        .create_team(&TeamInput {
            name: "Smoke Test Team".to_string(),
            team_number: Some(9999),
            program: "FLL".to_string(),
            archived: false,
            hall_of_fame: false,
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mentor = store
        .create_mentor(&MentorInput {
            first_name: "Pat".to_string(),
            last_name: "Ng".to_string(),
            email: "pat@example.org".to_string(),
            phone: String::new(),
            address: String::new(),
            notes: String::new(),
            team_id: Some(team.id),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let student = store
        .create_student(&StudentInput {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            grade: Some(5),
            team_id: Some(team.id),
            customer_id: Some("58".to_string()),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    store
        .delete_team(team.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mentor = store
        .get_mentor(mentor.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let student = store
        .get_student(student.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(mentor.team_id, None);
    assert_eq!(student.team_id, None);

    let linked = store
        .students_for_customer("58")
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(linked.iter().any(|s| s.id == student.id));

    store
        .delete_mentor(mentor.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    store
        .delete_student(student.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(store.get_student(student.id).await.is_err());
    Ok(())
}
