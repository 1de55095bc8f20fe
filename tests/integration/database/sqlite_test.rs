//! Migrations and persistence across restarts

use sqlx::Row;
use tempfile::TempDir;

use studyhub::backend::ledger::MembershipLedger;
use studyhub::backend::messages::MessageLog;
use studyhub::backend::rooms::RoomRegistry;
use studyhub::backend::storage::{SqliteStorage, Stores};
use studyhub::shared::{GroupAttrs, GroupKind, NewMessage};

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("studyhub.db").display())
}

#[tokio::test]
async fn test_migrations_create_schema() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let tables: Vec<String> = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(storage.pool())
        .await
        .unwrap()
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    for table in ["group_members", "groups", "messages", "rooms"] {
        assert!(tables.iter().any(|t| t == table), "missing table {table}: {tables:?}");
    }
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let (group_id, room_id) = {
        let stores = Stores::sqlite(SqliteStorage::connect(&database_url(&dir)).await.unwrap());
        let ledger = MembershipLedger::new(stores.groups.clone());
        let rooms = RoomRegistry::new(stores.rooms.clone(), stores.groups.clone());
        let log = MessageLog::new(stores.rooms.clone(), stores.messages.clone(), 100);

        let attrs = GroupAttrs {
            title: "Thesis Writing".into(),
            ..Default::default()
        };
        let group = ledger.create("owner", GroupKind::ChatGroup, 4, attrs).await.unwrap();
        ledger.join(group.id, "member").await.unwrap();
        let room = rooms.resolve_group_room(group.id).await.unwrap();
        log.append(NewMessage::new(room.id.clone(), "member", "first draft is up"))
            .await
            .unwrap();
        (group.id, room.id)
    };

    let stores = Stores::sqlite(SqliteStorage::connect(&database_url(&dir)).await.unwrap());
    let ledger = MembershipLedger::new(stores.groups.clone());
    let log = MessageLog::new(stores.rooms.clone(), stores.messages.clone(), 100);

    let group = ledger.get(group_id).await.unwrap();
    assert_eq!(group.member_ids(), vec!["owner", "member"]);

    let history = log.history(&room_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "first draft is up");

    let next = log
        .append(NewMessage::new(room_id.clone(), "owner", "reading it now"))
        .await
        .unwrap();
    assert_eq!(next.seq, 2);
}
