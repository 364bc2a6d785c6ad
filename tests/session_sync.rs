//! Two sessions sharing one room through the in-memory store

use std::sync::Arc;
use std::time::Duration;

use arena_sync::app::{GameSession, SessionCommand, SessionHandle};
use arena_sync::config::Config;
use arena_sync::game::{ItemKind, WeaponKey};
use arena_sync::input::InputEvent;
use arena_sync::store::{DocumentStore, InMemoryStore};
use arena_sync::sync::{room_path, RoomDoc};
use tokio::task::JoinHandle;
use tokio_test::assert_ok;
use uuid::Uuid;

fn config(player_id: Uuid, name: &str, seed: u64) -> Config {
    let player_id = player_id.to_string();
    let name = name.to_string();
    let seed = seed.to_string();
    Config::from_lookup(move |key| match key {
        "ROOM_CODE" => Some("ITEST".to_string()),
        "APP_ID" => Some("test-app".to_string()),
        "PLAYER_ID" => Some(player_id.clone()),
        "PLAYER_NAME" => Some(name.clone()),
        "WORLD_SEED" => Some(seed.clone()),
        "SIM_TPS" => Some("100".to_string()),
        "OBSTACLE_COUNT" => Some("0".to_string()),
        _ => None,
    })
    .unwrap()
}

async fn launch(store: &Arc<dyn DocumentStore>, id: Uuid, name: &str, seed: u64) -> (SessionHandle, JoinHandle<()>) {
    let (mut session, handle) = GameSession::new(&config(id, name, seed), Some(store.clone()));
    assert_ok!(session.connect().await);
    (handle, tokio::spawn(session.run()))
}

fn latest_remote_ids(handle: &SessionHandle) -> Vec<Uuid> {
    handle
        .frames
        .borrow()
        .as_ref()
        .map(|frame| frame.remote.iter().map(|actor| actor.id).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn sessions_see_each_other_and_share_items() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (alice_handle, alice_task) = launch(&store, alice, "Alice", 1).await;
    let (bob_handle, bob_task) = launch(&store, bob, "Bob", 2).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(latest_remote_ids(&alice_handle), vec![bob]);
    assert_eq!(latest_remote_ids(&bob_handle), vec![alice]);

    let raw = assert_ok!(store.get(&room_path("test-app", "ITEST")).await).unwrap();
    let room: RoomDoc = serde_json::from_value(raw).unwrap();
    assert_eq!(room.host_id, Some(alice.to_string()));
    assert_eq!(room.players.len(), 2);

    // Alice drops her sword; Bob's next frames show it on the floor
    assert_ok!(
        alice_handle
            .commands
            .send(SessionCommand::Input(InputEvent::MouseDown { button: 0 }))
            .await
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    {
        let frame = bob_handle.frames.borrow();
        let items = &frame.as_ref().unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item, ItemKind::Weapon(WeaponKey::Sword));
    }

    // Alice leaves; her slot is removed and Bob stops seeing her
    assert_ok!(alice_handle.commands.send(SessionCommand::Stop).await);
    assert_ok!(alice_task.await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(latest_remote_ids(&bob_handle).is_empty());

    assert_ok!(bob_handle.commands.send(SessionCommand::Stop).await);
    assert_ok!(bob_task.await);
}
