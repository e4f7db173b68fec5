//! Restart behavior: the file store reloads every match record, and render
//! events flow to subscribers.

use skirmish_core::action::{SelectMapAction, SelectSquadAction};
use skirmish_core::{Action, GamePhase, Side};
use skirmish_runtime::{Event, Runtime, RuntimeConfig, Topic};

fn file_config(dir: &std::path::Path) -> RuntimeConfig {
    RuntimeConfig {
        data_dir: Some(dir.to_path_buf()),
        in_memory: false,
        content_dir: None,
        channel_capacity: 16,
    }
}

#[tokio::test]
async fn games_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let handle = Runtime::start(file_config(dir.path())).await.unwrap();
        handle
            .create_game("persisted", "alice", "bob", Some(99))
            .await
            .unwrap();
        handle
            .submit(
                "persisted",
                Action::SelectSquad(SelectSquadAction {
                    side: Side::Red,
                    deployment: vec!["Darth Vader".into()],
                    command: vec!["Planning".into()],
                    now: 1_000,
                }),
            )
            .await
            .unwrap();
        handle.shutdown().await;
    }

    // A fresh runtime over the same directory sees the saved record,
    // including the in-flight setup state.
    let handle = Runtime::start(file_config(dir.path())).await.unwrap();
    let state = handle.query("persisted").await.unwrap();
    assert_eq!(state.game_seed, 99);
    assert_eq!(state.phase, GamePhase::Setup);
    assert!(state.player(Side::Red).squad_submitted);
    assert_eq!(state.player(Side::Red).squad[0].dc_name, "Darth Vader");

    // Creating the same game again collides.
    assert!(
        handle
            .create_game("persisted", "x", "y", None)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn log_events_reach_subscribers() {
    let handle = Runtime::start(RuntimeConfig::ephemeral()).await.unwrap();
    let mut logs = handle.subscribe(Topic::Log);

    handle.create_game("evented", "alice", "bob", Some(5)).await.unwrap();
    handle
        .submit(
            "evented",
            Action::SelectMap(SelectMapAction {
                side: Side::Red,
                map_id: "training-ground".into(),
            }),
        )
        .await
        .unwrap();

    let event = logs.recv().await.unwrap();
    let Event::Log(lines) = event else {
        panic!("expected a log event");
    };
    assert_eq!(lines.game_id, "evented");
    assert!(lines.lines.iter().any(|l| l.contains("training-ground")));
}
