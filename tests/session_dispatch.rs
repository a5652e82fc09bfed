//! Client messages through the room session, including the wire codec

use std::sync::Arc;

use chase_arena_server::game::state::{EntityId, Phase};
use chase_arena_server::game::systems::movement::{Direction, DirectionSet};
use chase_arena_server::lobby::manager::{DirectoryError, RoomDirectory};
use chase_arena_server::metrics::Metrics;
use chase_arena_server::net::framing::{read_frame, write_frame};
use chase_arena_server::net::outbox::Outbox;
use chase_arena_server::net::protocol::{decode, encode, ClientMessage, ServerMessage};
use chase_arena_server::net::room_session::{Delivery, RoomSession};
use uuid::Uuid;

fn join(room_id: &str, name: &str) -> ClientMessage {
    ClientMessage::JoinRoom {
        room_id: room_id.to_string(),
        player_name: name.to_string(),
    }
}

fn send(session: &RoomSession, id: EntityId, message: ClientMessage) -> Vec<Delivery> {
    let mut out = Vec::new();
    session.handle(id, message, 0, |d| out.push(d));
    out
}

fn step(direction: Direction) -> ClientMessage {
    ClientMessage::Move {
        directions: DirectionSet::single(direction),
    }
}

#[test]
fn full_round_over_the_session() {
    let metrics = Arc::new(Metrics::new());
    let session = RoomSession::new(RoomDirectory::new(10, 8, false), metrics.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    send(&session, alice, join("ABC123", "Alice"));
    send(&session, bob, join("ABC123", "Bob"));
    send(&session, alice, ClientMessage::SetChaser { entity_id: None });

    let started = send(&session, bob, ClientMessage::StartGame);
    assert!(matches!(started[0].message, ServerMessage::GameStarted(_)));

    // Bob walks into Alice's row, Alice walks into Bob
    for _ in 0..100 {
        send(&session, bob, step(Direction::Left));
    }
    for _ in 0..40 {
        send(&session, bob, step(Direction::Down));
    }
    let mut last = Vec::new();
    for _ in 0..200 {
        let out = send(&session, alice, step(Direction::Right));
        if out.is_empty() {
            break;
        }
        last = out;
    }

    match &last[0].message {
        ServerMessage::GameUpdated(snapshot) => {
            assert_eq!(snapshot.phase, Phase::Finished);
            assert!(snapshot.entity(bob).unwrap().is_caught);
        }
        other => panic!("unexpected {:?}", other),
    }

    use std::sync::atomic::Ordering;
    assert_eq!(metrics.rounds_started.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.rounds_finished.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.captures.load(Ordering::Relaxed), 1);
}

#[test]
fn late_joiner_keeps_the_round_alive() {
    let session = RoomSession::new(RoomDirectory::new(10, 8, false), Arc::new(Metrics::new()));
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let dave = Uuid::new_v4();

    send(&session, alice, join("ABC123", "Alice"));
    send(&session, bob, join("ABC123", "Bob"));
    send(&session, alice, ClientMessage::SetChaser { entity_id: None });
    send(&session, alice, ClientMessage::StartGame);
    send(&session, dave, join("ABC123", "Dave"));

    let out = send(&session, dave, step(Direction::Right));
    match &out[0].message {
        ServerMessage::GameUpdated(snapshot) => {
            let dave = snapshot.entity(dave).unwrap();
            assert_eq!((dave.position.x, dave.position.y), (20.0, 20.0));
        }
        other => panic!("unexpected {:?}", other),
    }

    let out = send(&session, bob, ClientMessage::Leave);
    match &out[0].message {
        ServerMessage::RoomUpdated(snapshot) => assert_eq!(snapshot.phase, Phase::Playing),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rejected_joins_report_reason() {
    let session = RoomSession::new(RoomDirectory::new(1, 2, false), Arc::new(Metrics::new()));

    send(&session, Uuid::new_v4(), join("R1", "A"));
    send(&session, Uuid::new_v4(), join("R1", "B"));

    let out = send(&session, Uuid::new_v4(), join("R1", "C"));
    assert_eq!(
        out[0].message,
        ServerMessage::JoinRejected { reason: DirectoryError::RoomFull.to_string() }
    );

    let out = send(&session, Uuid::new_v4(), join("R2", "D"));
    assert_eq!(
        out[0].message,
        ServerMessage::JoinRejected { reason: DirectoryError::TooManyRooms.to_string() }
    );

    let out = send(&session, Uuid::new_v4(), join("no spaces", "E"));
    assert_eq!(
        out[0].message,
        ServerMessage::JoinRejected { reason: DirectoryError::InvalidRoomId.to_string() }
    );
}

#[test]
fn rooms_do_not_leak_into_each_other() {
    let session = RoomSession::new(RoomDirectory::default(), Arc::new(Metrics::new()));
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    send(&session, a, join("AAA", "a"));
    send(&session, b, join("BBB", "b"));

    let out = send(&session, a, ClientMessage::SetEmoji { emoji: "🐸".to_string() });
    assert_eq!(out[0].to, vec![a]);
    assert_eq!(session.directory().room_count(), 2);
}

#[tokio::test]
async fn deliveries_survive_the_wire() {
    let session = RoomSession::new(RoomDirectory::default(), Arc::new(Metrics::new()));
    let outbox = Outbox::new();
    let alice = Uuid::new_v4();
    let mut queue = outbox.register(alice);

    let mut inbound = Vec::new();
    write_frame(&mut inbound, &encode(&join("ABC123", "Alice")).unwrap())
        .await
        .unwrap();
    let mut cursor = std::io::Cursor::new(inbound);
    let message: ClientMessage = decode(&read_frame(&mut cursor).await.unwrap()).unwrap();

    session.handle(alice, message, 0, |d| {
        outbox.push(d);
    });

    let mut outbound = Vec::new();
    while let Ok(frame) = queue.try_recv() {
        write_frame(&mut outbound, &frame).await.unwrap();
    }

    let mut cursor = std::io::Cursor::new(outbound);
    let first: ServerMessage = decode(&read_frame(&mut cursor).await.unwrap()).unwrap();
    match first {
        ServerMessage::Joined { entity, room } => {
            assert_eq!(entity.id, alice);
            assert_eq!(entity.name, "Alice");
            assert_eq!(room.room_id, "ABC123");
        }
        other => panic!("unexpected {:?}", other),
    }
    let second: ServerMessage = decode(&read_frame(&mut cursor).await.unwrap()).unwrap();
    assert!(matches!(second, ServerMessage::RoomUpdated(_)));
}
