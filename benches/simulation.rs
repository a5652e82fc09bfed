//! Simulation benchmarks for the chase arena server
//!
//! Measures the hot paths of a round: obstacle layout, move resolution,
//! capture checks and opponent controller updates.
//!
//! Run with: cargo bench --bench simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chase_arena_server::game::constants::movement::BASE_SPEED;
use chase_arena_server::game::constants::obstacles::COUNT;
use chase_arena_server::game::state::{Board, Entity, Role};
use chase_arena_server::game::systems::ai::{Difficulty, OpponentController};
use chase_arena_server::game::systems::capture::detect_captures;
use chase_arena_server::game::systems::movement::{resolve_move, Direction, DirectionSet};
use chase_arena_server::game::systems::obstacles::generate;
use chase_arena_server::lobby::room::GameRoom;
use chase_arena_server::util::vec2::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Spawn-like positions: one chaser on the left, the rest in a column on the right
fn spawn_positions(count: usize) -> Vec<Vec2> {
    let mut positions = vec![Vec2::new(50.0, 300.0)];
    positions.extend((1..count).map(|i| Vec2::new(700.0, 100.0 + 80.0 * (i - 1) as f32)));
    positions
}

/// Benchmark obstacle layout (placement plus path guarantee)
fn bench_obstacle_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("obstacles");
    group.sample_size(50);
    let board = Board::default();

    for count in [2, 4, 8] {
        let positions = spawn_positions(count);
        let mut rng = StdRng::seed_from_u64(42);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("generate", count), &count, |b, _| {
            b.iter(|| black_box(generate(&board, &positions, COUNT, &mut rng)))
        });
    }
    group.finish();
}

/// Benchmark move resolution against a full obstacle layout
fn bench_resolve_move(c: &mut Criterion) {
    let board = Board::default();
    let mut rng = StdRng::seed_from_u64(7);
    let obstacles = generate(&board, &spawn_positions(2), COUNT, &mut rng);
    let directions = DirectionSet::single(Direction::Up).with(Direction::Left);

    c.bench_function("resolve_move/diagonal", |b| {
        b.iter(|| {
            black_box(resolve_move(
                black_box(Vec2::new(400.0, 300.0)),
                directions,
                BASE_SPEED,
                &board,
                &obstacles,
            ))
        })
    });
}

/// Benchmark capture detection at full rooms
fn bench_captures(c: &mut Criterion) {
    let mut entities: Vec<Entity> = spawn_positions(8)
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let mut entity = Entity::new(Uuid::new_v4(), format!("P{}", i));
            entity.position = position;
            if i == 0 {
                entity.role = Role::Chaser;
            }
            entity
        })
        .collect();

    c.bench_function("captures/full_room", |b| {
        b.iter(|| black_box(detect_captures(&mut entities)))
    });
}

/// Benchmark one controller reconsideration per difficulty
fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller");
    let board = Board::default();

    for difficulty in Difficulty::ALL {
        for role in [Role::Chaser, Role::Chased] {
            let mut controller = OpponentController::new(role, difficulty);
            let mut rng = StdRng::seed_from_u64(3);
            let mut now = 0u64;

            group.bench_function(format!("{:?}/{:?}", difficulty, role), |b| {
                b.iter(|| {
                    // Step past the reaction interval so every call decides
                    now += 1_000;
                    let me = Vec2::new(rng.gen_range(20.0..780.0), rng.gen_range(20.0..580.0));
                    black_box(controller.update(now, me, Vec2::new(400.0, 300.0), &board, &mut rng))
                })
            });
        }
    }
    group.finish();
}

/// Benchmark a whole accepted move through the room (resolve + capture + game over)
fn bench_room_move(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let mut room = GameRoom::new("BENCH", 8, true);
    let chaser = Uuid::new_v4();
    room.join(chaser, "Chaser").ok();
    room.join(Uuid::new_v4(), "Runner").ok();
    room.set_chaser(chaser);
    room.start_with_rng(&mut rng).ok();

    let up = DirectionSet::single(Direction::Up);
    let down = DirectionSet::single(Direction::Down);
    let mut flip = false;

    c.bench_function("room/apply_move", |b| {
        b.iter(|| {
            flip = !flip;
            black_box(room.apply_move(chaser, if flip { up } else { down }))
        })
    });
}

criterion_group!(
    benches,
    bench_obstacle_generation,
    bench_resolve_move,
    bench_captures,
    bench_controller,
    bench_room_move,
);

criterion_main!(benches);
