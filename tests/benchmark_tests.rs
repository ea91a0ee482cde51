//! Performance benchmarks for critical game systems

use client::game::ClientGameState;
use server::game::GameState;
use shared::{
    decode_packet, encode_packet, Arena, AttackKind, CooldownRegistry, InputState,
    LocomotionController, MoveIntent, MovementConfig, Packet, Request, TimerKind, Vec3,
};
use std::time::Instant;

const DT: f32 = 0.02;

fn wander(sequence: u32) -> MoveIntent {
    MoveIntent {
        strafe: ((sequence % 7) as f32 - 3.0) / 3.0,
        forward: 1.0,
        sprint: sequence % 3 == 0,
        jump: sequence % 40 == 0,
        yaw: 2.0,
        pitch: 0.0,
    }
}

/// Benchmarks cooldown bookkeeping
#[test]
fn benchmark_cooldown_registry() {
    let mut registry = CooldownRegistry::new();
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        if i % 50 == 0 {
            registry.start(TimerKind::AttackCooldown, 1.0);
            registry.start(TimerKind::AttackDuration, 0.2);
        }
        let _ = registry.tick(DT);
    }

    let duration = start.elapsed();
    println!(
        "Cooldown ticks: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 500);
}

/// Benchmarks locomotion plus physics for a single body
#[test]
fn benchmark_locomotion_step() {
    let arena = Arena::default();
    let mut controller = LocomotionController::new(MovementConfig::default(), Vec3::ZERO);
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        arena.step(&mut controller, &wander(i), DT);
    }

    let duration = start.elapsed();
    println!(
        "Locomotion steps: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
    assert!(controller.state().position.x.is_finite());
}

/// Benchmarks a full lobby where everyone attacks constantly
#[test]
fn benchmark_world_step_full_lobby() {
    let mut game = GameState::new();
    for id in 1..=16 {
        game.add_player(id);
    }

    let ticks = 1_000;
    let mut messages = 0;
    let start = Instant::now();

    for tick in 0..ticks {
        for id in 1..=16 {
            let input = InputState {
                sequence: tick + 1,
                timestamp: tick as u64,
                intent: wander(tick + id),
            };
            game.apply_input(id, &input, DT);
            game.handle_request(id, Request::Attack { attack: AttackKind::Base });
        }
        messages += game.step(DT).len();
    }

    let duration = start.elapsed();
    println!(
        "World steps: {} ticks with 16 players in {:?} ({:.2} μs/tick, {} messages)",
        ticks,
        duration,
        duration.as_micros() as f64 / ticks as f64,
        messages
    );

    // A 50Hz tick has 20ms of budget
    assert!(duration.as_millis() < 5000);
    assert!(messages > 0);
}

/// Benchmarks snapshot encoding and decoding
#[test]
fn benchmark_snapshot_codec() {
    let mut game = GameState::new();
    for id in 1..=16 {
        game.add_player(id);
    }
    let packet = Packet::GameState {
        tick: 1,
        timestamp: 1,
        last_processed_input: (1..=16).map(|id| (id, 100)).collect(),
        players: game.snapshot(),
    };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let data = encode_packet(&packet).unwrap();
        let _ = decode_packet(&data).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks rollback with a full input history
#[test]
fn benchmark_reconciliation_performance() {
    let iterations = 200;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut client = ClientGameState::new(1, 50);
        for sequence in 1..=256 {
            client.apply_prediction(&InputState {
                sequence,
                timestamp: sequence as u64,
                intent: wander(sequence),
            });
        }

        // Authoritative state far away forces a full replay
        let mut server = GameState::new();
        server.spawn_player(1, Vec3::new(10.0, 0.0, -10.0));
        let acked = [(1, 0)].into_iter().collect();
        client.apply_server_state(1, &server.snapshot(), &acked);
        assert_eq!(client.rollbacks(), 1);
    }

    let duration = start.elapsed();
    println!(
        "Reconciliation: {} full replays in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 5000);
}
