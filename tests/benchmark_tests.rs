//! Performance benchmarks for critical simulation and sync paths

use client::sync::{Snapshot, SnapshotBuffer};
use server::world::World;
use shared::{clamp_step, BulletView, Packet, PlayerView, MOVE_MAX_DIST};
use std::time::Instant;

fn synthetic_players(count: u32) -> Vec<PlayerView> {
    (1..=count)
        .map(|i| PlayerView {
            id: i,
            x: (i as f32 * 37.0) % 800.0,
            y: (i as f32 * 53.0) % 600.0,
            hp: 1.0 - (i % 5) as f32 * 0.2,
            score: i,
            deaths: i / 2,
            name: Some(format!("player-{}", i)),
        })
        .collect()
}

fn synthetic_bullets(count: u64) -> Vec<BulletView> {
    (1..=count)
        .map(|i| BulletView {
            id: i,
            x: (i as f32 * 29.0) % 800.0,
            y: (i as f32 * 41.0) % 600.0,
        })
        .collect()
}

/// Benchmarks a full server tick with many players moving and shooting
#[test]
fn benchmark_world_tick() {
    let mut world = World::new();
    let t0 = 1_000u64;

    for id in 1..=100u32 {
        world.add_player(id, None, t0);
    }

    let ticks = 1_000u64;
    let start = Instant::now();

    let mut now = t0;
    for tick in 0..ticks {
        now += 50;

        // Re-issue commands as cooldowns allow; rejected ones are free.
        for id in 1..=100u32 {
            if (id + tick as u32) % 2 == 0 {
                world.request_move(id, ((id * 31) % 800) as f32, ((id * 47) % 600) as f32, now);
            } else {
                world.request_shoot(id, (id as f32) * 0.13, now);
            }
        }

        world.step(now, 0.05);
    }

    let duration = start.elapsed();
    println!(
        "World tick: 100 players × {} ticks in {:?} ({:.2} μs/tick)",
        ticks,
        duration,
        duration.as_micros() as f64 / ticks as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks state broadcast serialization performance
#[test]
fn benchmark_state_serialization() {
    use bincode::{deserialize, serialize};

    let packet = Packet::State {
        t: 1234567890,
        players: synthetic_players(50),
        bullets: synthetic_bullets(64),
    };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let serialized = serialize(&packet).unwrap();
        let _deserialized: Packet = deserialize(&serialized).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "State serialization: {} roundtrips in {:?} ({:.2} μs/roundtrip)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks snapshot building from a busy world
#[test]
fn benchmark_snapshot_build() {
    let mut world = World::new();
    let t0 = 1_000u64;

    for id in 1..=100u32 {
        world.add_player(id, None, t0);
        world.request_shoot(id, (id as f32) * 0.17, t0);
    }
    world.step(t0 + 50, 0.05);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let (players, bullets) = world.snapshot();
        assert!(!players.is_empty());
        std::hint::black_box(bullets);
    }

    let duration = start.elapsed();
    println!(
        "Snapshot build: {} snapshots in {:?} ({:.2} μs/snapshot)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks client-side interpolation rendering
#[test]
fn benchmark_interpolation_render() {
    let mut buffer = SnapshotBuffer::new();
    buffer.push(
        Snapshot {
            t: 1000,
            players: synthetic_players(50),
            bullets: synthetic_bullets(64),
        },
        1000,
    );
    buffer.push(
        Snapshot {
            t: 1100,
            players: synthetic_players(50),
            bullets: synthetic_bullets(64),
        },
        1100,
    );

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let state = buffer.render(1000 + (i % 100) as u64);
        std::hint::black_box(state);
    }

    let duration = start.elapsed();
    println!(
        "Interpolation: {} renders in {:?} ({:.2} μs/render)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks move target clamping, the hot path of command validation
#[test]
fn benchmark_clamp_step() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let tx = (i % 1600) as f32 - 400.0;
        let ty = (i % 1200) as f32 - 300.0;
        let _ = clamp_step(400.0, 300.0, tx, ty, MOVE_MAX_DIST);
    }

    let duration = start.elapsed();
    println!(
        "Clamp step: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Stress tests hit resolution with dense projectile traffic
#[test]
fn stress_test_projectile_sweep() {
    let mut world = World::new();
    let t0 = 1_000u64;

    // Pack players close enough that shots regularly connect.
    for id in 1..=40u32 {
        world.add_player(id, None, t0);
        let p = world.players.get_mut(&id).unwrap();
        p.x = 300.0 + (id % 8) as f32 * 25.0;
        p.y = 250.0 + (id / 8) as f32 * 25.0;
        p.invulnerable_until = 0;
    }

    let start = Instant::now();

    let mut now = t0;
    for _ in 0..200 {
        now += 50;
        for id in 1..=40u32 {
            world.request_shoot(id, (id as f32) * 0.31, now);
        }
        world.step(now, 0.05);
    }

    let duration = start.elapsed();
    println!(
        "Projectile sweep: 200 ticks with 40 shooters in {:?}",
        duration
    );

    // Every player is alive and in a valid state after the melee.
    let (players, _) = world.snapshot();
    assert_eq!(players.len(), 40);
    for p in &players {
        assert!(p.hp > 0.0);
    }

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}
