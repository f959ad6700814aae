use serde::{Deserialize, Serialize};

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const MOVE_MAX_DIST: f32 = 220.0;
pub const MOVE_COOLDOWN_MS: u64 = 450;
pub const SHOOT_COOLDOWN_MS: u64 = 450;
pub const BULLET_SPEED: f32 = 520.0;
pub const BULLET_TTL_MS: u64 = 1500;
pub const HIT_RADIUS: f32 = 16.0;
pub const HIT_DAMAGE: f32 = 0.2;
pub const RESPAWN_INVULN_MS: u64 = 1000;
pub const RESPAWN_ACTION_DELAY_MS: u64 = 600;
pub const SPAWN_JITTER: f32 = 12.0;
pub const AIM_RADIUS: f32 = 24.0;
pub const MAX_NAME_LEN: usize = 16;

/// Fixed respawn rotation, walked per-player via a spawn cursor.
pub const SPAWN_POINTS: [(f32, f32); 4] = [
    (120.0, 120.0),
    (680.0, 120.0),
    (680.0, 480.0),
    (120.0, 480.0),
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
        name: Option<String>,
    },
    Move {
        x: f32,
        y: f32,
    },
    Shoot {
        angle: f32,
    },
    Disconnect,

    Connected {
        client_id: u32,
    },
    State {
        t: u64,
        players: Vec<PlayerView>,
        bullets: Vec<BulletView>,
    },
    Disconnected {
        reason: String,
    },
}

/// Public per-player fields carried in a state snapshot. Simulation-private
/// fields (cooldowns, invulnerability, tween) never appear on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub score: u32,
    pub deaths: u32,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BulletView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

pub fn lerp(a: f32, b: f32, k: f32) -> f32 {
    a + (b - a) * k
}

/// Clamps a requested move target so the displacement from (from_x, from_y)
/// never exceeds max_dist, preserving direction. Targets already within
/// range are returned unchanged.
pub fn clamp_step(from_x: f32, from_y: f32, to_x: f32, to_y: f32, max_dist: f32) -> (f32, f32) {
    let dx = to_x - from_x;
    let dy = to_y - from_y;
    let d = (dx * dx + dy * dy).sqrt();
    if d <= max_dist {
        return (to_x, to_y);
    }
    let k = max_dist / d;
    (from_x + dx * k, from_y + dy * k)
}

/// Wraps an angle in radians into (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let r = angle.rem_euclid(tau);
    if r > std::f32::consts::PI {
        r - tau
    } else {
        r
    }
}

/// Clamps a point into world bounds.
pub fn clamp_to_world(x: f32, y: f32) -> (f32, f32) {
    (x.clamp(0.0, WORLD_WIDTH), y.clamp(0.0, WORLD_HEIGHT))
}
