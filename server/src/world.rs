//! Authoritative world state: movement tweens, projectiles, damage and respawn

use log::{info, warn};
use rand::Rng;
use shared::{
    clamp_step, clamp_to_world, lerp, wrap_angle, BulletView, PlayerView, BULLET_SPEED,
    BULLET_TTL_MS, HIT_DAMAGE, HIT_RADIUS, MAX_NAME_LEN, MOVE_COOLDOWN_MS, MOVE_MAX_DIST,
    RESPAWN_ACTION_DELAY_MS, RESPAWN_INVULN_MS, SHOOT_COOLDOWN_MS, SPAWN_JITTER, SPAWN_POINTS,
    WORLD_HEIGHT, WORLD_WIDTH,
};
use std::collections::HashMap;

/// A time-bounded linear move from (sx, sy) to (tx, ty) over [t0, t1].
/// Movement is always one of these, never free-form velocity, so a player
/// can never cover more than the clamped step regardless of tick timing.
#[derive(Debug, Clone, Copy)]
pub struct MoveTween {
    pub sx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
    pub t0: u64,
    pub t1: u64,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub score: u32,
    pub deaths: u32,
    pub tween: Option<MoveTween>,
    /// Earliest timestamp at which the next move or shoot is accepted.
    /// Shared gate: one action at a time, either kind.
    pub next_action_at: u64,
    pub invulnerable_until: u64,
    pub spawn_cursor: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub id: u64,
    pub owner: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub born_at: u64,
}

/// The server-side simulation. All mutation happens synchronously inside the
/// caller's event loop; timestamps are passed in explicitly.
#[derive(Debug, Default)]
pub struct World {
    pub players: HashMap<u32, Player>,
    projectiles: Vec<Projectile>,
    next_projectile_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            projectiles: Vec::new(),
            next_projectile_id: 1,
        }
    }

    pub fn add_player(&mut self, id: u32, name: Option<String>, now_ms: u64) {
        let cursor = id as usize % SPAWN_POINTS.len();
        let (x, y) = jittered_spawn(cursor);

        let name = name.map(|n| {
            let trimmed = n.trim();
            trimmed.chars().take(MAX_NAME_LEN).collect::<String>()
        });

        let player = Player {
            id,
            name,
            x,
            y,
            hp: 1.0,
            score: 0,
            deaths: 0,
            tween: None,
            next_action_at: now_ms,
            invulnerable_until: now_ms,
            spawn_cursor: cursor,
        };

        info!("Added player {} at ({:.1}, {:.1})", id, player.x, player.y);
        self.players.insert(id, player);
    }

    /// Removes the player and every projectile it owns in one step, so no
    /// tick ever sees a projectile with a missing owner.
    pub fn remove_player(&mut self, id: &u32) {
        if self.players.remove(id).is_some() {
            self.projectiles.retain(|b| b.owner != *id);
            info!("Removed player {}", id);
        }
    }

    /// Validates and installs a move tween. Returns whether the command was
    /// accepted; rejected commands mutate nothing.
    pub fn request_move(&mut self, id: u32, x: f32, y: f32, now_ms: u64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            warn!("Dropping move with non-finite target from {}: ({}, {})", id, x, y);
            return false;
        }

        let player = match self.players.get_mut(&id) {
            Some(p) => p,
            // Race between disconnect and an in-flight command, not an error.
            None => return false,
        };

        if now_ms < player.next_action_at {
            return false;
        }

        let (tx, ty) = clamp_step(player.x, player.y, x, y, MOVE_MAX_DIST);
        let (tx, ty) = clamp_to_world(tx, ty);

        player.tween = Some(MoveTween {
            sx: player.x,
            sy: player.y,
            tx,
            ty,
            t0: now_ms,
            t1: now_ms + MOVE_COOLDOWN_MS,
        });
        player.next_action_at = now_ms + MOVE_COOLDOWN_MS;
        true
    }

    /// Validates a shoot command and spawns a projectile at the shooter's
    /// current position.
    pub fn request_shoot(&mut self, id: u32, angle: f32, now_ms: u64) -> bool {
        if !angle.is_finite() {
            warn!("Dropping shoot with non-finite angle from {}: {}", id, angle);
            return false;
        }

        let player = match self.players.get_mut(&id) {
            Some(p) => p,
            None => return false,
        };

        if now_ms < player.next_action_at {
            return false;
        }

        let angle = wrap_angle(angle);
        let (x, y) = (player.x, player.y);
        player.next_action_at = now_ms + SHOOT_COOLDOWN_MS;

        self.spawn_projectile(id, x, y, angle.cos() * BULLET_SPEED, angle.sin() * BULLET_SPEED, now_ms);
        true
    }

    fn spawn_projectile(&mut self, owner: u32, x: f32, y: f32, vx: f32, vy: f32, born_at: u64) {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile {
            id,
            owner,
            x,
            y,
            vx,
            vy,
            born_at,
        });
    }

    /// Advances one simulation tick: movement first, then combat, so hit
    /// detection uses the positions players occupy after this tick's move.
    pub fn step(&mut self, now_ms: u64, dt: f32) {
        self.update_tweens(now_ms);
        self.update_projectiles(now_ms, dt);
        self.resolve_hits(now_ms);
    }

    fn update_tweens(&mut self, now_ms: u64) {
        for player in self.players.values_mut() {
            if let Some(m) = player.tween {
                let span = (m.t1 - m.t0) as f32;
                let k = ((now_ms.saturating_sub(m.t0)) as f32 / span).clamp(0.0, 1.0);
                player.x = lerp(m.sx, m.tx, k);
                player.y = lerp(m.sy, m.ty, k);
                if k >= 1.0 {
                    player.tween = None;
                }
            }
        }
    }

    fn update_projectiles(&mut self, now_ms: u64, dt: f32) {
        for b in &mut self.projectiles {
            b.x += b.vx * dt;
            b.y += b.vy * dt;
        }

        self.projectiles.retain(|b| {
            let in_bounds =
                b.x >= 0.0 && b.x <= WORLD_WIDTH && b.y >= 0.0 && b.y <= WORLD_HEIGHT;
            let alive = now_ms.saturating_sub(b.born_at) <= BULLET_TTL_MS;
            in_bounds && alive
        });
    }

    fn resolve_hits(&mut self, now_ms: u64) {
        let mut i = 0;
        while i < self.projectiles.len() {
            let b = self.projectiles[i];
            let victim = self.players.values().find(|p| {
                p.id != b.owner
                    && now_ms >= p.invulnerable_until
                    && ((p.x - b.x).powi(2) + (p.y - b.y).powi(2)).sqrt() < HIT_RADIUS
            });

            if let Some(victim_id) = victim.map(|p| p.id) {
                // A projectile hits at most once; remove before applying
                // damage so no later pair check can see it.
                self.projectiles.swap_remove(i);
                self.apply_hit(b.owner, victim_id, now_ms);
            } else {
                i += 1;
            }
        }
    }

    fn apply_hit(&mut self, shooter_id: u32, victim_id: u32, now_ms: u64) {
        let died = {
            let victim = match self.players.get_mut(&victim_id) {
                Some(p) => p,
                None => return,
            };
            victim.hp = (victim.hp - HIT_DAMAGE).max(0.0);
            if victim.hp <= 0.0 {
                victim.deaths += 1;
                Self::respawn(victim, now_ms);
                true
            } else {
                false
            }
        };

        if died {
            // Shooter may have disconnected while the projectile was in flight.
            if let Some(shooter) = self.players.get_mut(&shooter_id) {
                shooter.score += 1;
            }
        }
    }

    /// Resets the victim in place. Respawn is synchronous: hp is never
    /// observable at 0 by a later snapshot.
    fn respawn(player: &mut Player, now_ms: u64) {
        player.spawn_cursor = (player.spawn_cursor + 1) % SPAWN_POINTS.len();
        let (x, y) = jittered_spawn(player.spawn_cursor);
        player.x = x;
        player.y = y;
        player.hp = 1.0;
        player.tween = None;
        player.invulnerable_until = now_ms + RESPAWN_INVULN_MS;
        player.next_action_at = now_ms + RESPAWN_ACTION_DELAY_MS;
    }

    /// Builds the public snapshot rows, sorted by id. Internal fields
    /// (cooldowns, invulnerability, tweens) are not included.
    pub fn snapshot(&self) -> (Vec<PlayerView>, Vec<BulletView>) {
        let mut players: Vec<PlayerView> = self
            .players
            .values()
            .map(|p| PlayerView {
                id: p.id,
                x: p.x,
                y: p.y,
                hp: p.hp,
                score: p.score,
                deaths: p.deaths,
                name: p.name.clone(),
            })
            .collect();
        players.sort_by_key(|p| p.id);

        let mut bullets: Vec<BulletView> = self
            .projectiles
            .iter()
            .map(|b| BulletView {
                id: b.id,
                x: b.x,
                y: b.y,
            })
            .collect();
        bullets.sort_by_key(|b| b.id);

        (players, bullets)
    }

    pub fn bullet_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

fn jittered_spawn(cursor: usize) -> (f32, f32) {
    let (sx, sy) = SPAWN_POINTS[cursor % SPAWN_POINTS.len()];
    let mut rng = rand::thread_rng();
    let jx = rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
    let jy = rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
    clamp_to_world(sx + jx, sy + jy)
}
