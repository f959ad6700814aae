//! Snapshot buffering and interpolation
//!
//! The server broadcasts state slower than the client renders, so snapping
//! to the latest snapshot would stutter. The synchronizer keeps the two most
//! recent snapshots and interpolates between them, trading at most one
//! broadcast interval of latency for smooth apparent motion. No synchronized
//! clock is required: the server/local offset is re-estimated on every
//! received snapshot and only ever used relatively.

use shared::{lerp, BulletView, PlayerView};

/// One received state broadcast, stamped with the server's send time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub t: u64,
    pub players: Vec<PlayerView>,
    pub bullets: Vec<BulletView>,
}

/// The view handed to the renderer: reconciliation by identity, so entities
/// absent from the list disappear and new ids get created.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub players: Vec<PlayerView>,
    pub bullets: Vec<BulletView>,
}

/// Buffers the two most recent snapshots plus a clock offset estimate.
#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    prev: Option<Snapshot>,
    next: Option<Snapshot>,
    /// serverTime - localTimeAtReceipt, recomputed on every snapshot.
    clock_offset: i64,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self {
            prev: None,
            next: None,
            clock_offset: 0,
        }
    }

    /// Accepts one snapshot. Duplicates and reordering are tolerated: the
    /// buffer always shifts, and `render` falls back to the newest snapshot
    /// whenever the pair spans zero or negative time.
    pub fn push(&mut self, snapshot: Snapshot, local_now_ms: u64) {
        self.clock_offset = snapshot.t as i64 - local_now_ms as i64;
        self.prev = self.next.take();
        self.next = Some(snapshot);
    }

    pub fn clock_offset(&self) -> i64 {
        self.clock_offset
    }

    /// Produces the interpolated view for the given local time.
    pub fn render(&self, local_now_ms: u64) -> RenderState {
        let next = match &self.next {
            Some(s) => s,
            None => return RenderState::default(),
        };

        let prev = match &self.prev {
            Some(s) => s,
            // Only one snapshot so far: render it verbatim.
            None => return verbatim(next),
        };

        let span = next.t as i64 - prev.t as i64;
        if span <= 0 {
            // Stale or out-of-order pair; the newest snapshot wins.
            return verbatim(next);
        }

        let estimated_server_now = local_now_ms as i64 + self.clock_offset;
        let alpha =
            ((estimated_server_now - prev.t as i64) as f32 / span as f32).clamp(0.0, 1.0);

        let players = next
            .players
            .iter()
            .map(|p| match prev.players.iter().find(|q| q.id == p.id) {
                Some(q) => PlayerView {
                    x: lerp(q.x, p.x, alpha),
                    y: lerp(q.y, p.y, alpha),
                    ..p.clone()
                },
                // Newly appeared: no history to blend from.
                None => p.clone(),
            })
            .collect();

        let bullets = next
            .bullets
            .iter()
            .map(|b| match prev.bullets.iter().find(|q| q.id == b.id) {
                Some(q) => BulletView {
                    id: b.id,
                    x: lerp(q.x, b.x, alpha),
                    y: lerp(q.y, b.y, alpha),
                },
                None => b.clone(),
            })
            .collect();

        RenderState { players, bullets }
    }
}

fn verbatim(snapshot: &Snapshot) -> RenderState {
    RenderState {
        players: snapshot.players.clone(),
        bullets: snapshot.bullets.clone(),
    }
}
