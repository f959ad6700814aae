//! # Arena Game Server Library
//!
//! Authoritative server for the top-down multiplayer arena shooter. It owns
//! the canonical world state, validates every client command, advances the
//! simulation on a fixed-rate clock, and broadcasts sanitized snapshots for
//! clients to interpolate.
//!
//! ## Core responsibilities
//!
//! ### Authoritative simulation
//! Movement is a server-installed, time-bounded tween: a move request is
//! clamped to a maximum step distance (direction preserved) and into world
//! bounds before any position changes, so a modified client can never
//! teleport. Shots are cooldown-gated, angle-normalized projectiles
//! integrated by measured elapsed time each tick.
//!
//! ### Session management
//! The registry tracks session ids, transport addresses and liveness.
//! Disconnects (explicit or timeout) remove the player and every projectile
//! it owns in one synchronous step.
//!
//! ### State broadcasting
//! An independent, lower-rate timer serializes the public view of all
//! players and projectiles (never cooldowns or invulnerability windows) and
//! delivers it identically to every connected session.
//!
//! ## Architecture
//!
//! One `tokio::select!` loop multiplexes received packets, simulation ticks
//! and broadcasts, so command handling interleaves with ticks but never
//! preempts them; there is no parallel mutation of the world. Background
//! tasks handle raw socket receive/send and timeout detection, feeding the
//! loop through channels.
//!
//! ## Module organization
//!
//! - [`registry`]: session id allocation, address lookup, timeouts
//! - [`world`]: players, tweens, projectiles, damage and respawn
//! - [`network`]: UDP transport plus the simulation/broadcast loop
//! - [`utils`]: timestamp helper

pub mod network;
pub mod registry;
pub mod utils;
pub mod world;
