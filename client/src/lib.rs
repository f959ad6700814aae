//! # Arena Client Library
//!
//! Client-side implementation for the arena shooter: a thin renderer over
//! the server's authoritative state broadcasts.
//!
//! The client sends intent (move destinations, shot angles) and never
//! simulates ahead. Instead of prediction, it buffers the two most recent
//! server snapshots and interpolates between them, which keeps every entity
//! on screen moving smoothly at roughly one broadcast interval behind the
//! authoritative present.
//!
//! ## Module Organization
//!
//! - `sync`: snapshot buffering, clock offset estimation, and interpolation
//! - `input`: pointer gesture handling (drag-to-aim, click-to-move)
//! - `network`: UDP connection and the main client event loop
//! - `rendering`: macroquad drawing of the interpolated view

pub mod input;
pub mod network;
pub mod rendering;
pub mod sync;
