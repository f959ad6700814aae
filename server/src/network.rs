//! Server network layer: UDP transport, simulation clock and state broadcaster

use crate::registry::SessionRegistry;
use crate::utils::now_millis;
use crate::world::World;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    SessionTimeout {
        session_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the network sender task
#[derive(Debug)]
pub enum OutboundMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// Main server coordinating transport, simulation clock and broadcaster.
///
/// All game-state mutation happens inside `run`'s select loop: command
/// handling, simulation ticks and broadcasts interleave on one logical
/// thread and never preempt each other.
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: Arc<RwLock<SessionRegistry>>,
    world: World,
    tick_duration: Duration,
    broadcast_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        broadcast_duration: Duration,
        max_sessions: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: Arc::new(RwLock::new(SessionRegistry::new(max_sessions))),
            world: World::new(),
            tick_duration,
            broadcast_duration,
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx,
        })
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue. Broadcasts run
    /// on this task, never blocking the simulation loop.
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let sessions = Arc::clone(&self.sessions);
        let mut outbound_rx = std::mem::replace(&mut self.outbound_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match message {
                    OutboundMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    OutboundMessage::BroadcastPacket { packet } => {
                        let session_addrs = {
                            let sessions_guard = sessions.read().await;
                            sessions_guard.addrs()
                        };

                        for (session_id, addr) in session_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to session {}: {}", session_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors session timeouts
    async fn spawn_timeout_checker(&self) {
        let sessions = Arc::clone(&self.sessions);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut sessions_guard = sessions.write().await;
                    sessions_guard.check_timeouts(SESSION_TIMEOUT)
                };

                for session_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::SessionTimeout { session_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.outbound_tx.send(OutboundMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: &Packet) {
        if let Err(e) = self.outbound_tx.send(OutboundMessage::BroadcastPacket {
            packet: packet.clone(),
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Dispatches one incoming packet into the registry/world.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect {
                client_version,
                name,
            } => {
                info!(
                    "Session connecting from {} (version: {})",
                    addr, client_version
                );

                // A reconnect from the same address replaces the old session;
                // prior player state is not restored.
                let existing_id = {
                    let sessions = self.sessions.read().await;
                    sessions.find_by_addr(addr)
                };

                if let Some(existing_id) = existing_id {
                    info!("Replacing existing session {} from {}", existing_id, addr);
                    let mut sessions = self.sessions.write().await;
                    sessions.remove_session(&existing_id);
                    self.world.remove_player(&existing_id);
                }

                let session_id = {
                    let mut sessions = self.sessions.write().await;
                    sessions.add_session(addr, name.clone())
                };

                if let Some(session_id) = session_id {
                    self.world.add_player(session_id, name, now_millis());
                    let response = Packet::Connected {
                        client_id: session_id,
                    };
                    self.send_packet(&response, addr);
                } else {
                    let response = Packet::Disconnected {
                        reason: "Server full".to_string(),
                    };
                    self.send_packet(&response, addr);
                }
            }

            Packet::Move { x, y } => {
                if let Some(session_id) = self.lookup_and_touch(addr).await {
                    self.world.request_move(session_id, x, y, now_millis());
                }
            }

            Packet::Shoot { angle } => {
                if let Some(session_id) = self.lookup_and_touch(addr).await {
                    self.world.request_shoot(session_id, angle, now_millis());
                }
            }

            Packet::Disconnect => {
                let session_id = {
                    let sessions = self.sessions.read().await;
                    sessions.find_by_addr(addr)
                };

                if let Some(session_id) = session_id {
                    let mut sessions = self.sessions.write().await;
                    sessions.remove_session(&session_id);
                    self.world.remove_player(&session_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Resolves a command datagram to its session, refreshing liveness.
    /// Unknown addresses are a disconnect/command race, silently dropped.
    async fn lookup_and_touch(&self, addr: SocketAddr) -> Option<u32> {
        let session_id = {
            let sessions = self.sessions.read().await;
            sessions.find_by_addr(addr)
        };

        if let Some(session_id) = session_id {
            let mut sessions = self.sessions.write().await;
            sessions.touch(session_id);
        }

        session_id
    }

    /// Builds one snapshot of the world and queues it for every session.
    async fn broadcast_state(&mut self) {
        let session_count = {
            let sessions = self.sessions.read().await;
            sessions.len()
        };

        if session_count == 0 {
            return;
        }

        let (players, bullets) = self.world.snapshot();

        // Stamp as close to transmission as possible.
        let packet = Packet::State {
            t: now_millis(),
            players,
            bullets,
        };

        self.broadcast_packet(&packet);
    }

    /// Main server loop: packets, simulation ticks and broadcasts multiplex
    /// on this one task.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(self.tick_duration);
        let mut broadcast_interval = interval(self.broadcast_duration);
        let mut last_tick = Instant::now();
        let mut tick_count: u64 = 0;

        // Cap the delta a stalled scheduler can feed the simulation.
        let max_delta_time = 0.25;

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::SessionTimeout { session_id }) => {
                            info!("Session {} timed out", session_id);
                            self.world.remove_player(&session_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Simulation clock: measured elapsed time, not a fixed delta
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let mut dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    if dt > max_delta_time {
                        warn!("Large tick delta ({:.3}s), capping to {:.3}s", dt, max_delta_time);
                        dt = max_delta_time;
                    }

                    self.world.step(now_millis(), dt);
                    tick_count += 1;

                    if tick_count % 200 == 0 && self.world.player_count() > 0 {
                        debug!(
                            "Tick {}: {} players, {} bullets, {:.1}Hz",
                            tick_count,
                            self.world.player_count(),
                            self.world.bullet_count(),
                            1.0 / dt.max(1e-6)
                        );
                    }
                },

                // Broadcaster: independent, lower rate than the simulation
                _ = broadcast_interval.tick() => {
                    self.broadcast_state().await;
                },
            }
        }

        Ok(())
    }
}
