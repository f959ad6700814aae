use crate::input::{Command, InputGate};
use crate::rendering::{RenderConfig, Renderer};
use crate::sync::{RenderState, Snapshot, SnapshotBuffer};
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::interval;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    client_id: Option<u32>,
    connected: bool,
    name: Option<String>,

    snapshots: SnapshotBuffer,
    input_gate: InputGate,
    renderer: Renderer,
    last_render: RenderState,

    ping_ms: u64,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        name: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        let renderer = Renderer::new()?;

        Ok(Client {
            socket,
            server_addr,
            client_id: None,
            connected: false,
            name,
            snapshots: SnapshotBuffer::new(),
            input_gate: InputGate::new(),
            renderer,
            last_render: RenderState::default(),
            ping_ms: 0,
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server...");

        let packet = Packet::Connect {
            client_version: 1,
            name: self.name.clone(),
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected { client_id } => {
                info!("Connected! Session ID: {}", client_id);
                self.client_id = Some(client_id);
                self.connected = true;
            }

            Packet::State { t, players, bullets } => {
                let local_now = local_millis();
                if t > 0 {
                    self.ping_ms = local_now.saturating_sub(t);
                }

                self.snapshots.push(
                    Snapshot {
                        t,
                        players,
                        bullets,
                    },
                    local_now,
                );
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.client_id = None;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    /// Commands are fire-and-forget: no acknowledgment is awaited, the
    /// server's next snapshot is the only response.
    async fn send_command(&self, command: Command) -> Result<(), Box<dyn std::error::Error>> {
        if !self.connected {
            return Ok(());
        }

        let packet = match command {
            Command::Move { x, y } => Packet::Move { x, y },
            Command::Shoot { angle } => Packet::Shoot { angle },
        };

        self.send_packet(&packet).await
    }

    /// The local player's position in the most recent rendered view, used
    /// by the input gate to distinguish aim-grabs from move clicks.
    fn own_rendered_position(&self) -> Option<(f32, f32)> {
        let id = self.client_id?;
        self.last_render
            .players
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.x, p.y))
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut input_interval = interval(Duration::from_millis(16));
        let mut render_interval = interval(Duration::from_millis(16));

        let mut buffer = [0u8; 4096];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet);
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = input_interval.tick() => {
                    let me = self.own_rendered_position();
                    if let Some(command) = self.input_gate.sample(me) {
                        if let Err(e) = self.send_command(command).await {
                            error!("Error sending command: {}", e);
                        }
                    }
                },

                _ = render_interval.tick() => {
                    self.last_render = self.snapshots.render(local_millis());

                    self.renderer.render(
                        &self.last_render.players,
                        &self.last_render.bullets,
                        RenderConfig {
                            client_id: self.client_id,
                            aiming: self.input_gate.is_aiming(),
                            ping_ms: self.ping_ms,
                        },
                    );
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    break;
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}

fn local_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
