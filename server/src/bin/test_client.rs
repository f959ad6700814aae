use bincode::{deserialize, serialize};
use rand::Rng;
use shared::{Packet, WORLD_HEIGHT, WORLD_WIDTH};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create local socket
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    // Server address
    let server_addr = "127.0.0.1:8080".parse::<SocketAddr>()?;

    // Send connection request
    let connect_packet = Packet::Connect {
        client_version: 1,
        name: Some("smoke-bot".to_string()),
    };
    println!("Sending connection request to {}", server_addr);
    socket.send_to(&serialize(&connect_packet)?, server_addr).await?;

    // Buffer for receiving data
    let mut buf = [0u8; 4096];

    // Wait for response
    println!("Waiting for server response...");
    let (len, addr) = socket.recv_from(&mut buf).await?;
    println!("Received {} bytes from {}", len, addr);

    match deserialize::<Packet>(&buf[0..len]) {
        Ok(Packet::Connected { client_id }) => {
            println!("Connected with session ID: {}", client_id);

            // Alternate between random moves and shots for 10 rounds;
            // the server enforces the shared cooldown gate either way.
            for round in 0..10u32 {
                let command = {
                    let mut rng = rand::thread_rng();
                    if round % 2 == 0 {
                        Packet::Move {
                            x: rng.gen_range(0.0..WORLD_WIDTH),
                            y: rng.gen_range(0.0..WORLD_HEIGHT),
                        }
                    } else {
                        Packet::Shoot {
                            angle: rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI),
                        }
                    }
                };

                println!("Sending command: {:?}", command);
                socket.send_to(&serialize(&command)?, server_addr).await?;

                // Wait for the next snapshot
                match socket.recv_from(&mut buf).await {
                    Ok((len, _)) => match deserialize::<Packet>(&buf[0..len]) {
                        Ok(Packet::State { t, players, bullets }) => {
                            println!(
                                "Snapshot t={}: {} players, {} bullets",
                                t,
                                players.len(),
                                bullets.len()
                            );
                            if let Some(me) = players.iter().find(|p| p.id == client_id) {
                                println!(
                                    "  me: pos=({:.1}, {:.1}), hp={:.2}, score={}, deaths={}",
                                    me.x, me.y, me.hp, me.score, me.deaths
                                );
                            }
                        }
                        Ok(other) => println!("Unexpected packet: {:?}", other),
                        Err(e) => println!("Failed to deserialize snapshot: {}", e),
                    },
                    Err(e) => println!("Error receiving snapshot: {}", e),
                }

                // Cooldowns are 450ms; pace commands slower than that.
                sleep(Duration::from_millis(600)).await;
            }

            println!("Sending disconnect");
            socket.send_to(&serialize(&Packet::Disconnect)?, server_addr).await?;
            println!("Test client finished");
        }
        Ok(other) => println!("Expected Connected but got: {:?}", other),
        Err(e) => println!("Failed to deserialize response: {}", e),
    }

    Ok(())
}
