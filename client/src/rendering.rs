use macroquad::prelude::*;
use shared::{BulletView, PlayerView, WORLD_HEIGHT, WORLD_WIDTH};

const PLAYER_RADIUS: f32 = 14.0;
const BULLET_RADIUS: f32 = 4.0;
const HP_BAR_WIDTH: f32 = 34.0;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub client_id: Option<u32>,
    pub aiming: bool,
    pub ping_ms: u64,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Renderer)
    }

    pub fn render(&mut self, players: &[PlayerView], bullets: &[BulletView], config: RenderConfig) {
        clear_background(Color::from_rgba(17, 17, 17, 255));

        self.draw_arena_border();

        for player in players {
            let is_local = Some(player.id) == config.client_id;
            self.draw_player(player, is_local);

            if is_local && config.aiming {
                self.draw_aim_indicator(player);
            }
        }

        for bullet in bullets {
            draw_circle(bullet.x, bullet.y, BULLET_RADIUS, WHITE);
        }

        self.draw_hud(players, &config);
    }

    fn draw_arena_border(&mut self) {
        draw_rectangle_lines(
            0.0,
            0.0,
            WORLD_WIDTH,
            WORLD_HEIGHT,
            2.0,
            Color::from_rgba(68, 68, 68, 255),
        );
    }

    fn draw_player(&mut self, player: &PlayerView, is_local: bool) {
        let body_color = if is_local {
            Color::from_rgba(102, 170, 255, 255)
        } else {
            Color::from_rgba(136, 136, 136, 255)
        };

        draw_circle(player.x, player.y, PLAYER_RADIUS, body_color);

        // Health bar above the body, green fading to orange when hurt.
        let hp = player.hp.clamp(0.0, 1.0);
        let bar_color = if hp > 0.5 { GREEN } else { ORANGE };
        draw_rectangle(
            player.x - HP_BAR_WIDTH / 2.0,
            player.y - PLAYER_RADIUS - 10.0,
            HP_BAR_WIDTH * hp,
            5.0,
            bar_color,
        );

        let label = match &player.name {
            Some(name) => format!("{} {}:{}", name, player.score, player.deaths),
            None => format!("#{} {}:{}", player.id, player.score, player.deaths),
        };
        draw_text(
            &label,
            player.x - HP_BAR_WIDTH / 2.0,
            player.y - PLAYER_RADIUS - 14.0,
            13.0,
            WHITE,
        );
    }

    fn draw_aim_indicator(&mut self, player: &PlayerView) {
        let (mx, my) = mouse_position();
        draw_line(player.x, player.y, mx, my, 1.5, YELLOW);
        draw_circle_lines(player.x, player.y, PLAYER_RADIUS + 4.0, 1.0, YELLOW);
    }

    fn draw_hud(&mut self, players: &[PlayerView], config: &RenderConfig) {
        let connected = config.client_id.is_some();
        let status_color = if connected { GREEN } else { RED };
        draw_rectangle(10.0, 10.0, 8.0, 8.0, status_color);

        let status = if connected {
            format!("{}ms | {} players", config.ping_ms, players.len())
        } else {
            "connecting...".to_string()
        };
        draw_text(&status, 24.0, 18.0, 14.0, WHITE);
    }
}
