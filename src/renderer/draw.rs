//! Draw pass for both games
//!
//! Entities implement [`Drawable`]; `draw_arena` and `draw_grid` compose a
//! whole frame, HUD included. Nothing here mutates game state.

use glam::{IVec2, Vec2};

use super::{Align, Color, Drawable, RenderSurface, rgb};
use crate::highscores::{HighScores, format_date};
use crate::rotate_point;
use crate::sim::{
    Bonus, Bullet, GameState, GridGame, Hazard, HazardKind, Owner, Particle, Session, SessionPhase,
    Ship,
};

const BACKGROUND: Color = [0.02, 0.02, 0.06, 1.0];
const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
const DIM: Color = [1.0, 1.0, 1.0, 0.6];
const PLAYER_SHOT: Color = [1.0, 1.0, 0.6, 1.0];
const ENEMY_SHOT: Color = [1.0, 0.35, 0.35, 1.0];
const GOLD: Color = [1.0, 0.84, 0.0, 1.0];

const SNAKE_HEAD: Color = [0.3, 1.0, 0.4, 1.0];
const SNAKE_BODY: Color = [0.15, 0.7, 0.25, 1.0];
const FOOD: Color = [1.0, 0.3, 0.3, 1.0];
const DANGER: Color = [0.8, 0.2, 0.9, 1.0];

const HUD_TEXT: f32 = 18.0;
const BANNER_TEXT: f32 = 40.0;
const TABLE_TEXT: f32 = 14.0;
/// Rows of the score table shown under the game over banner
const TABLE_ROWS: usize = 5;

impl Drawable for Ship {
    fn draw(&self, surface: &mut dyn RenderSurface) {
        let r = self.radius;
        let nose = self.pos + Vec2::new(0.0, -r);
        let left = self.pos + Vec2::new(-r * 0.7, r * 0.7);
        let right = self.pos + Vec2::new(r * 0.7, r * 0.7);
        let points = [nose, right, left].map(|p| rotate_point(p, self.pos, self.rotation));
        surface.stroke_polygon(&points, 2.0, WHITE);
        if self.controls.thrust {
            let flame = rotate_point(self.pos + Vec2::new(0.0, r * 1.1), self.pos, self.rotation);
            surface.fill_circle(flame, r * 0.2, [1.0, 0.6, 0.1, 0.9]);
        }
    }
}

impl Drawable for Bullet {
    fn draw(&self, surface: &mut dyn RenderSurface) {
        let color = match self.owner {
            Owner::Player => PLAYER_SHOT,
            Owner::Enemy(_) => ENEMY_SHOT,
        };
        surface.fill_circle(self.pos, self.radius, color);
    }
}

impl Drawable for Hazard {
    fn draw(&self, surface: &mut dyn RenderSurface) {
        let color = rgb(self.kind.tint(), 1.0);
        if self.kind == HazardKind::Saucer {
            let size = HazardKind::SAUCER_SIZE;
            surface.fill_rect(self.pos - size * 0.5, size, color);
            return;
        }
        // Lumpy octagon so rotation is visible
        let points: Vec<Vec2> = (0..8)
            .map(|i| {
                let bump = if i % 2 == 0 { 1.0 } else { 0.82 };
                let angle = i as f32 * std::f32::consts::TAU / 8.0 + self.rotation;
                self.pos + Vec2::from_angle(angle) * self.radius * bump
            })
            .collect();
        surface.stroke_polygon(&points, 2.0, color);
    }
}

impl Drawable for Bonus {
    fn draw(&self, surface: &mut dyn RenderSurface) {
        // Blink during the last two seconds
        if self.life < 2.0 && (self.life * 8.0) as i32 % 2 == 1 {
            return;
        }
        surface.fill_circle(self.pos, self.radius, GOLD);
        surface.text(self.pos + Vec2::new(0.0, 5.0), "x2", 12.0, Align::Center, BACKGROUND);
    }
}

impl Drawable for Particle {
    fn draw(&self, surface: &mut dyn RenderSurface) {
        surface.fill_circle(self.pos, self.radius, rgb(self.color, self.alpha()));
    }
}

/// Whole arena frame: background, entities back to front, particles, HUD
pub fn draw_arena(state: &GameState, surface: &mut dyn RenderSurface) {
    surface.clear(BACKGROUND);

    for hazard in &state.hazards {
        hazard.draw(surface);
    }
    for bonus in &state.bonuses {
        bonus.draw(surface);
    }
    for bullet in state.bullets.iter().chain(state.enemy_bullets.iter()) {
        bullet.draw(surface);
    }
    for ship in &state.ships {
        ship.draw(surface);
    }
    for particle in state.particles.iter() {
        particle.draw(surface);
    }

    draw_hud(&state.session, state.level(), surface);
}

/// Whole snake frame. Cells are scaled to fill the surface.
pub fn draw_grid(game: &GridGame, surface: &mut dyn RenderSurface) {
    surface.clear(BACKGROUND);

    let size = surface.size();
    let cell = Vec2::new(size.x / game.size as f32, size.y / game.size as f32);
    for block in &game.dangers {
        fill_cell(surface, cell, block.pos, DANGER);
    }
    fill_cell(surface, cell, game.food, FOOD);
    for (i, seg) in game.snake.iter().enumerate() {
        fill_cell(surface, cell, *seg, if i == 0 { SNAKE_HEAD } else { SNAKE_BODY });
    }

    surface.text(
        Vec2::new(10.0, 24.0),
        &format!("SCORE {}", game.session.score),
        HUD_TEXT,
        Align::Left,
        WHITE,
    );
    surface.text(
        Vec2::new(size.x - 10.0, 24.0),
        &format!("LENGTH {}", game.snake.len()),
        HUD_TEXT,
        Align::Right,
        WHITE,
    );
    draw_phase_banner(&game.session, surface);
}

fn fill_cell(surface: &mut dyn RenderSurface, cell: Vec2, at: IVec2, color: Color) {
    surface.fill_rect(at.as_vec2() * cell, cell - Vec2::ONE, color);
}

fn draw_hud(session: &Session, level: u32, surface: &mut dyn RenderSurface) {
    let size = surface.size();
    surface.text(
        Vec2::new(10.0, 24.0),
        &format!("SCORE {}", session.score),
        HUD_TEXT,
        Align::Left,
        WHITE,
    );
    surface.text(
        Vec2::new(size.x * 0.5, 24.0),
        &format!("LEVEL {level}"),
        HUD_TEXT,
        Align::Center,
        WHITE,
    );
    surface.text(
        Vec2::new(size.x - 10.0, 24.0),
        &format!("LIVES {}", session.lives),
        HUD_TEXT,
        Align::Right,
        WHITE,
    );

    let mut footer = format!("ACC {}%", session.accuracy());
    if let Some(t) = session.time_remaining {
        footer.push_str(&format!("  TIME {}", t.ceil().max(0.0) as u32));
    }
    if session.multiplier {
        footer.push_str("  x2");
    }
    surface.text(
        Vec2::new(10.0, size.y - 12.0),
        &footer,
        HUD_TEXT,
        Align::Left,
        DIM,
    );

    draw_phase_banner(session, surface);
}

fn draw_phase_banner(session: &Session, surface: &mut dyn RenderSurface) {
    let center = surface.size() * 0.5;
    match session.phase {
        SessionPhase::Playing => {}
        SessionPhase::NotStarted => {
            surface.text(center, "PRESS ENTER", BANNER_TEXT, Align::Center, WHITE);
        }
        SessionPhase::GameOver(reason) => {
            surface.text(center, "GAME OVER", BANNER_TEXT, Align::Center, WHITE);
            surface.text(
                center + Vec2::new(0.0, 36.0),
                reason.as_str(),
                HUD_TEXT,
                Align::Center,
                DIM,
            );
        }
    }
}

/// Top of the score table under the game over banner. `highlight` is the
/// rank the last session earned.
pub fn draw_score_table(table: &HighScores, highlight: Option<usize>, surface: &mut dyn RenderSurface) {
    let top = surface.size() * 0.5 + Vec2::new(0.0, 72.0);
    for (i, entry) in table.entries.iter().take(TABLE_ROWS).enumerate() {
        let rank = i + 1;
        let color = if highlight == Some(rank) { GOLD } else { DIM };
        let line = format!(
            "{rank}. {:>6}  L{}  {}",
            entry.score,
            entry.level,
            format_date(entry.timestamp)
        );
        surface.text(
            top + Vec2::new(0.0, i as f32 * (TABLE_TEXT + 6.0)),
            &line,
            TABLE_TEXT,
            Align::Center,
            color,
        );
    }
}
