use crate::render::PIXELS_PER_TILE;
use crate::world::Vec2;

/// Camera over the map. Scroll velocity is additive: every `autoscroll`
/// delta is summed, so applying a delta and later its inverse restores the
/// previous velocity exactly.
#[derive(Debug, Default)]
pub struct View {
    center: Vec2,
    scroll_velocity_px: Vec2,
}

impl View {
    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn center_on(&mut self, x: f32, y: f32) {
        self.center = Vec2::new(x, y);
    }

    pub fn scroll_velocity_px(&self) -> Vec2 {
        self.scroll_velocity_px
    }

    pub fn autoscroll(&mut self, dx_px_per_second: f32, dy_px_per_second: f32) {
        self.scroll_velocity_px.x += dx_px_per_second;
        self.scroll_velocity_px.y += dy_px_per_second;
    }

    pub fn scroll(&mut self, dx_tiles: f32, dy_tiles: f32) {
        self.center.x += dx_tiles;
        self.center.y += dy_tiles;
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        self.center.x += self.scroll_velocity_px.x * dt_seconds / PIXELS_PER_TILE;
        self.center.y += self.scroll_velocity_px.y * dt_seconds / PIXELS_PER_TILE;
    }
}
