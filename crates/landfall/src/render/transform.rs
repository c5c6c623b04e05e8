use crate::world::Vec2;

pub const PIXELS_PER_TILE: f32 = 16.0;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Tile coordinates to screen pixels. Screen y grows downward, matching the
/// map's tile rows.
pub fn world_to_screen(world: Vec2, camera_center: Vec2, viewport: Viewport) -> (i32, i32) {
    let x = (world.x - camera_center.x) * PIXELS_PER_TILE + viewport.width as f32 * 0.5;
    let y = (world.y - camera_center.y) * PIXELS_PER_TILE + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world(
    screen_x: f32,
    screen_y: f32,
    camera_center: Vec2,
    viewport: Viewport,
) -> Vec2 {
    Vec2 {
        x: camera_center.x + (screen_x - viewport.width as f32 * 0.5) / PIXELS_PER_TILE,
        y: camera_center.y + (screen_y - viewport.height as f32 * 0.5) / PIXELS_PER_TILE,
    }
}
