use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::session::{layers, Session};
use crate::world::{EntityKind, Vec2};

use super::transform::{world_to_screen, Viewport, PIXELS_PER_TILE};

const WATER_COLOR: [u8; 4] = [0x14, 0x32, 0x4a, 0xff];
const GRID_COLOR: [u8; 4] = [0x22, 0x46, 0x60, 0xff];
const SELECTION_COLOR: [u8; 4] = [0xff, 0xe0, 0x66, 0xff];
const DEBUG_COLOR: [u8; 4] = [0xff, 0x4d, 0x4d, 0xff];

const ENTITY_HALF_SIZE_PX: i32 = 5;
const SELECTION_HALF_SIZE_PX: i32 = 8;

fn color_for_kind(kind: EntityKind) -> [u8; 4] {
    match kind {
        EntityKind::Ship => [0xd8, 0xd8, 0xd0, 0xff],
        EntityKind::Warehouse => [0xb0, 0x6a, 0x2c, 0xff],
        EntityKind::Lumberjack => [0x8a, 0x5a, 0x2a, 0xff],
        EntityKind::Fisher => [0x4a, 0x8a, 0xb0, 0xff],
        EntityKind::Tree => [0x2f, 0x7a, 0x33, 0xff],
    }
}

/// Framebuffer renderer for a session: clears to water, then draws the named
/// layers that are enabled in the session's renderer registry.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn render_session(&mut self, session: &Session) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let camera = session.view.center();
        let frame = self.pixels.frame_mut();

        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&WATER_COLOR);
        }

        if session.renderers.is_enabled(layers::GRID) {
            draw_grid(frame, viewport, camera);
        }

        for entity in session.world.entities() {
            let (x, y) = world_to_screen(entity.position, camera, viewport);
            fill_rect(
                frame,
                viewport,
                x - ENTITY_HALF_SIZE_PX,
                y - ENTITY_HALF_SIZE_PX,
                x + ENTITY_HALF_SIZE_PX,
                y + ENTITY_HALF_SIZE_PX,
                color_for_kind(entity.kind),
            );
        }

        if session.renderers.is_enabled(layers::SELECTION) {
            for id in session.selected() {
                let Some(position) = session.world.position_of(*id) else {
                    continue;
                };
                let (x, y) = world_to_screen(position, camera, viewport);
                draw_rect_outline(
                    frame,
                    viewport,
                    x - SELECTION_HALF_SIZE_PX,
                    y - SELECTION_HALF_SIZE_PX,
                    x + SELECTION_HALF_SIZE_PX,
                    y + SELECTION_HALF_SIZE_PX,
                    SELECTION_COLOR,
                );
            }
        }

        if session.renderers.is_enabled(layers::DEBUG) {
            let cx = viewport.width as i32 / 2;
            let cy = viewport.height as i32 / 2;
            fill_rect(frame, viewport, cx - 6, cy, cx + 6, cy, DEBUG_COLOR);
            fill_rect(frame, viewport, cx, cy - 6, cx, cy + 6, DEBUG_COLOR);
        }

        self.pixels.render()
    }
}

fn put_pixel(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let index = (y as usize * viewport.width as usize + x as usize) * 4;
    if let Some(slot) = frame.get_mut(index..index + 4) {
        slot.copy_from_slice(&color);
    }
}

fn fill_rect(
    frame: &mut [u8],
    viewport: Viewport,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: [u8; 4],
) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            put_pixel(frame, viewport, x, y, color);
        }
    }
}

fn draw_rect_outline(
    frame: &mut [u8],
    viewport: Viewport,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: [u8; 4],
) {
    for x in x0..=x1 {
        put_pixel(frame, viewport, x, y0, color);
        put_pixel(frame, viewport, x, y1, color);
    }
    for y in y0..=y1 {
        put_pixel(frame, viewport, x0, y, color);
        put_pixel(frame, viewport, x1, y, color);
    }
}

fn draw_grid(frame: &mut [u8], viewport: Viewport, camera: Vec2) {
    let step = PIXELS_PER_TILE as i32;
    let offset_x = (-(camera.x.fract()) * PIXELS_PER_TILE).round() as i32
        + viewport.width as i32 / 2 % step;
    let offset_y = (-(camera.y.fract()) * PIXELS_PER_TILE).round() as i32
        + viewport.height as i32 / 2 % step;

    let mut x = offset_x.rem_euclid(step);
    while x < viewport.width as i32 {
        for y in 0..viewport.height as i32 {
            put_pixel(frame, viewport, x, y, GRID_COLOR);
        }
        x += step;
    }
    let mut y = offset_y.rem_euclid(step);
    while y < viewport.height as i32 {
        for x in 0..viewport.width as i32 {
            put_pixel(frame, viewport, x, y, GRID_COLOR);
        }
        y += step;
    }
}
