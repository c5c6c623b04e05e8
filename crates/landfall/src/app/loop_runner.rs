use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::ClientConfig;
use crate::fixture::WorldSetup;
use crate::input::{EventManager, IngameKeyListener, Key, MouseButton};
use crate::render::{screen_to_world, Renderer};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] pixels::Error),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Runs the windowed client until the window closes or Escape is pressed
/// without any listener claiming it.
pub fn run_client(config: ClientConfig, setup: WorldSetup) -> Result<(), ClientError> {
    let mut session = Session::new(config.session.clone(), &setup);
    let mut events = EventManager::new();
    events.add_key_listener(Box::new(IngameKeyListener::new()));

    let event_loop = EventLoop::new().map_err(ClientError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(ClientError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(ClientError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));

    info!(
        setup = %setup.name,
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        "client_started"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_metrics_instant = Instant::now();
    let mut frames_since_log = 0u32;
    let mut ticks_since_log = 0u32;
    let mut shift_is_down = false;
    let mut cursor_px: Option<(f32, f32)> = None;
    let window_for_loop = Arc::clone(&window);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_px = Some((position.x as f32, position.y as f32));
                    }
                    WindowEvent::CursorLeft { .. } => {
                        cursor_px = None;
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if state != ElementState::Pressed {
                            return;
                        }
                        let Some(button) = map_winit_mouse_button(button) else {
                            return;
                        };
                        if let Some((x, y)) = cursor_px {
                            let world = screen_to_world(
                                x,
                                y,
                                session.view.center(),
                                renderer.viewport(),
                            );
                            session.cursor_click(world, button, shift_is_down);
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        let Some(key) = map_winit_key(event.physical_key) else {
                            return;
                        };
                        match event.state {
                            ElementState::Pressed => {
                                if key == Key::Shift {
                                    shift_is_down = true;
                                }
                                let consumed = events.key_pressed(key, &mut session);
                                if !consumed && key == Key::Escape {
                                    info!(reason = "escape_key", "shutdown_requested");
                                    window_target.exit();
                                }
                            }
                            ElementState::Released => {
                                if key == Key::Shift {
                                    shift_is_down = false;
                                }
                                events.key_released(key, &mut session);
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        accumulator = accumulator
                            .saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                        let step_plan =
                            plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                        for _ in 0..step_plan.ticks_to_run {
                            session.tick(fixed_dt_seconds);
                            ticks_since_log = ticks_since_log.saturating_add(1);
                        }
                        accumulator = step_plan.remaining_accumulator;
                        if step_plan.dropped_backlog > Duration::ZERO {
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame, "sim_clamp_triggered"
                            );
                        }

                        if let Err(error) = renderer.render_session(&session) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        frames_since_log = frames_since_log.saturating_add(1);

                        let since_log = now.saturating_duration_since(last_metrics_instant);
                        if since_log >= metrics_log_interval {
                            let seconds = since_log.as_secs_f32().max(f32::EPSILON);
                            info!(
                                fps = (frames_since_log as f32 / seconds).round() as u32,
                                tps = (ticks_since_log as f32 / seconds).round() as u32,
                                entity_count = session.world.entity_count(),
                                "loop_metrics"
                            );
                            frames_since_log = 0;
                            ticks_since_log = 0;
                            last_metrics_instant = now;
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(ClientError::EventLoopRun)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn map_winit_key(key: PhysicalKey) -> Option<Key> {
    match key {
        PhysicalKey::Code(KeyCode::ArrowLeft) => Some(Key::Left),
        PhysicalKey::Code(KeyCode::ArrowRight) => Some(Key::Right),
        PhysicalKey::Code(KeyCode::ArrowUp) => Some(Key::Up),
        PhysicalKey::Code(KeyCode::ArrowDown) => Some(Key::Down),
        PhysicalKey::Code(KeyCode::KeyT) => Some(Key::T),
        PhysicalKey::Code(KeyCode::KeyX) => Some(Key::X),
        PhysicalKey::Code(KeyCode::KeyD) => Some(Key::D),
        PhysicalKey::Code(KeyCode::F5) => Some(Key::F5),
        PhysicalKey::Code(KeyCode::F9) => Some(Key::F9),
        PhysicalKey::Code(KeyCode::Escape) => Some(Key::Escape),
        PhysicalKey::Code(KeyCode::Enter) => Some(Key::Enter),
        PhysicalKey::Code(KeyCode::Space) => Some(Key::Space),
        PhysicalKey::Code(KeyCode::ShiftLeft) | PhysicalKey::Code(KeyCode::ShiftRight) => {
            Some(Key::Shift)
        }
        _ => None,
    }
}

fn map_winit_mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}
