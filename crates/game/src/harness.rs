use std::path::PathBuf;

use landfall::{
    EventManager, FixtureError, GuiError, IngameKeyListener, Key, MouseButton, Session,
    SessionConfig, Vec2, Widget, World, WorldSetup,
};
use thiserror::Error;
use tracing::debug;

pub const FIXED_DT_SECONDS: f32 = 1.0 / 60.0;

/// Fixture documents compiled into the binary, addressed by the names
/// scenario configs use.
pub fn fixture_xml(name: &str) -> Option<&'static str> {
    match name {
        "ai_settlement" => Some(include_str!("../fixtures/ai_settlement.xml")),
        "coastal_works" => Some(include_str!("../fixtures/coastal_works.xml")),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no fixture named '{name}'")]
    UnknownFixture { name: String },
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error("condition not met after {waited_seconds:.1}s of game time")]
    WaitTimeout { waited_seconds: f32 },
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub fixture: Option<&'static str>,
    pub ai_players: u32,
    pub timeout_seconds: f32,
    pub save_dir: Option<PathBuf>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            fixture: None,
            ai_players: 0,
            timeout_seconds: 120.0,
            save_dir: None,
        }
    }
}

/// Scripted driver over a headless session. Key presses go through the same
/// event manager the windowed client uses; waits advance simulated time at a
/// fixed tick rate until a predicate holds or the scenario timeout runs out.
pub struct GuiDriver {
    session: Session,
    events: EventManager,
    timeout_seconds: f32,
    elapsed_seconds: f32,
    cursor: Vec2,
}

impl GuiDriver {
    pub fn new(config: ScenarioConfig) -> Result<Self, HarnessError> {
        let setup = match config.fixture {
            Some(name) => {
                let xml = fixture_xml(name).ok_or_else(|| HarnessError::UnknownFixture {
                    name: name.to_string(),
                })?;
                WorldSetup::from_xml(xml)?
            }
            None => WorldSetup::dev_map(config.ai_players),
        };
        let save_dir = config.save_dir.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("landfall-harness-{}", std::process::id()))
        });
        let session_config = SessionConfig {
            save_dir,
            ..SessionConfig::default()
        };
        let mut events = EventManager::new();
        events.add_key_listener(Box::new(IngameKeyListener::new()));
        debug!(setup = %setup.name, "driver_started");
        Ok(Self {
            session: Session::new(session_config, &setup),
            events,
            timeout_seconds: config.timeout_seconds,
            elapsed_seconds: 0.0,
            cursor: Vec2::default(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn world(&self) -> &World {
        &self.session.world
    }

    pub fn press_key(&mut self, key: Key) -> bool {
        self.events.key_pressed(key, &mut self.session)
    }

    pub fn release_key(&mut self, key: Key) -> bool {
        self.events.key_released(key, &mut self.session)
    }

    pub fn tap_key(&mut self, key: Key) {
        self.press_key(key);
        self.release_key(key);
    }

    pub fn cursor_move(&mut self, x: f32, y: f32) {
        self.cursor = Vec2::new(x, y);
    }

    pub fn cursor_click(&mut self, x: f32, y: f32, button: MouseButton) {
        self.cursor_move(x, y);
        self.session.cursor_click(self.cursor, button, false);
    }

    pub fn cursor_click_shifted(&mut self, x: f32, y: f32, button: MouseButton) {
        self.cursor_move(x, y);
        self.session.cursor_click(self.cursor, button, true);
    }

    pub fn select(&mut self, ids: &[landfall::EntityId]) {
        self.session.select(ids);
    }

    pub fn find(&self, name: &str) -> Option<&Widget> {
        self.session.gui.find(name)
    }

    pub fn trigger(&mut self, widget: &str, path: &str) -> Result<(), GuiError> {
        self.session.trigger(widget, path)
    }

    fn tick_once(&mut self) {
        self.session.tick(FIXED_DT_SECONDS);
        self.elapsed_seconds += FIXED_DT_SECONDS;
    }

    pub fn run_for_seconds(&mut self, seconds: f32) {
        let ticks = (seconds / FIXED_DT_SECONDS).ceil().max(1.0) as u32;
        for _ in 0..ticks {
            self.tick_once();
        }
    }

    /// Ticks the session until the predicate holds. The scenario timeout is
    /// measured in simulated game time accumulated across all waits.
    pub fn run_until(
        &mut self,
        mut predicate: impl FnMut(&Session) -> bool,
    ) -> Result<(), HarnessError> {
        loop {
            if predicate(&self.session) {
                return Ok(());
            }
            if self.elapsed_seconds >= self.timeout_seconds {
                return Err(HarnessError::WaitTimeout {
                    waited_seconds: self.elapsed_seconds,
                });
            }
            self.tick_once();
        }
    }
}
