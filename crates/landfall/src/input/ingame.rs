use std::collections::HashSet;

use crate::session::{layers, Session, TearingTool};

use super::{Key, KeyEvent, KeyListener};

pub const AUTOSCROLL_STEP_PX_PER_SECOND: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BeginAction {
    Scroll { dx: f32, dy: f32 },
    ToggleGrid,
    SwapToTearingTool,
    MarkCursorDebug,
    Quicksave,
    Quickload,
}

impl BeginAction {
    fn for_key(key: Key) -> Option<Self> {
        const STEP: f32 = AUTOSCROLL_STEP_PX_PER_SECOND;
        match key {
            Key::Left => Some(Self::Scroll { dx: -STEP, dy: 0.0 }),
            Key::Right => Some(Self::Scroll { dx: STEP, dy: 0.0 }),
            Key::Up => Some(Self::Scroll { dx: 0.0, dy: -STEP }),
            Key::Down => Some(Self::Scroll { dx: 0.0, dy: STEP }),
            Key::T => Some(Self::ToggleGrid),
            Key::X => Some(Self::SwapToTearingTool),
            Key::D => Some(Self::MarkCursorDebug),
            Key::F5 => Some(Self::Quicksave),
            Key::F9 => Some(Self::Quickload),
            _ => None,
        }
    }
}

/// Translates in-game key transitions into view scroll, render layer, cursor
/// tool, and savegame calls.
///
/// Presses are edge-triggered: holding a key repeats the host's key-down
/// events, but the begin action fires only on the 0-to-1 transition.
/// Direction releases are level-triggered: the inverse scroll delta is always
/// applied, so scroll state is restored even if the held set and the physical
/// keyboard state drifted apart.
#[derive(Debug, Default)]
pub struct IngameKeyListener {
    keys_pressed: HashSet<Key>,
}

impl IngameKeyListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    fn run_begin(&self, action: BeginAction, session: &mut Session) {
        match action {
            BeginAction::Scroll { dx, dy } => session.view.autoscroll(dx, dy),
            BeginAction::ToggleGrid => {
                session.renderers.toggle(layers::GRID);
            }
            BeginAction::SwapToTearingTool => {
                session.replace_cursor_tool(Box::<TearingTool>::default());
            }
            BeginAction::MarkCursorDebug => session.cursor_tool_mut().set_debug(true),
            BeginAction::Quicksave => session.quicksave(),
            BeginAction::Quickload => session.request_quickload(),
        }
    }
}

impl KeyListener for IngameKeyListener {
    fn key_pressed(&mut self, event: &mut KeyEvent, session: &mut Session) {
        let key = event.key();
        let Some(action) = BeginAction::for_key(key) else {
            return;
        };
        let was_held = !self.keys_pressed.insert(key);
        if !was_held {
            self.run_begin(action, session);
        }
        event.consume();
    }

    fn key_released(&mut self, event: &mut KeyEvent, session: &mut Session) {
        let key = event.key();
        // Remove-if-present: releasing an untracked key is expected, not an
        // error.
        self.keys_pressed.remove(&key);
        if let Some(BeginAction::Scroll { dx, dy }) = BeginAction::for_key(key) {
            session.view.autoscroll(-dx, -dy);
            event.consume();
        }
    }
}
