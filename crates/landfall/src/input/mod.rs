mod ingame;
mod keys;
mod manager;

pub use ingame::{IngameKeyListener, AUTOSCROLL_STEP_PX_PER_SECOND};
pub use keys::{Key, KeyEvent, KeyListener, MouseButton};
pub use manager::{EventManager, ListenerId};
