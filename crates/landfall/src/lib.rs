mod app;
mod config;
mod fixture;
mod gui;
mod input;
mod render;
mod savegame;
mod session;
mod world;

pub use app::{run_client, ClientError};
pub use config::{ClientConfig, SessionConfig};
pub use fixture::{
    BuildingSetup, FixtureError, PlayerSetup, SettlementSetup, ShipSetup, WorldSetup,
};
pub use gui::{overview_widget_for, widgets, Gui, GuiAction, GuiError, Widget, OVERVIEW_WIDGETS};
pub use input::{
    EventManager, IngameKeyListener, Key, KeyEvent, KeyListener, ListenerId, MouseButton,
    AUTOSCROLL_STEP_PX_PER_SECOND,
};
pub use render::{screen_to_world, world_to_screen, Renderer, Viewport, PIXELS_PER_TILE};
pub use savegame::{
    build_save, parse_save_json, quicksave_path, read_quicksave, validate_save, write_quicksave,
    SaveError, SaveGame, QUICKSAVE_FILE, SAVE_VERSION,
};
pub use session::{
    layers, BuildTool, CursorTool, RendererLayer, RendererRegistry, SelectionTool, Session,
    TearingTool, ToolContext, ToolTransition, View,
};
pub use world::{
    step_toward, BuildError, ColonizePlan, Diplomacy, Entity, EntityId, EntityKind, Player,
    PlayerId, Settlement, Vec2, World, MOVE_ARRIVAL_THRESHOLD, PICK_RADIUS_TILES,
    SETTLEMENT_RADIUS_TILES, SHIP_SPEED_TILES_PER_SECOND,
};
