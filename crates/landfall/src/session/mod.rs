mod cursor;
mod renderers;
mod view;

pub use cursor::{BuildTool, CursorTool, SelectionTool, TearingTool, ToolContext, ToolTransition};
pub use renderers::{layers, RendererLayer, RendererRegistry};
pub use view::View;

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::fixture::WorldSetup;
use crate::gui::{overview_widget_for, widgets, Gui, GuiAction, GuiError};
use crate::input::MouseButton;
use crate::savegame::{self, SaveGame};
use crate::world::{EntityId, EntityKind, PlayerId, Vec2, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TradePartner {
    ship: EntityId,
    warehouse: EntityId,
}

/// One running game: the view, the render layer registry, the active cursor
/// tool, the world, and the open widget set. All collaborators are owned and
/// injected here; nothing reaches through globals.
pub struct Session {
    pub view: View,
    pub renderers: RendererRegistry,
    pub world: World,
    pub gui: Gui,
    cursor: Box<dyn CursorTool>,
    selected: Vec<EntityId>,
    trade_partner: Option<TradePartner>,
    pending_found: Option<EntityId>,
    pending_load: Option<SaveGame>,
    config: SessionConfig,
    local_player: PlayerId,
}

impl Session {
    pub fn new(config: SessionConfig, setup: &WorldSetup) -> Self {
        let world = setup.build_world();
        let local_player = world
            .players()
            .iter()
            .find(|player| !player.ai)
            .map(|player| player.id)
            .unwrap_or(PlayerId(0));
        Self {
            view: View::default(),
            renderers: RendererRegistry::default(),
            world,
            gui: Gui::with_mainhud(),
            cursor: Box::<SelectionTool>::default(),
            selected: Vec::new(),
            trade_partner: None,
            pending_found: None,
            pending_load: None,
            config,
            local_player,
        }
    }

    pub fn local_player(&self) -> PlayerId {
        self.local_player
    }

    pub fn selected(&self) -> &[EntityId] {
        &self.selected
    }

    pub fn cursor_tool(&self) -> &dyn CursorTool {
        self.cursor.as_ref()
    }

    pub fn cursor_tool_mut(&mut self) -> &mut dyn CursorTool {
        self.cursor.as_mut()
    }

    pub fn replace_cursor_tool(&mut self, tool: Box<dyn CursorTool>) {
        info!(tool = tool.name(), "cursor_tool_swapped");
        self.cursor = tool;
    }

    pub fn select(&mut self, ids: &[EntityId]) {
        set_selection(&self.world, &mut self.gui, &mut self.selected, ids);
    }

    pub fn cursor_click(&mut self, position: Vec2, button: MouseButton, shift: bool) {
        if button == MouseButton::Left {
            if let Some(ship) = self.pending_found.take() {
                let owner = self
                    .world
                    .find_entity(ship)
                    .map(|entity| entity.owner)
                    .unwrap_or(self.local_player);
                self.world.found_settlement(owner, position);
                return;
            }
        }

        let transition = self.cursor.on_click(
            position,
            button,
            ToolContext {
                world: &mut self.world,
                gui: &mut self.gui,
                selected: &mut self.selected,
                player: self.local_player,
                shift,
            },
        );
        if transition == ToolTransition::SwitchToSelection {
            self.replace_cursor_tool(Box::<SelectionTool>::default());
        }
    }

    /// Dispatches a named UI event against an open widget, exactly as a
    /// click on that widget's button would.
    pub fn trigger(&mut self, widget: &str, path: &str) -> Result<(), GuiError> {
        let action = self.gui.resolve(widget, path)?;
        match action {
            GuiAction::OpenTrade => self.open_trade_window(),
            GuiAction::FoundSettlement => self.arm_found_settlement(),
            GuiAction::OpenBuildMenu => self.gui.open(widgets::BUILD_MENU),
            GuiAction::OpenBuildRelated => self.gui.open(widgets::FARM_OVERVIEW_BUILDRELATED),
            GuiAction::ArmBuild(kind) => self.replace_cursor_tool(Box::new(BuildTool::new(kind))),
        }
        Ok(())
    }

    fn arm_found_settlement(&mut self) {
        let ship = self.selected.first().copied().filter(|id| {
            self.world
                .find_entity(*id)
                .is_some_and(|entity| entity.kind == EntityKind::Ship)
        });
        if let Some(ship) = ship {
            debug!(ship = ship.0, "found_settlement_armed");
            self.pending_found = Some(ship);
        }
    }

    fn open_trade_window(&mut self) {
        let Some(ship_id) = self.selected.first().copied() else {
            return;
        };
        let Some(ship) = self.world.find_entity(ship_id) else {
            return;
        };
        if ship.kind != EntityKind::Ship {
            return;
        }

        let ship_owner = ship.owner;
        let ship_position = ship.position;
        let trade_range = self.config.trade_range_tiles;
        let partner = self
            .world
            .entities()
            .iter()
            .filter(|entity| {
                entity.kind == EntityKind::Warehouse
                    && entity.owner != ship_owner
                    && self.world.diplomacy.are_allies(entity.owner, ship_owner)
                    && entity.position.distance(ship_position) <= trade_range
            })
            .min_by(|a, b| {
                a.position
                    .distance(ship_position)
                    .total_cmp(&b.position.distance(ship_position))
            })
            .map(|entity| entity.id);

        match partner {
            Some(warehouse) => {
                self.gui.open(widgets::BUY_SELL_GOODS);
                self.trade_partner = Some(TradePartner {
                    ship: ship_id,
                    warehouse,
                });
                info!(ship = ship_id.0, warehouse = warehouse.0, "trade_window_opened");
            }
            None => debug!(ship = ship_id.0, "trade_unavailable"),
        }
    }

    /// Closes the trade window (and only it) once the ship drifts out of
    /// range of its partner warehouse. The ship overview stays open.
    fn refresh_trade_window(&mut self) {
        let Some(partner) = self.trade_partner else {
            return;
        };
        let in_range = self
            .world
            .position_of(partner.ship)
            .zip(self.world.position_of(partner.warehouse))
            .is_some_and(|(ship, warehouse)| {
                ship.distance(warehouse) <= self.config.trade_range_tiles
            });
        if !in_range {
            self.gui.close(widgets::BUY_SELL_GOODS);
            self.trade_partner = None;
            info!("trade_window_closed");
        }
    }

    fn prune_dead_selection(&mut self) {
        let before = self.selected.len();
        let world = &self.world;
        self.selected.retain(|id| world.find_entity(*id).is_some());
        if before != self.selected.len() && self.selected.is_empty() {
            self.gui.close_overviews();
        }
    }

    pub fn quicksave(&mut self) {
        match savegame::write_quicksave(&self.config.save_dir, &self.world, &self.view) {
            Ok(path) => info!(path = %path.display(), "quicksave_written"),
            Err(error) => {
                warn!(error = %error, "quicksave_failed");
                self.gui.open(widgets::POPUP_WINDOW);
            }
        }
    }

    /// Reads and validates the quicksave now; the loaded state is applied on
    /// the next tick, with the loading screen shown until then.
    pub fn request_quickload(&mut self) {
        match savegame::read_quicksave(&self.config.save_dir) {
            Ok(save) => {
                self.pending_load = Some(save);
                self.gui.open(widgets::LOADINGSCREEN);
                info!("quickload_started");
            }
            Err(error) => {
                warn!(error = %error, "quickload_failed");
                self.gui.open(widgets::POPUP_WINDOW);
            }
        }
    }

    pub fn quicksave_path(&self) -> std::path::PathBuf {
        savegame::quicksave_path(&self.config.save_dir)
    }

    fn apply_loaded(&mut self, save: SaveGame) {
        let (world, camera) = savegame::apply_save(save);
        self.world = world;
        self.view.center_on(camera.x, camera.y);
        self.selected.clear();
        self.trade_partner = None;
        self.pending_found = None;
        self.gui.close_overviews();
        self.gui.close(widgets::BUY_SELL_GOODS);
        info!("quickload_applied");
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        if let Some(save) = self.pending_load.take() {
            self.apply_loaded(save);
            self.gui.close(widgets::LOADINGSCREEN);
        }
        self.view.tick(dt_seconds);
        self.world.tick(dt_seconds);
        self.refresh_trade_window();
        self.prune_dead_selection();
    }
}

/// Replaces the selection and swaps the matching overview widget in. Shared
/// between the scripted `select` entry point and the selection tool.
pub(crate) fn set_selection(
    world: &World,
    gui: &mut Gui,
    selected: &mut Vec<EntityId>,
    ids: &[EntityId],
) {
    selected.clear();
    selected.extend(
        ids.iter()
            .copied()
            .filter(|id| world.find_entity(*id).is_some()),
    );
    gui.close_overviews();
    if let Some(first) = selected.first() {
        if let Some(entity) = world.find_entity(*first) {
            gui.open(overview_widget_for(entity.kind));
        }
    }
}
