use tracing::{debug, info};

use crate::gui::Gui;
use crate::input::MouseButton;
use crate::world::{EntityId, EntityKind, PlayerId, Vec2, World, PICK_RADIUS_TILES};

use super::set_selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTransition {
    Keep,
    SwitchToSelection,
}

/// Mutable session state a tool may act on during a click.
pub struct ToolContext<'a> {
    pub world: &'a mut World,
    pub gui: &'a mut Gui,
    pub selected: &'a mut Vec<EntityId>,
    pub player: PlayerId,
    pub shift: bool,
}

/// The active pointer-interaction mode. The session owns exactly one tool at
/// a time and replaces it wholesale on tool switches.
pub trait CursorTool {
    fn name(&self) -> &'static str;

    fn debug(&self) -> bool;

    fn set_debug(&mut self, debug: bool);

    fn on_click(
        &mut self,
        position: Vec2,
        button: MouseButton,
        ctx: ToolContext<'_>,
    ) -> ToolTransition;
}

/// Default tool: left click selects the topmost entity under the cursor,
/// right click orders the selected ship to move.
#[derive(Debug, Default)]
pub struct SelectionTool {
    debug: bool,
}

impl CursorTool for SelectionTool {
    fn name(&self) -> &'static str {
        "selection"
    }

    fn debug(&self) -> bool {
        self.debug
    }

    fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn on_click(
        &mut self,
        position: Vec2,
        button: MouseButton,
        ctx: ToolContext<'_>,
    ) -> ToolTransition {
        match button {
            MouseButton::Left => {
                let picked = ctx.world.pick_topmost_at(position, PICK_RADIUS_TILES);
                let ids: Vec<EntityId> = picked.into_iter().collect();
                set_selection(ctx.world, ctx.gui, ctx.selected, &ids);
            }
            MouseButton::Right => {
                let moved = ctx.selected.first().copied().is_some_and(|id| {
                    let owned_ship = ctx
                        .world
                        .find_entity(id)
                        .is_some_and(|entity| entity.kind == EntityKind::Ship && entity.owner == ctx.player);
                    owned_ship && ctx.world.order_move(id, position)
                });
                if moved {
                    debug!(x = position.x, y = position.y, "move_order_issued");
                }
            }
        }
        ToolTransition::Keep
    }
}

/// Demolition tool (`X` key): left click tears down an own building under
/// the cursor. Right click drops back to selection.
#[derive(Debug, Default)]
pub struct TearingTool {
    debug: bool,
}

impl CursorTool for TearingTool {
    fn name(&self) -> &'static str {
        "tearing"
    }

    fn debug(&self) -> bool {
        self.debug
    }

    fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn on_click(
        &mut self,
        position: Vec2,
        button: MouseButton,
        ctx: ToolContext<'_>,
    ) -> ToolTransition {
        match button {
            MouseButton::Left => {
                let target = ctx.world.building_at(position).filter(|id| {
                    ctx.world
                        .find_entity(*id)
                        .is_some_and(|entity| entity.owner == ctx.player)
                });
                if let Some(id) = target {
                    if ctx.world.demolish(id) {
                        info!(entity = id.0, "building_torn");
                    }
                }
                ToolTransition::Keep
            }
            MouseButton::Right => ToolTransition::SwitchToSelection,
        }
    }
}

/// Placement tool armed from the build menus. Without shift the tool drops
/// back to selection after a successful placement; with shift held it stays
/// armed (uninterrupted building).
#[derive(Debug)]
pub struct BuildTool {
    kind: EntityKind,
    debug: bool,
}

impl BuildTool {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind, debug: false }
    }

    pub fn building_kind(&self) -> EntityKind {
        self.kind
    }
}

impl CursorTool for BuildTool {
    fn name(&self) -> &'static str {
        "build"
    }

    fn debug(&self) -> bool {
        self.debug
    }

    fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn on_click(
        &mut self,
        position: Vec2,
        button: MouseButton,
        ctx: ToolContext<'_>,
    ) -> ToolTransition {
        match button {
            MouseButton::Left => match ctx.world.build(ctx.player, self.kind, position) {
                Ok(_) => {
                    if ctx.shift {
                        ToolTransition::Keep
                    } else {
                        ToolTransition::SwitchToSelection
                    }
                }
                Err(error) => {
                    debug!(error = %error, "build_rejected");
                    ToolTransition::Keep
                }
            },
            MouseButton::Right => ToolTransition::SwitchToSelection,
        }
    }
}
