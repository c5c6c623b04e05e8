use thiserror::Error;
use tracing::debug;

use crate::world::EntityKind;

/// Widget names the in-game screens register under. Kept as constants so
/// session code and scripted drivers address the same strings.
pub mod widgets {
    pub const MAINHUD: &str = "mainhud";
    pub const OVERVIEW_TRADE_SHIP: &str = "overview_trade_ship";
    pub const OVERVIEW_WAREHOUSE: &str = "overview_warehouse";
    pub const TAB_BASE: &str = "tab_base";
    pub const BUILD_MENU: &str = "tab";
    pub const FARM_OVERVIEW_BUILDRELATED: &str = "farm_overview_buildrelated";
    pub const BUY_SELL_GOODS: &str = "buy_sell_goods";
    pub const LOADINGSCREEN: &str = "loadingscreen";
    pub const POPUP_WINDOW: &str = "popup_window";
}

/// Widgets tied to the current selection; opening a new overview closes all
/// of these first.
pub const OVERVIEW_WIDGETS: &[&str] = &[
    widgets::OVERVIEW_TRADE_SHIP,
    widgets::OVERVIEW_WAREHOUSE,
    widgets::TAB_BASE,
    widgets::FARM_OVERVIEW_BUILDRELATED,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    name: String,
}

impl Widget {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiAction {
    OpenTrade,
    FoundSettlement,
    OpenBuildMenu,
    OpenBuildRelated,
    ArmBuild(EntityKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuiError {
    #[error("widget '{name}' is not open")]
    WidgetNotOpen { name: String },
    #[error("widget '{widget}' has no event '{path}'")]
    UnknownEvent { widget: String, path: String },
}

fn handlers_for(widget: &str) -> &'static [(&'static str, GuiAction)] {
    match widget {
        widgets::OVERVIEW_TRADE_SHIP => &[
            ("trade/action/default", GuiAction::OpenTrade),
            ("found_settlement/action/default", GuiAction::FoundSettlement),
        ],
        widgets::MAINHUD => &[("build/action/default", GuiAction::OpenBuildMenu)],
        widgets::BUILD_MENU => &[
            ("button_5/action/default", GuiAction::ArmBuild(EntityKind::Lumberjack)),
            ("button_9/action/default", GuiAction::ArmBuild(EntityKind::Fisher)),
        ],
        widgets::TAB_BASE => &[("1/action/default", GuiAction::OpenBuildRelated)],
        widgets::FARM_OVERVIEW_BUILDRELATED => &[
            ("build17/action/default", GuiAction::ArmBuild(EntityKind::Tree)),
        ],
        _ => &[],
    }
}

/// The set of currently open widgets, looked up by name. Order is opening
/// order; opening an already open widget is a no-op.
#[derive(Debug, Default)]
pub struct Gui {
    open: Vec<Widget>,
}

impl Gui {
    pub fn with_mainhud() -> Self {
        let mut gui = Self::default();
        gui.open(widgets::MAINHUD);
        gui
    }

    pub fn open(&mut self, name: &str) {
        if self.is_open(name) {
            return;
        }
        debug!(widget = name, "widget_opened");
        self.open.push(Widget { name: name.to_string() });
    }

    pub fn close(&mut self, name: &str) -> bool {
        let before = self.open.len();
        self.open.retain(|widget| widget.name != name);
        let closed = before != self.open.len();
        if closed {
            debug!(widget = name, "widget_closed");
        }
        closed
    }

    pub fn find(&self, name: &str) -> Option<&Widget> {
        self.open.iter().find(|widget| widget.name == name)
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn open_widgets(&self) -> &[Widget] {
        &self.open
    }

    pub fn close_overviews(&mut self) {
        for name in OVERVIEW_WIDGETS {
            self.close(name);
        }
    }

    /// Resolves a scripted UI event against an open widget.
    pub fn resolve(&self, widget: &str, path: &str) -> Result<GuiAction, GuiError> {
        if !self.is_open(widget) {
            return Err(GuiError::WidgetNotOpen {
                name: widget.to_string(),
            });
        }
        handlers_for(widget)
            .iter()
            .find(|(event, _)| *event == path)
            .map(|(_, action)| *action)
            .ok_or_else(|| GuiError::UnknownEvent {
                widget: widget.to_string(),
                path: path.to_string(),
            })
    }
}

pub fn overview_widget_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Ship => widgets::OVERVIEW_TRADE_SHIP,
        EntityKind::Warehouse => widgets::OVERVIEW_WAREHOUSE,
        EntityKind::Lumberjack | EntityKind::Fisher | EntityKind::Tree => widgets::TAB_BASE,
    }
}
