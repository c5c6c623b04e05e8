//! Regression scenarios driven through the scripted GUI harness, covering
//! selection, trading, save/load, and build flows.

use landfall::{widgets, EntityId, EntityKind, Key, MouseButton, Session, Vec2};

use crate::harness::{GuiDriver, ScenarioConfig};

fn get_player_ship(session: &Session) -> EntityId {
    let local = session.local_player();
    session
        .world
        .entities()
        .iter()
        .find(|entity| entity.kind == EntityKind::Ship && entity.owner == local)
        .map(|entity| entity.id)
        .expect("scenario setup includes a player ship")
}

#[test]
fn selecting_a_freshly_spawned_frigate_is_safe() {
    let mut gui = GuiDriver::new(ScenarioConfig::default()).expect("driver");

    let player = gui.session().local_player();
    let ship = gui
        .session_mut()
        .world
        .spawn_ship(player, Vec2::new(68.0, 10.0));
    gui.session_mut().view.center_on(68.0, 10.0);

    // Low-level selection through the cursor.
    gui.cursor_move(68.0, 10.0);
    gui.cursor_click(68.0, 10.0, MouseButton::Left);
    assert_eq!(gui.session().selected(), &[ship]);

    gui.select(&[ship]);
    assert_eq!(gui.session().selected(), &[ship]);
    assert!(gui.find(widgets::OVERVIEW_TRADE_SHIP).is_some());
}

#[test]
fn selecting_an_ai_players_warehouse_is_safe() {
    // More AI players settle sooner; the wait below is on the first of them.
    let mut gui = GuiDriver::new(ScenarioConfig {
        ai_players: 3,
        ..ScenarioConfig::default()
    })
    .expect("driver");

    gui.run_until(|session| !session.world.settlements().is_empty())
        .expect("an ai player settles");

    let ai_warehouse = gui.world().settlements()[0].warehouse;
    gui.select(&[ai_warehouse]);

    assert_eq!(gui.session().selected(), &[ai_warehouse]);
    assert!(gui.find(widgets::OVERVIEW_WAREHOUSE).is_some());
}

#[test]
fn trade_widget_closes_when_ship_moves_away_but_overview_stays() {
    let mut gui = GuiDriver::new(ScenarioConfig {
        fixture: Some("ai_settlement"),
        timeout_seconds: 60.0,
        ..ScenarioConfig::default()
    })
    .expect("driver");

    let ship = get_player_ship(gui.session());
    gui.select(&[ship]);

    // Ally players so they can trade.
    let owner = gui.world().find_entity(ship).expect("ship").owner;
    let others: Vec<_> = gui
        .world()
        .players()
        .iter()
        .map(|player| player.id)
        .filter(|id| *id != owner)
        .collect();
    for other in others {
        gui.session_mut().world.diplomacy.add_ally_pair(owner, other);
    }

    // Move the ship to the foreign warehouse and wait for it to arrive.
    gui.cursor_click(68.0, 23.0, MouseButton::Right);
    gui.run_until(move |session| {
        session.world.position_of(ship) == Some(Vec2::new(68.0, 23.0))
    })
    .expect("ship reaches warehouse");

    gui.trigger(widgets::OVERVIEW_TRADE_SHIP, "trade/action/default")
        .expect("trade trigger");
    assert!(gui.find(widgets::BUY_SELL_GOODS).is_some());

    // Move the ship away from the warehouse.
    gui.cursor_click(77.0, 17.0, MouseButton::Right);
    gui.run_until(move |session| {
        session.world.position_of(ship) == Some(Vec2::new(77.0, 17.0))
    })
    .expect("ship leaves warehouse");

    // The trade widget is gone, the ship overview is not.
    assert!(gui.find(widgets::BUY_SELL_GOODS).is_none());
    assert!(gui.find(widgets::OVERVIEW_TRADE_SHIP).is_some());
}

#[test]
fn quicksave_quickload_quicksave_shows_no_error_popup() {
    let save_dir = tempfile::tempdir().expect("tempdir");
    let mut gui = GuiDriver::new(ScenarioConfig {
        save_dir: Some(save_dir.path().to_path_buf()),
        ..ScenarioConfig::default()
    })
    .expect("driver");

    gui.tap_key(Key::F5);
    gui.run_for_seconds(2.0);
    assert!(gui.find(widgets::POPUP_WINDOW).is_none());
    assert!(gui.session().quicksave_path().exists());

    gui.tap_key(Key::F9);
    assert!(gui.find(widgets::LOADINGSCREEN).is_some());
    gui.run_until(|session| !session.gui.is_open(widgets::LOADINGSCREEN))
        .expect("load applies");

    gui.tap_key(Key::F5);
    gui.run_for_seconds(1.0);
    assert!(gui.find(widgets::POPUP_WINDOW).is_none());
}

#[test]
fn build_related_tab_stays_open_through_building() {
    let mut gui = GuiDriver::new(ScenarioConfig::default()).expect("driver");

    let ship = get_player_ship(gui.session());
    gui.select(&[ship]);
    gui.cursor_click(59.0, 1.0, MouseButton::Right);
    gui.run_until(move |session| session.world.position_of(ship) == Some(Vec2::new(59.0, 1.0)))
        .expect("ship reaches coast");

    // Found a settlement.
    gui.trigger(widgets::OVERVIEW_TRADE_SHIP, "found_settlement/action/default")
        .expect("found trigger");
    gui.cursor_click(56.0, 3.0, MouseButton::Left);
    assert_eq!(gui.world().settlements().len(), 1);

    // Build a lumberjack from the build menu.
    gui.trigger(widgets::MAINHUD, "build/action/default")
        .expect("build menu");
    gui.trigger(widgets::BUILD_MENU, "button_5/action/default")
        .expect("lumberjack button");
    gui.cursor_click(52.0, 7.0, MouseButton::Left);
    let lumberjack = gui
        .world()
        .building_at(Vec2::new(52.0, 7.0))
        .expect("lumberjack placed");

    // Select it and open the build-related tab.
    gui.select(&[lumberjack]);
    gui.trigger(widgets::TAB_BASE, "1/action/default")
        .expect("build related tab");

    // Plant a tree without uninterrupted building.
    gui.trigger(widgets::FARM_OVERVIEW_BUILDRELATED, "build17/action/default")
        .expect("tree button");
    gui.cursor_click(49.0, 6.0, MouseButton::Left);
    assert!(gui.world().building_at(Vec2::new(49.0, 6.0)).is_some());
    assert!(gui.find(widgets::FARM_OVERVIEW_BUILDRELATED).is_some());

    // Plant another with shift held: the tool stays armed and the tab stays.
    gui.trigger(widgets::FARM_OVERVIEW_BUILDRELATED, "build17/action/default")
        .expect("tree button again");
    gui.cursor_click_shifted(49.0, 7.0, MouseButton::Left);
    assert!(gui.world().building_at(Vec2::new(49.0, 7.0)).is_some());
    assert_eq!(gui.session().cursor_tool().name(), "build");
    assert!(gui.find(widgets::FARM_OVERVIEW_BUILDRELATED).is_some());
}

#[test]
fn selecting_a_sequence_of_buildings_is_safe() {
    let mut gui = GuiDriver::new(ScenarioConfig {
        fixture: Some("coastal_works"),
        timeout_seconds: 60.0,
        ..ScenarioConfig::default()
    })
    .expect("driver");

    let (lumberjack, fisher, warehouse) = {
        let world = gui.world();
        let lumberjack = world.building_at(Vec2::new(23.0, 63.0)).expect("lumberjack");
        let fisher = world.building_at(Vec2::new(20.0, 67.0)).expect("fisher");
        let warehouse = world.building_at(Vec2::new(18.0, 63.0)).expect("warehouse");
        assert_eq!(
            world.find_entity(lumberjack).unwrap().kind,
            EntityKind::Lumberjack
        );
        assert_eq!(world.find_entity(fisher).unwrap().kind, EntityKind::Fisher);
        assert_eq!(
            world.find_entity(warehouse).unwrap().kind,
            EntityKind::Warehouse
        );
        (lumberjack, fisher, warehouse)
    };

    gui.select(&[fisher]);
    gui.run_for_seconds(0.1);
    assert!(gui.find(widgets::TAB_BASE).is_some());

    gui.select(&[lumberjack]);
    gui.run_for_seconds(0.1);
    assert_eq!(gui.session().selected(), &[lumberjack]);
    assert!(gui.find(widgets::TAB_BASE).is_some());

    gui.select(&[warehouse]);
    gui.run_for_seconds(0.1);
    assert!(gui.find(widgets::OVERVIEW_WAREHOUSE).is_some());
    assert!(gui.find(widgets::TAB_BASE).is_none());
}
