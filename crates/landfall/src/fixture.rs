use thiserror::Error;
use tracing::warn;

use crate::world::{ColonizePlan, EntityKind, PlayerId, Vec2, World};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("parse fixture xml: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("fixture root element must be <fixture>, got <{found}>")]
    UnexpectedRoot { found: String },
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    #[error("<{element}> references unknown player {owner}")]
    UnknownOwner { element: &'static str, owner: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSetup {
    pub name: String,
    pub ai: bool,
    pub colonize: Option<ColonizePlan>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipSetup {
    pub owner: u8,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingSetup {
    pub kind: EntityKind,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementSetup {
    pub owner: u8,
    pub center: Vec2,
    pub buildings: Vec<BuildingSetup>,
}

/// Declarative starting state for a session: parsed from a fixture document
/// or generated for the default development map.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSetup {
    pub name: String,
    pub players: Vec<PlayerSetup>,
    pub ships: Vec<ShipSetup>,
    pub settlements: Vec<SettlementSetup>,
}

impl WorldSetup {
    /// Open water, one human player with a ship, and `ai_players` AI players
    /// that will each found a settlement shortly after the session starts.
    pub fn dev_map(ai_players: u32) -> Self {
        let mut players = vec![PlayerSetup {
            name: "Player".to_string(),
            ai: false,
            colonize: None,
        }];
        let mut ships = vec![ShipSetup {
            owner: 0,
            position: Vec2::new(60.0, 4.0),
        }];
        for i in 0..ai_players {
            let owner = players.len() as u8;
            players.push(PlayerSetup {
                name: format!("AI {}", i + 1),
                ai: true,
                colonize: Some(ColonizePlan {
                    remaining_seconds: 1.5 + i as f32 * 0.5,
                    site: Vec2::new(68.0 + 5.0 * i as f32, 23.0 + 2.0 * i as f32),
                }),
            });
            ships.push(ShipSetup {
                owner,
                position: Vec2::new(70.0 + 4.0 * i as f32, 20.0),
            });
        }
        Self {
            name: "dev_map".to_string(),
            players,
            ships,
            settlements: Vec::new(),
        }
    }

    pub fn from_xml(xml: &str) -> Result<Self, FixtureError> {
        let document = roxmltree::Document::parse(xml)?;
        let root = document.root_element();
        if root.tag_name().name() != "fixture" {
            return Err(FixtureError::UnexpectedRoot {
                found: root.tag_name().name().to_string(),
            });
        }
        let name = root.attribute("name").unwrap_or("fixture").to_string();

        let mut players = Vec::new();
        let mut ships = Vec::new();
        let mut settlements = Vec::new();

        for node in root.children().filter(|node| node.is_element()) {
            match node.tag_name().name() {
                "player" => {
                    players.push(PlayerSetup {
                        name: require_attr(&node, "player", "name")?.to_string(),
                        ai: parse_bool_attr(&node, "player", "ai")?,
                        colonize: None,
                    });
                }
                "ship" => {
                    ships.push(ShipSetup {
                        owner: parse_u8_attr(&node, "ship", "owner")?,
                        position: parse_position(&node, "ship")?,
                    });
                }
                "settlement" => {
                    let owner = parse_u8_attr(&node, "settlement", "owner")?;
                    let center = parse_position(&node, "settlement")?;
                    let mut buildings = Vec::new();
                    for child in node.children().filter(|child| child.is_element()) {
                        if child.tag_name().name() != "building" {
                            continue;
                        }
                        buildings.push(BuildingSetup {
                            kind: parse_building_kind(&child)?,
                            position: parse_position(&child, "building")?,
                        });
                    }
                    settlements.push(SettlementSetup {
                        owner,
                        center,
                        buildings,
                    });
                }
                _ => {}
            }
        }

        let player_count = players.len() as u8;
        for ship in &ships {
            if ship.owner >= player_count {
                return Err(FixtureError::UnknownOwner {
                    element: "ship",
                    owner: ship.owner,
                });
            }
        }
        for settlement in &settlements {
            if settlement.owner >= player_count {
                return Err(FixtureError::UnknownOwner {
                    element: "settlement",
                    owner: settlement.owner,
                });
            }
        }

        Ok(Self {
            name,
            players,
            ships,
            settlements,
        })
    }

    pub fn build_world(&self) -> World {
        let mut world = World::default();
        for player in &self.players {
            let id = world.add_player(player.name.clone(), player.ai);
            if let Some(plan) = player.colonize {
                world.set_colonize_plan(id, plan);
            }
        }
        for ship in &self.ships {
            world.spawn_ship(PlayerId(ship.owner), ship.position);
        }
        for settlement in &self.settlements {
            let owner = PlayerId(settlement.owner);
            world.found_settlement(owner, settlement.center);
            for building in &settlement.buildings {
                if let Err(error) = world.build(owner, building.kind, building.position) {
                    warn!(error = %error, "fixture_building_skipped");
                }
            }
        }
        world
    }
}

fn require_attr<'a>(
    node: &roxmltree::Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, FixtureError> {
    node.attribute(attribute)
        .ok_or(FixtureError::MissingAttribute { element, attribute })
}

fn parse_bool_attr(
    node: &roxmltree::Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<bool, FixtureError> {
    match node.attribute(attribute) {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(value) => Err(FixtureError::InvalidAttribute {
            element,
            attribute,
            value: value.to_string(),
        }),
    }
}

fn parse_u8_attr(
    node: &roxmltree::Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<u8, FixtureError> {
    let raw = require_attr(node, element, attribute)?;
    raw.parse().map_err(|_| FixtureError::InvalidAttribute {
        element,
        attribute,
        value: raw.to_string(),
    })
}

fn parse_f32_attr(
    node: &roxmltree::Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<f32, FixtureError> {
    let raw = require_attr(node, element, attribute)?;
    let value: f32 = raw.parse().map_err(|_| FixtureError::InvalidAttribute {
        element,
        attribute,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(FixtureError::InvalidAttribute {
            element,
            attribute,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn parse_position(
    node: &roxmltree::Node<'_, '_>,
    element: &'static str,
) -> Result<Vec2, FixtureError> {
    Ok(Vec2::new(
        parse_f32_attr(node, element, "x")?,
        parse_f32_attr(node, element, "y")?,
    ))
}

fn parse_building_kind(node: &roxmltree::Node<'_, '_>) -> Result<EntityKind, FixtureError> {
    let raw = require_attr(node, "building", "kind")?;
    match raw {
        "lumberjack" => Ok(EntityKind::Lumberjack),
        "fisher" => Ok(EntityKind::Fisher),
        "tree" => Ok(EntityKind::Tree),
        other => Err(FixtureError::InvalidAttribute {
            element: "building",
            attribute: "kind",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <fixture name="ai_settlement">
            <player name="Player" />
            <player name="AI 1" ai="true" />
            <ship owner="0" x="60.0" y="10.0" />
            <settlement owner="1" x="68.0" y="23.0">
                <building kind="lumberjack" x="66.0" y="25.0" />
            </settlement>
        </fixture>
    "#;

    #[test]
    fn parses_players_ships_and_settlements() {
        let setup = WorldSetup::from_xml(SAMPLE).expect("parse");
        assert_eq!(setup.name, "ai_settlement");
        assert_eq!(setup.players.len(), 2);
        assert!(setup.players[1].ai);
        assert_eq!(setup.ships.len(), 1);
        assert_eq!(setup.ships[0].position, Vec2::new(60.0, 10.0));
        assert_eq!(setup.settlements.len(), 1);
        assert_eq!(setup.settlements[0].buildings.len(), 1);
        assert_eq!(
            setup.settlements[0].buildings[0].kind,
            EntityKind::Lumberjack
        );
    }

    #[test]
    fn build_world_founds_settlements_with_warehouses() {
        let setup = WorldSetup::from_xml(SAMPLE).expect("parse");
        let world = setup.build_world();
        assert_eq!(world.settlements().len(), 1);
        let settlement = &world.settlements()[0];
        assert_eq!(settlement.owner, PlayerId(1));
        // Warehouse plus the fixture lumberjack.
        assert_eq!(settlement.buildings.len(), 2);
        assert!(world.building_at(Vec2::new(68.0, 23.0)).is_some());
        assert!(world.building_at(Vec2::new(66.0, 25.0)).is_some());
    }

    #[test]
    fn rejects_ship_with_unknown_owner() {
        let xml = r#"<fixture><player name="Solo" /><ship owner="3" x="0" y="0" /></fixture>"#;
        let err = WorldSetup::from_xml(xml).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::UnknownOwner {
                element: "ship",
                owner: 3
            }
        ));
    }

    #[test]
    fn rejects_missing_coordinates() {
        let xml = r#"<fixture><player name="Solo" /><ship owner="0" x="1.0" /></fixture>"#;
        let err = WorldSetup::from_xml(xml).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::MissingAttribute {
                element: "ship",
                attribute: "y"
            }
        ));
    }

    #[test]
    fn rejects_unknown_building_kind() {
        let xml = r#"
            <fixture>
                <player name="Solo" />
                <settlement owner="0" x="0" y="0">
                    <building kind="castle" x="1" y="1" />
                </settlement>
            </fixture>
        "#;
        let err = WorldSetup::from_xml(xml).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidAttribute { .. }));
    }

    #[test]
    fn rejects_wrong_root_element() {
        let err = WorldSetup::from_xml("<scenario />").unwrap_err();
        assert!(matches!(err, FixtureError::UnexpectedRoot { .. }));
    }

    #[test]
    fn dev_map_scales_with_ai_player_count() {
        let empty = WorldSetup::dev_map(0);
        assert_eq!(empty.players.len(), 1);
        assert_eq!(empty.ships.len(), 1);

        let three = WorldSetup::dev_map(3);
        assert_eq!(three.players.len(), 4);
        assert_eq!(three.ships.len(), 4);
        assert!(three.players[1..].iter().all(|player| player.ai));
        assert!(three.players[1..]
            .iter()
            .all(|player| player.colonize.is_some()));
    }

    #[test]
    fn dev_map_world_has_no_settlements_at_start() {
        let world = WorldSetup::dev_map(2).build_world();
        assert!(world.settlements().is_empty());
        assert_eq!(world.players().len(), 3);
    }
}
