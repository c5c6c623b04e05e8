use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::View;
use crate::world::{
    ColonizePlan, EntityId, EntityKind, PlayerId, Settlement, Vec2, World,
};

pub const SAVE_VERSION: u32 = 1;
pub const QUICKSAVE_FILE: &str = "quicksave.json";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("create save dir '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write save '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("read save '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse save json at {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("validation failed at {path}: {message}")]
    Validate { path: String, message: String },
}

fn validation_err(path: &str, message: impl Into<String>) -> SaveError {
    SaveError::Validate {
        path: path.to_string(),
        message: message.into(),
    }
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> SaveError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedVec2 {
    pub x: f32,
    pub y: f32,
}

impl SavedVec2 {
    fn from_vec2(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }

    fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavedEntityKind {
    Ship,
    Warehouse,
    Lumberjack,
    Fisher,
    Tree,
}

impl SavedEntityKind {
    fn from_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Ship => Self::Ship,
            EntityKind::Warehouse => Self::Warehouse,
            EntityKind::Lumberjack => Self::Lumberjack,
            EntityKind::Fisher => Self::Fisher,
            EntityKind::Tree => Self::Tree,
        }
    }

    fn to_kind(self) -> EntityKind {
        match self {
            Self::Ship => EntityKind::Ship,
            Self::Warehouse => EntityKind::Warehouse,
            Self::Lumberjack => EntityKind::Lumberjack,
            Self::Fisher => EntityKind::Fisher,
            Self::Tree => EntityKind::Tree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedColonizePlan {
    pub remaining_seconds: f32,
    pub site: SavedVec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub id: u8,
    pub name: String,
    pub ai: bool,
    pub colonize: Option<SavedColonizePlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAllyPair {
    pub a: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    pub id: u64,
    pub kind: SavedEntityKind,
    pub owner: u8,
    pub position: SavedVec2,
    pub selectable: bool,
    pub move_target: Option<SavedVec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSettlement {
    pub owner: u8,
    pub warehouse_id: u64,
    pub center: SavedVec2,
    pub building_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub save_version: u32,
    pub camera_center: SavedVec2,
    pub next_entity_id: u64,
    pub players: Vec<SavedPlayer>,
    pub allies: Vec<SavedAllyPair>,
    pub entities: Vec<SavedEntity>,
    pub settlements: Vec<SavedSettlement>,
}

pub fn build_save(world: &World, view: &View) -> SaveGame {
    let mut allies: Vec<SavedAllyPair> = world
        .diplomacy
        .ally_pairs()
        .map(|(a, b)| SavedAllyPair { a: a.0, b: b.0 })
        .collect();
    allies.sort_by_key(|pair| (pair.a, pair.b));

    SaveGame {
        save_version: SAVE_VERSION,
        camera_center: SavedVec2::from_vec2(view.center()),
        next_entity_id: world.next_entity_id(),
        players: world
            .players()
            .iter()
            .map(|player| SavedPlayer {
                id: player.id.0,
                name: player.name.clone(),
                ai: player.ai,
                colonize: player.colonize.map(|plan| SavedColonizePlan {
                    remaining_seconds: plan.remaining_seconds,
                    site: SavedVec2::from_vec2(plan.site),
                }),
            })
            .collect(),
        allies,
        entities: world
            .entities()
            .iter()
            .map(|entity| SavedEntity {
                id: entity.id.0,
                kind: SavedEntityKind::from_kind(entity.kind),
                owner: entity.owner.0,
                position: SavedVec2::from_vec2(entity.position),
                selectable: entity.selectable,
                move_target: entity.move_target.map(SavedVec2::from_vec2),
            })
            .collect(),
        settlements: world
            .settlements()
            .iter()
            .map(|settlement| SavedSettlement {
                owner: settlement.owner.0,
                warehouse_id: settlement.warehouse.0,
                center: SavedVec2::from_vec2(settlement.center),
                building_ids: settlement
                    .buildings
                    .iter()
                    .map(|building| building.0)
                    .collect(),
            })
            .collect(),
    }
}

fn check_finite(path: &str, value: f32) -> Result<(), SaveError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(expected_actual(path, "finite number", value))
    }
}

pub fn validate_save(save: &SaveGame) -> Result<(), SaveError> {
    if save.save_version != SAVE_VERSION {
        return Err(expected_actual(
            "save_version",
            SAVE_VERSION,
            save.save_version,
        ));
    }
    check_finite("camera_center.x", save.camera_center.x)?;
    check_finite("camera_center.y", save.camera_center.y)?;

    for (index, player) in save.players.iter().enumerate() {
        if player.id as usize != index {
            return Err(expected_actual(
                &format!("players[{index}].id"),
                index,
                player.id,
            ));
        }
        if let Some(plan) = player.colonize {
            check_finite(
                &format!("players[{index}].colonize.remaining_seconds"),
                plan.remaining_seconds,
            )?;
            check_finite(&format!("players[{index}].colonize.site.x"), plan.site.x)?;
            check_finite(&format!("players[{index}].colonize.site.y"), plan.site.y)?;
        }
    }
    let player_known = |id: u8| (id as usize) < save.players.len();

    for (index, pair) in save.allies.iter().enumerate() {
        let path = format!("allies[{index}]");
        if pair.a == pair.b {
            return Err(validation_err(&path, "self ally pair"));
        }
        if !player_known(pair.a) || !player_known(pair.b) {
            return Err(validation_err(
                &path,
                format!("references unknown player ({}, {})", pair.a, pair.b),
            ));
        }
    }

    let mut known_ids = std::collections::HashMap::with_capacity(save.entities.len());
    for (index, entity) in save.entities.iter().enumerate() {
        let id_path = format!("entities[{index}].id");
        if let Some(first_index) = known_ids.insert(entity.id, index) {
            return Err(validation_err(
                &id_path,
                format!(
                    "duplicate id {} (first seen at entities[{first_index}].id)",
                    entity.id
                ),
            ));
        }
        if !player_known(entity.owner) {
            return Err(validation_err(
                &format!("entities[{index}].owner"),
                format!("references unknown player {}", entity.owner),
            ));
        }
        check_finite(&format!("entities[{index}].position.x"), entity.position.x)?;
        check_finite(&format!("entities[{index}].position.y"), entity.position.y)?;
        if let Some(target) = entity.move_target {
            check_finite(&format!("entities[{index}].move_target.x"), target.x)?;
            check_finite(&format!("entities[{index}].move_target.y"), target.y)?;
            if entity.kind != SavedEntityKind::Ship {
                return Err(validation_err(
                    &format!("entities[{index}].move_target"),
                    "only ships may carry move targets",
                ));
            }
        }
    }

    if let Some(max_used) = save.entities.iter().map(|entity| entity.id).max() {
        if save.next_entity_id <= max_used {
            return Err(validation_err(
                "next_entity_id",
                format!(
                    "expected value greater than max used id {max_used}, got {}",
                    save.next_entity_id
                ),
            ));
        }
    }

    for (index, settlement) in save.settlements.iter().enumerate() {
        if !player_known(settlement.owner) {
            return Err(validation_err(
                &format!("settlements[{index}].owner"),
                format!("references unknown player {}", settlement.owner),
            ));
        }
        check_finite(&format!("settlements[{index}].center.x"), settlement.center.x)?;
        check_finite(&format!("settlements[{index}].center.y"), settlement.center.y)?;

        let warehouse_path = format!("settlements[{index}].warehouse_id");
        match known_ids.get(&settlement.warehouse_id) {
            Some(entity_index) => {
                if save.entities[*entity_index].kind != SavedEntityKind::Warehouse {
                    return Err(validation_err(
                        &warehouse_path,
                        format!("entity {} is not a warehouse", settlement.warehouse_id),
                    ));
                }
            }
            None => {
                return Err(validation_err(
                    &warehouse_path,
                    format!("references unknown id {}", settlement.warehouse_id),
                ));
            }
        }
        if !settlement.building_ids.contains(&settlement.warehouse_id) {
            return Err(validation_err(
                &warehouse_path,
                "warehouse missing from settlement building list",
            ));
        }
        for (building_index, building_id) in settlement.building_ids.iter().enumerate() {
            let path = format!("settlements[{index}].building_ids[{building_index}]");
            match known_ids.get(building_id) {
                Some(entity_index) => {
                    if save.entities[*entity_index].kind == SavedEntityKind::Ship {
                        return Err(validation_err(
                            &path,
                            format!("entity {building_id} is a ship, not a building"),
                        ));
                    }
                }
                None => {
                    return Err(validation_err(
                        &path,
                        format!("references unknown id {building_id}"),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Reconstructs a world from a validated save. Entity ids come back
/// identical, so a follow-up save of the loaded world is equivalent to the
/// original.
pub fn apply_save(save: SaveGame) -> (World, Vec2) {
    let mut world = World::default();
    for player in &save.players {
        let id = world.add_player(player.name.clone(), player.ai);
        if let Some(plan) = player.colonize {
            world.set_colonize_plan(
                id,
                ColonizePlan {
                    remaining_seconds: plan.remaining_seconds,
                    site: plan.site.to_vec2(),
                },
            );
        }
    }
    for pair in &save.allies {
        world
            .diplomacy
            .add_ally_pair(PlayerId(pair.a), PlayerId(pair.b));
    }
    for entity in &save.entities {
        let id = world.spawn_with_id(
            EntityId(entity.id),
            entity.kind.to_kind(),
            PlayerId(entity.owner),
            entity.position.to_vec2(),
            entity.selectable,
        );
        if let Some(target) = entity.move_target {
            if let Some(spawned) = world.find_entity_mut(id) {
                spawned.move_target = Some(target.to_vec2());
            }
        }
    }
    world.reserve_entity_ids(save.next_entity_id);
    for settlement in &save.settlements {
        world.register_settlement(Settlement {
            owner: PlayerId(settlement.owner),
            warehouse: EntityId(settlement.warehouse_id),
            center: settlement.center.to_vec2(),
            buildings: settlement
                .building_ids
                .iter()
                .map(|id| EntityId(*id))
                .collect(),
        });
    }

    let camera = save.camera_center.to_vec2();
    (world, camera)
}

pub fn quicksave_path(save_dir: &Path) -> PathBuf {
    save_dir.join(QUICKSAVE_FILE)
}

pub fn write_quicksave(save_dir: &Path, world: &World, view: &View) -> Result<PathBuf, SaveError> {
    let save = build_save(world, view);
    fs::create_dir_all(save_dir).map_err(|source| SaveError::CreateDir {
        path: save_dir.to_path_buf(),
        source,
    })?;
    let json = serde_json::to_string_pretty(&save).map_err(SaveError::Encode)?;
    let path = quicksave_path(save_dir);
    fs::write(&path, json).map_err(|source| SaveError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn parse_save_json(raw: &str) -> Result<SaveGame, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveGame>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        SaveError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

pub fn read_quicksave(save_dir: &Path) -> Result<SaveGame, SaveError> {
    let path = quicksave_path(save_dir);
    let raw = fs::read_to_string(&path).map_err(|source| SaveError::Read {
        path: path.clone(),
        source,
    })?;
    let save = parse_save_json(&raw)?;
    validate_save(&save)?;
    Ok(save)
}
