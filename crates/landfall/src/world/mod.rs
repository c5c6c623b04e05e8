mod diplomacy;

pub use diplomacy::Diplomacy;

use tracing::{debug, info};

pub const SHIP_SPEED_TILES_PER_SECOND: f32 = 5.0;
pub const MOVE_ARRIVAL_THRESHOLD: f32 = 0.05;
pub const PICK_RADIUS_TILES: f32 = 0.75;
pub const SETTLEMENT_RADIUS_TILES: f32 = 12.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ship,
    Warehouse,
    Lumberjack,
    Fisher,
    Tree,
}

impl EntityKind {
    pub fn is_building(self) -> bool {
        !matches!(self, EntityKind::Ship)
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: PlayerId,
    pub position: Vec2,
    pub selectable: bool,
    pub move_target: Option<Vec2>,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ai: bool,
    pub colonize: Option<ColonizePlan>,
}

/// Countdown an AI player runs before founding its first settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColonizePlan {
    pub remaining_seconds: f32,
    pub site: Vec2,
}

#[derive(Debug, Clone)]
pub struct Settlement {
    pub owner: PlayerId,
    pub warehouse: EntityId,
    pub center: Vec2,
    pub buildings: Vec<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("no settlement of player {owner:?} within range of build site")]
    NoSettlementInRange { owner: PlayerId },
}

#[derive(Debug, Default)]
pub struct World {
    next_entity_id: u64,
    entities: Vec<Entity>,
    players: Vec<Player>,
    settlements: Vec<Settlement>,
    pub diplomacy: Diplomacy,
}

impl World {
    pub fn add_player(&mut self, name: impl Into<String>, ai: bool) -> PlayerId {
        let id = PlayerId(self.players.len() as u8);
        self.players.push(Player {
            id,
            name: name.into(),
            ai,
            colonize: None,
        });
        id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn find_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn set_colonize_plan(&mut self, player: PlayerId, plan: ColonizePlan) {
        if let Some(player) = self.find_player_mut(player) {
            player.colonize = Some(plan);
        }
    }

    fn alloc_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        id
    }

    pub fn next_entity_id(&self) -> u64 {
        self.next_entity_id
    }

    /// Bumps the id allocator so it never hands out anything below `next`.
    pub fn reserve_entity_ids(&mut self, next: u64) {
        self.next_entity_id = self.next_entity_id.max(next);
    }

    /// Spawns an entity with a caller-chosen id. The allocator is bumped past
    /// it so later spawns never collide; savegame loading relies on this to
    /// reconstruct identical ids.
    pub fn spawn_with_id(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        owner: PlayerId,
        position: Vec2,
        selectable: bool,
    ) -> EntityId {
        self.next_entity_id = self.next_entity_id.max(id.0.saturating_add(1));
        self.entities.push(Entity {
            id,
            kind,
            owner,
            position,
            selectable,
            move_target: None,
        });
        id
    }

    pub fn spawn_ship(&mut self, owner: PlayerId, position: Vec2) -> EntityId {
        let id = self.alloc_entity_id();
        self.spawn_with_id(id, EntityKind::Ship, owner, position, true)
    }

    pub fn spawn_building(&mut self, owner: PlayerId, kind: EntityKind, position: Vec2) -> EntityId {
        let id = self.alloc_entity_id();
        self.spawn_with_id(id, kind, owner, position, true)
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|entity| entity.id != id);
        for settlement in &mut self.settlements {
            settlement.buildings.retain(|building| *building != id);
        }
        before != self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.find_entity(id).map(|entity| entity.position)
    }

    /// Topmost selectable entity near `position`. Later spawns win on overlap.
    pub fn pick_topmost_at(&self, position: Vec2, radius: f32) -> Option<EntityId> {
        let mut best: Option<EntityId> = None;
        for entity in &self.entities {
            if !entity.selectable {
                continue;
            }
            if entity.position.distance(position) > radius {
                continue;
            }
            match best {
                Some(current) if current.0 >= entity.id.0 => {}
                _ => best = Some(entity.id),
            }
        }
        best
    }

    /// Ground-map lookup: the building occupying `position`, if any.
    pub fn building_at(&self, position: Vec2) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|entity| {
                entity.kind.is_building()
                    && entity.position.distance(position) <= MOVE_ARRIVAL_THRESHOLD
            })
            .map(|entity| entity.id)
    }

    pub fn order_move(&mut self, id: EntityId, target: Vec2) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) if entity.kind == EntityKind::Ship => {
                entity.move_target = Some(target);
                true
            }
            _ => false,
        }
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn settlements_of(&self, owner: PlayerId) -> impl Iterator<Item = &Settlement> {
        self.settlements
            .iter()
            .filter(move |settlement| settlement.owner == owner)
    }

    pub fn found_settlement(&mut self, owner: PlayerId, center: Vec2) -> EntityId {
        let warehouse = self.spawn_building(owner, EntityKind::Warehouse, center);
        self.settlements.push(Settlement {
            owner,
            warehouse,
            center,
            buildings: vec![warehouse],
        });
        info!(
            owner = owner.0,
            x = center.x,
            y = center.y,
            "settlement_founded"
        );
        warehouse
    }

    pub fn register_settlement(&mut self, settlement: Settlement) {
        self.settlements.push(settlement);
    }

    pub fn add_building_to_settlement(&mut self, owner: PlayerId, building: EntityId, position: Vec2) -> bool {
        let settlement = self.settlements.iter_mut().find(|settlement| {
            settlement.owner == owner
                && settlement.center.distance(position) <= SETTLEMENT_RADIUS_TILES
        });
        match settlement {
            Some(settlement) => {
                settlement.buildings.push(building);
                true
            }
            None => false,
        }
    }

    /// Places a building for `owner`. The site must lie within one of the
    /// owner's settlements.
    pub fn build(
        &mut self,
        owner: PlayerId,
        kind: EntityKind,
        position: Vec2,
    ) -> Result<EntityId, BuildError> {
        let in_range = self.settlements.iter().any(|settlement| {
            settlement.owner == owner
                && settlement.center.distance(position) <= SETTLEMENT_RADIUS_TILES
        });
        if !in_range {
            return Err(BuildError::NoSettlementInRange { owner });
        }
        let id = self.spawn_building(owner, kind, position);
        let added = self.add_building_to_settlement(owner, id, position);
        debug_assert!(added);
        info!(owner = owner.0, kind = ?kind, x = position.x, y = position.y, "building_placed");
        Ok(id)
    }

    /// Removes a non-warehouse building. Warehouses anchor their settlement
    /// and cannot be torn down.
    pub fn demolish(&mut self, id: EntityId) -> bool {
        match self.find_entity(id) {
            Some(entity) if entity.kind.is_building() && entity.kind != EntityKind::Warehouse => {
                self.despawn(id)
            }
            _ => false,
        }
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        for entity in &mut self.entities {
            if let Some(target) = entity.move_target {
                let (next, arrived) = step_toward(
                    entity.position,
                    target,
                    SHIP_SPEED_TILES_PER_SECOND,
                    dt_seconds,
                    MOVE_ARRIVAL_THRESHOLD,
                );
                entity.position = next;
                if arrived {
                    entity.move_target = None;
                }
            }
        }

        let mut founded = Vec::new();
        for player in &mut self.players {
            let Some(plan) = player.colonize.as_mut() else {
                continue;
            };
            plan.remaining_seconds -= dt_seconds;
            if plan.remaining_seconds <= 0.0 {
                founded.push((player.id, plan.site));
                player.colonize = None;
            }
        }
        for (owner, site) in founded {
            debug!(owner = owner.0, "ai_colonize_complete");
            self.found_settlement(owner, site);
        }
    }
}

/// Moves `current` toward `target`, snapping exactly onto the target once
/// within the arrival threshold or reachable this step.
pub fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance_sq = dx * dx + dy * dy;
    if distance_sq <= arrival_threshold * arrival_threshold {
        return (target, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed * dt_seconds;
    if max_step >= distance {
        return (target, true);
    }

    let inv_distance = distance.recip();
    (
        Vec2 {
            x: current.x + dx * inv_distance * max_step,
            y: current.y + dy * inv_distance * max_step,
        },
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_player() -> (World, PlayerId) {
        let mut world = World::default();
        let player = world.add_player("Player", false);
        (world, player)
    }

    #[test]
    fn entity_ids_are_never_reused() {
        let (mut world, player) = world_with_player();
        let first = world.spawn_ship(player, Vec2::new(0.0, 0.0));
        world.despawn(first);
        let second = world.spawn_ship(player, Vec2::new(1.0, 1.0));
        assert_ne!(first, second);
        assert!(second.0 > first.0);
    }

    #[test]
    fn spawn_with_id_bumps_allocator_past_it() {
        let (mut world, player) = world_with_player();
        world.spawn_with_id(EntityId(7), EntityKind::Ship, player, Vec2::default(), true);
        let next = world.spawn_ship(player, Vec2::default());
        assert_eq!(next, EntityId(8));
    }

    #[test]
    fn despawn_is_idempotent() {
        let (mut world, player) = world_with_player();
        let ship = world.spawn_ship(player, Vec2::default());
        assert!(world.despawn(ship));
        assert!(!world.despawn(ship));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn pick_topmost_prefers_latest_spawn_on_overlap() {
        let (mut world, player) = world_with_player();
        let first = world.spawn_ship(player, Vec2::new(5.0, 5.0));
        let second = world.spawn_ship(player, Vec2::new(5.0, 5.0));
        let picked = world.pick_topmost_at(Vec2::new(5.0, 5.0), PICK_RADIUS_TILES);
        assert_eq!(picked, Some(second));
        assert_ne!(picked, Some(first));
    }

    #[test]
    fn pick_returns_none_for_empty_water() {
        let (mut world, player) = world_with_player();
        world.spawn_ship(player, Vec2::new(5.0, 5.0));
        assert_eq!(world.pick_topmost_at(Vec2::new(20.0, 20.0), PICK_RADIUS_TILES), None);
    }

    #[test]
    fn pick_ignores_non_selectable_entities() {
        let (mut world, player) = world_with_player();
        let ship = world.spawn_ship(player, Vec2::new(5.0, 5.0));
        world.find_entity_mut(ship).unwrap().selectable = false;
        assert_eq!(world.pick_topmost_at(Vec2::new(5.0, 5.0), PICK_RADIUS_TILES), None);
    }

    #[test]
    fn moving_ship_snaps_exactly_onto_target() {
        let (mut world, player) = world_with_player();
        let ship = world.spawn_ship(player, Vec2::new(0.0, 0.0));
        assert!(world.order_move(ship, Vec2::new(3.0, 0.0)));

        for _ in 0..120 {
            world.tick(1.0 / 60.0);
        }

        let entity = world.find_entity(ship).unwrap();
        assert_eq!(entity.position, Vec2::new(3.0, 0.0));
        assert!(entity.move_target.is_none());
    }

    #[test]
    fn order_move_rejects_buildings() {
        let (mut world, player) = world_with_player();
        let warehouse = world.found_settlement(player, Vec2::new(10.0, 10.0));
        assert!(!world.order_move(warehouse, Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn ai_player_founds_settlement_after_countdown() {
        let (mut world, _) = world_with_player();
        let ai = world.add_player("AI 1", true);
        world.set_colonize_plan(
            ai,
            ColonizePlan {
                remaining_seconds: 1.0,
                site: Vec2::new(68.0, 23.0),
            },
        );
        assert!(world.settlements().is_empty());

        for _ in 0..90 {
            world.tick(1.0 / 60.0);
        }

        assert_eq!(world.settlements().len(), 1);
        let settlement = &world.settlements()[0];
        assert_eq!(settlement.owner, ai);
        let warehouse = world.find_entity(settlement.warehouse).unwrap();
        assert_eq!(warehouse.kind, EntityKind::Warehouse);
        assert_eq!(warehouse.position, Vec2::new(68.0, 23.0));
    }

    #[test]
    fn build_requires_settlement_in_range() {
        let (mut world, player) = world_with_player();
        let err = world
            .build(player, EntityKind::Lumberjack, Vec2::new(5.0, 5.0))
            .unwrap_err();
        assert_eq!(err, BuildError::NoSettlementInRange { owner: player });

        world.found_settlement(player, Vec2::new(5.0, 5.0));
        let lumberjack = world
            .build(player, EntityKind::Lumberjack, Vec2::new(8.0, 5.0))
            .unwrap();
        assert_eq!(world.building_at(Vec2::new(8.0, 5.0)), Some(lumberjack));
        assert!(world.settlements()[0].buildings.contains(&lumberjack));
    }

    #[test]
    fn build_outside_settlement_radius_fails() {
        let (mut world, player) = world_with_player();
        world.found_settlement(player, Vec2::new(0.0, 0.0));
        let err = world
            .build(player, EntityKind::Tree, Vec2::new(50.0, 0.0))
            .unwrap_err();
        assert_eq!(err, BuildError::NoSettlementInRange { owner: player });
    }

    #[test]
    fn demolish_removes_building_and_settlement_entry() {
        let (mut world, player) = world_with_player();
        world.found_settlement(player, Vec2::new(0.0, 0.0));
        let tree = world.build(player, EntityKind::Tree, Vec2::new(2.0, 0.0)).unwrap();

        assert!(world.demolish(tree));
        assert!(world.find_entity(tree).is_none());
        assert!(!world.settlements()[0].buildings.contains(&tree));
    }

    #[test]
    fn demolish_refuses_warehouses_and_ships() {
        let (mut world, player) = world_with_player();
        let warehouse = world.found_settlement(player, Vec2::new(0.0, 0.0));
        let ship = world.spawn_ship(player, Vec2::new(3.0, 3.0));
        assert!(!world.demolish(warehouse));
        assert!(!world.demolish(ship));
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn step_toward_moves_by_speed_times_dt_without_overshoot() {
        let (next, arrived) = step_toward(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            2.0,
            0.5,
            0.05,
        );
        assert!(!arrived);
        assert!((next.x - 1.0).abs() < 0.0001);
        assert!((next.y - 0.0).abs() < 0.0001);
    }

    #[test]
    fn step_toward_snaps_within_threshold() {
        let (next, arrived) = step_toward(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.03, 0.0),
            5.0,
            1.0 / 60.0,
            0.05,
        );
        assert!(arrived);
        assert_eq!(next, Vec2::new(0.03, 0.0));
    }

    #[test]
    fn building_at_matches_exact_tile_only() {
        let (mut world, player) = world_with_player();
        world.found_settlement(player, Vec2::new(10.0, 10.0));
        assert!(world.building_at(Vec2::new(10.0, 10.0)).is_some());
        assert!(world.building_at(Vec2::new(11.0, 10.0)).is_none());
    }
}
