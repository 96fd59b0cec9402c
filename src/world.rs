use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Agent, Biome, Faction, Gender, Position, Resource, Tile};

/// Ordered, append-only record of plain-text simulation events.
///
/// Only the newest `capacity` messages are retained. Every message is also
/// forwarded to `tracing`.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<String>,
    capacity: usize,
    total: u64,
}

impl ActionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "civsim::log", "{message}");
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
        self.total += 1;
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages ever pushed, including those no longer retained.
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub biome: Biome,
    pub resource: Option<Resource>,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub name: String,
    pub position: Position,
    pub color: String,
}

/// Read-only view handed to presenters after each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub size: usize,
    /// Row-major, `size * size` entries.
    pub tiles: Vec<TileSnapshot>,
    pub agents: Vec<AgentSnapshot>,
}

impl WorldSnapshot {
    pub fn tile(&self, x: usize, y: usize) -> Option<&TileSnapshot> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.tiles.get(y * self.size + x)
    }
}

pub struct World {
    size: usize,
    tick: u64,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) agents: Vec<Agent>,
    pub(crate) factions: Vec<Faction>,
    log: ActionLog,
}

impl World {
    /// Assembles a world from explicit parts. `tiles` must hold
    /// `size * size` entries in row-major order.
    pub fn from_parts(
        size: usize,
        tiles: Vec<Tile>,
        agents: Vec<Agent>,
        factions: Vec<Faction>,
        log_capacity: usize,
    ) -> Self {
        debug_assert_eq!(tiles.len(), size * size);
        Self {
            size,
            tick: 0,
            tiles,
            agents,
            factions,
            log: ActionLog::new(log_capacity),
        }
    }

    /// Populates a fresh world: terrain first, then agents, then factions.
    pub fn generate<R: Rng + ?Sized>(
        size: usize,
        agent_count: usize,
        faction_colors: &[String],
        log_capacity: usize,
        rng: &mut R,
    ) -> Self {
        // Cells draw from a per-world palette, so some biomes may be
        // over-represented or missing entirely.
        let palette: Vec<Biome> = (0..size)
            .map(|_| Biome::ALL[rng.gen_range(0..Biome::ALL.len())])
            .collect();
        let tiles = (0..size * size)
            .map(|_| {
                let mut tile = Tile::new(palette[rng.gen_range(0..palette.len())]);
                tile.initialize_random(&mut *rng);
                tile
            })
            .collect();

        let agents = (0..agent_count)
            .map(|i| {
                let position = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
                let gender = if rng.gen_bool(0.5) {
                    Gender::Male
                } else {
                    Gender::Female
                };
                Agent::new(format!("Agent{i}"), position, gender)
            })
            .collect();

        let mut world = Self::from_parts(size, tiles, agents, Vec::new(), log_capacity);
        for (i, color) in faction_colors.iter().enumerate() {
            let faction = Faction::new(format!("Faction{i}"), color.clone());
            world.log(format!("Faction created: {}", faction.name));
            world.factions.push(faction);
        }
        tracing::debug!(
            size,
            agents = world.agents.len(),
            factions = world.factions.len(),
            "world generated"
        );
        world
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.tiles.get(y * self.size + x)
    }

    pub fn tile_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.tiles.get_mut(y * self.size + x)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    /// Runs tax collection for one faction. Nothing in the tick loop calls
    /// this.
    pub fn collect_taxes(&mut self, faction: usize) -> Option<u64> {
        let agents = &self.agents;
        self.factions
            .get_mut(faction)
            .map(|faction| faction.collect_taxes(agents))
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.log.push(message);
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.log
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            size: self.size,
            tiles: self
                .tiles
                .iter()
                .map(|tile| TileSnapshot {
                    biome: tile.biome,
                    resource: tile.resource,
                    color: Resource::display_color(tile.resource).to_string(),
                })
                .collect(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentSnapshot {
                    name: agent.name.clone(),
                    position: agent.position,
                    color: agent.display_color().to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn colors() -> Vec<String> {
        vec!["red".into(), "green".into()]
    }

    #[test]
    fn generate_populates_grid_agents_and_factions() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let world = World::generate(20, 5, &colors(), 100, &mut rng);

        assert_eq!(world.tiles().len(), 400);
        assert_eq!(world.agents().len(), 5);
        assert_eq!(world.agents()[4].name, "Agent4");
        assert!(world
            .agents()
            .iter()
            .all(|a| a.position.x < 20 && a.position.y < 20 && a.faction.is_none()));
        assert_eq!(world.factions()[1].name, "Faction1");
        assert_eq!(world.factions()[1].color, "green");
        assert!(world.tiles().iter().all(|t| t.building.is_none()
            && t.territory.is_none()
            && t.regrow_counter == 0));

        let log: Vec<_> = world.action_log().entries().collect();
        assert_eq!(log, ["Faction created: Faction0", "Faction created: Faction1"]);
    }

    #[test]
    fn tile_lookup_is_row_major_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut world = World::generate(10, 0, &colors(), 10, &mut rng);
        world.tile_mut(3, 7).unwrap().resource = Some(Resource::Gold);
        assert_eq!(world.tiles()[7 * 10 + 3].resource, Some(Resource::Gold));
        assert!(world.tile(10, 0).is_none());
        assert!(world.tile(0, 10).is_none());

        let snapshot = world.snapshot();
        assert_eq!(snapshot.tile(3, 7).unwrap().color, "yellow");
    }

    #[test]
    fn action_log_drops_oldest_beyond_capacity() {
        let mut log = ActionLog::new(2);
        log.push("one");
        log.push("two");
        log.push("three");
        assert_eq!(log.entries().collect::<Vec<_>>(), ["two", "three"]);
        assert_eq!(log.last(), Some("three"));
        assert_eq!(log.total(), 3);
    }

    #[test]
    fn collect_taxes_goes_through_world() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut world = World::generate(10, 3, &colors(), 10, &mut rng);
        for id in 0..3 {
            world.factions[0].add_member(id);
        }
        assert_eq!(world.collect_taxes(0), Some(15));
        assert_eq!(world.factions()[0].resources[&Resource::Gold], 15);
        assert_eq!(world.collect_taxes(9), None);
    }
}
