use rand::Rng;
use serde::{Deserialize, Serialize};

use super::FactionId;

/// Number of empty ticks a tile tolerates before a resource grows back.
/// The counter has to climb past this value, so regrowth lands on the 16th
/// empty tick.
pub const REGROW_THRESHOLD: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Forest,
    Plains,
    Mountains,
    River,
}

impl Biome {
    pub const ALL: [Biome; 4] = [Biome::Forest, Biome::Plains, Biome::Mountains, Biome::River];

    /// Weights over `[none, food, wood, stone, gold]` used when a tile is
    /// first populated.
    pub fn initial_weights(self) -> [u32; 5] {
        match self {
            Biome::Forest => [80, 10, 5, 5, 5],
            Biome::Plains => [40, 30, 10, 20, 5],
            Biome::Mountains => [5, 10, 50, 35, 5],
            Biome::River => [25, 25, 25, 25, 5],
        }
    }

    /// Weights over `[food, wood, stone, gold]` used when an empty tile
    /// regrows.
    pub fn regrowth_weights(self) -> [u32; 4] {
        match self {
            Biome::Forest => [70, 20, 5, 5],
            Biome::Plains => [50, 30, 10, 10],
            Biome::Mountains => [5, 5, 60, 30],
            Biome::River => [25, 25, 25, 25],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Food,
    Wood,
    Stone,
    Gold,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Food, Resource::Wood, Resource::Stone, Resource::Gold];

    pub fn display_color(resource: Option<Resource>) -> &'static str {
        match resource {
            Some(Resource::Food) => "lightgreen",
            Some(Resource::Wood) => "brown",
            Some(Resource::Stone) => "gray",
            Some(Resource::Gold) => "yellow",
            None => "white",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Livestock {
    Cow,
    Pig,
    Chicken,
}

/// Livestock draw: one slot per animal plus ten empty slots.
const LIVESTOCK_SLOTS: [Option<Livestock>; 13] = [
    Some(Livestock::Cow),
    Some(Livestock::Pig),
    Some(Livestock::Chicken),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub biome: Biome,
    pub resource: Option<Resource>,
    pub livestock: Option<Livestock>,
    pub building: Option<String>,
    pub territory: Option<FactionId>,
    pub regrow_counter: u32,
}

impl Tile {
    pub fn new(biome: Biome) -> Self {
        Self {
            biome,
            resource: None,
            livestock: None,
            building: None,
            territory: None,
            regrow_counter: 0,
        }
    }

    pub fn initialize_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let slot = weighted_slot(rng, &self.biome.initial_weights());
        self.resource = slot.checked_sub(1).map(|index| Resource::ALL[index]);
        self.livestock = LIVESTOCK_SLOTS[rng.gen_range(0..LIVESTOCK_SLOTS.len())];
    }

    /// Advances the regrowth timer of an empty tile. Tiles that still hold a
    /// resource are left as they are.
    pub fn tick_regrowth<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.resource.is_some() {
            return;
        }
        self.regrow_counter += 1;
        if self.regrow_counter > REGROW_THRESHOLD {
            let slot = weighted_slot(rng, &self.biome.regrowth_weights());
            self.resource = Some(Resource::ALL[slot]);
            self.regrow_counter = 0;
        }
    }

    /// Empties the tile, returning what was there.
    pub fn clear_resource(&mut self) -> Option<Resource> {
        self.resource.take()
    }
}

/// Picks an index with probability proportional to its weight. Weight tables
/// are compile-time constants with a positive sum.
fn weighted_slot<R: Rng + ?Sized>(rng: &mut R, weights: &[u32]) -> usize {
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (index, weight) in weights.iter().enumerate() {
        if roll < *weight {
            return index;
        }
        roll -= weight;
    }
    weights.len() - 1
}
