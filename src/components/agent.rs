use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::FactionId;

pub type AgentId = usize;

/// Unit steps an agent may take in one tick, including standing still.
const MOVES: [(i64, i64); 5] = [(0, 1), (0, -1), (1, 0), (-1, 0), (0, 0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn display_color(self) -> &'static str {
        match self {
            Gender::Male => "blue",
            Gender::Female => "pink",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Food,
    Wood,
    Stone,
    Gold,
    Weapons,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub position: Position,
    pub gender: Gender,
    pub faction: Option<FactionId>,
    pub inventory: BTreeMap<Item, u32>,
    pub energy: u32,
    pub mood: String,
}

impl Agent {
    pub fn new(name: impl Into<String>, position: Position, gender: Gender) -> Self {
        Self {
            name: name.into(),
            position,
            gender,
            faction: None,
            inventory: default_inventory(),
            energy: 10,
            mood: "neutral".to_string(),
        }
    }

    pub fn display_color(&self) -> &'static str {
        self.gender.display_color()
    }

    /// Takes one random unit step (or stays put), clamped to the grid.
    pub fn step<R: Rng + ?Sized>(&mut self, width: usize, height: usize, rng: &mut R) {
        let (dx, dy) = MOVES[rng.gen_range(0..MOVES.len())];
        self.position = Position {
            x: clamp_axis(self.position.x, dx, width),
            y: clamp_axis(self.position.y, dy, height),
        };
    }
}

fn default_inventory() -> BTreeMap<Item, u32> {
    BTreeMap::from([
        (Item::Food, 1),
        (Item::Wood, 0),
        (Item::Stone, 0),
        (Item::Gold, 0),
        (Item::Weapons, 0),
    ])
}

fn clamp_axis(value: usize, delta: i64, extent: usize) -> usize {
    let max = extent.saturating_sub(1) as i64;
    (value as i64 + delta).clamp(0, max) as usize
}
