mod agent;
mod faction;
mod tile;

pub use agent::{Agent, AgentId, Gender, Item, Position};
pub use faction::{Faction, FactionId};
pub use tile::{Biome, Livestock, Resource, Tile, REGROW_THRESHOLD};
