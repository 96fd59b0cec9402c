pub mod components;
pub mod engine;
pub mod render;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod systems;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use scenario::{ConfigError, Scenario, ScenarioLoader};
pub use world::{World, WorldSnapshot};
