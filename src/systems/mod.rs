mod movement;
mod regrowth;

pub use movement::MovementSystem;
pub use regrowth::RegrowthSystem;
