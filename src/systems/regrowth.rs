use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Advances the regrowth timer of every tile. Not part of the default
/// system set; the runner registers it only when a scenario opts in.
pub struct RegrowthSystem;

impl RegrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegrowthSystem {
    fn name(&self) -> &str {
        "regrowth"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut regrown = 0usize;
        for tile in world.tiles.iter_mut() {
            let was_empty = tile.resource.is_none();
            tile.tick_regrowth(rng);
            if was_empty && tile.resource.is_some() {
                regrown += 1;
            }
        }
        if regrown > 0 {
            tracing::debug!(tick = ctx.tick, regrown, "tiles regrew resources");
        }
        Ok(())
    }
}
