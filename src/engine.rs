use std::time::Instant;

use anyhow::{Context, Result};

use crate::{
    render::Presenter,
    rng::{RngManager, SystemRng},
    scheduler::{Clock, TickScheduler},
    world::{World, WorldSnapshot},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Generator shared with world setup, so a seed fixes both the initial
    /// layout and every later draw.
    pub fn rng_mut(&mut self) -> &mut RngManager {
        &mut self.rng
    }

    /// Runs every system once, in registration order, then advances the
    /// world's tick counter.
    pub fn tick(&mut self, world: &mut World) -> Result<TickSummary> {
        let tick = world.tick() + 1;
        let mut system_reports = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let start = Instant::now();
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick,
                scenario_name: &self.settings.scenario_name,
            };
            system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system '{}' failed on tick {tick}", system.name()))?;
            system_reports.push(SystemRunReport {
                name: system.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }
        world.advance_tick();
        Ok(TickSummary {
            tick,
            system_reports,
        })
    }

    /// Runs `ticks` ticks back to back, handing each resulting snapshot to
    /// `hook`.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(WorldSnapshot),
    {
        for _ in 0..ticks {
            self.tick(world)?;
            hook(world.snapshot());
        }
        Ok(())
    }

    /// Drives the world on the scheduler's cadence and presents every tick.
    /// Runs until `max_ticks` is reached, or indefinitely without a limit.
    pub fn run_paced<C: Clock>(
        &mut self,
        world: &mut World,
        scheduler: &mut TickScheduler<C>,
        max_ticks: Option<u64>,
        presenter: &mut dyn Presenter,
    ) -> Result<u64> {
        tracing::info!(
            scenario = %self.settings.scenario_name,
            interval = ?scheduler.interval(),
            cadence = ?scheduler.cadence(),
            "simulation running"
        );
        presenter.present(&world.snapshot())?;
        scheduler.run(max_ticks, |_| {
            let summary = self.tick(world)?;
            tracing::debug!(
                tick = summary.tick,
                systems = summary.system_reports.len(),
                "tick complete"
            );
            presenter.present(&world.snapshot())
        })
    }
}

#[derive(Clone, Debug)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct TickSummary {
    pub tick: u64,
    pub system_reports: Vec<SystemRunReport>,
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSystem {
        calls: u64,
    }

    impl System for CountingSystem {
        fn name(&self) -> &str {
            "counting"
        }

        fn run(
            &mut self,
            ctx: &SystemContext,
            world: &mut World,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            self.calls += 1;
            assert_eq!(ctx.tick, self.calls);
            world.log(format!("counted {}", ctx.tick));
            Ok(())
        }
    }

    struct FailingSystem;

    impl System for FailingSystem {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(
            &mut self,
            _ctx: &SystemContext,
            _world: &mut World,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            anyhow::bail!("refused")
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            scenario_name: "test".into(),
            seed: 1,
        }
    }

    fn empty_world() -> World {
        World::from_parts(0, Vec::new(), Vec::new(), Vec::new(), 10)
    }

    #[test]
    fn tick_runs_systems_and_advances_counter() {
        let mut engine = EngineBuilder::new(settings())
            .with_system(CountingSystem { calls: 0 })
            .build();
        let mut world = empty_world();

        let summary = engine.tick(&mut world).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.system_reports[0].name, "counting");
        engine.tick(&mut world).unwrap();
        assert_eq!(world.tick(), 2);
        assert_eq!(world.action_log().last(), Some("counted 2"));
    }

    #[test]
    fn failing_system_names_itself() {
        let mut engine = EngineBuilder::new(settings())
            .with_system(FailingSystem)
            .build();
        let err = engine.tick(&mut empty_world()).unwrap_err();
        assert!(err.to_string().contains("failing"));
    }
}
