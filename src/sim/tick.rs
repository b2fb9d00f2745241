//! Simulation tick
//!
//! One tick is three passes in a fixed order: collisions (velocities only),
//! kinematic advance with containment carry (positions), then arena walls.
//! Resolving collisions against already-moved positions would disagree with
//! the velocities just computed, so the order never changes.

use super::ball::{Ball, resolve_sibling_pairs};
use super::state::Simulation;
use crate::config::SimConfig;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::error::{SimError, SimResult};

/// Host-supplied input for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    pub arena_width: f64,
    pub arena_height: f64,
}

impl TickInput {
    pub fn new(arena_width: f64, arena_height: f64) -> Self {
        Self {
            arena_width,
            arena_height,
        }
    }

    /// Arena the simulation was configured with
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.arena_width, config.arena_height)
    }

    fn validate(&self) -> SimResult<()> {
        let (width, height) = (self.arena_width, self.arena_height);
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(())
        } else {
            Err(SimError::InvalidArena { width, height })
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickSummary {
    pub tick: u64,
    pub bounces: usize,
    pub carried: usize,
    pub reflections: usize,
    pub kinetic_energy: f64,
}

/// Advance the simulation by `dt` seconds
pub fn tick(sim: &mut Simulation, input: &TickInput, dt: f64) -> SimResult<TickSummary> {
    if !(dt.is_finite() && dt >= 0.0) {
        return Err(SimError::NegativeTimeStep(dt));
    }
    input.validate()?;
    sim.arena_width = input.arena_width;
    sim.arena_height = input.arena_height;

    let config = sim.config().clone();
    let roots = sim.roots_mut();

    // Collisions: roots against each other, then every subtree
    let mut bounces = 0;
    for i in 0..roots.len() {
        if config.collide_roots {
            bounces += resolve_sibling_pairs(roots, i, &config)?;
        }
        bounces += roots[i].resolve_collisions(&config)?;
    }

    // Motion and containment
    let mut carried = 0;
    for root in roots.iter_mut() {
        carried += root.advance(dt, &config)?;
    }

    // Arena walls
    let mut reflections = 0;
    for root in roots.iter_mut() {
        reflections += root.reflect_off_bounds(input.arena_width, input.arena_height, config.boundary_nudge);
    }

    sim.time_ticks += 1;
    let summary = TickSummary {
        tick: sim.time_ticks,
        bounces,
        carried,
        reflections,
        kinetic_energy: sim.roots().iter().map(Ball::kinetic_energy).sum(),
    };
    log::debug!(
        "Tick {}: {} bounces, {} carried, {} reflections, energy {:.3}",
        summary.tick,
        summary.bounces,
        summary.carried,
        summary.reflections,
        summary.kinetic_energy
    );
    Ok(summary)
}

/// Fixed-timestep accumulator for hosts with a variable frame rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    pub step: f64,
    pub max_substeps: u32,
    accumulator: f64,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl FixedTimestep {
    pub fn new(step: f64, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps,
            accumulator: 0.0,
        }
    }

    /// Time banked but not yet simulated
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    /// Run as many whole steps as `frame_dt` pays for, capped at
    /// `max_substeps`. Returns the summaries of the steps taken.
    pub fn advance(
        &mut self,
        sim: &mut Simulation,
        input: &TickInput,
        frame_dt: f64,
    ) -> SimResult<Vec<TickSummary>> {
        if !(frame_dt.is_finite() && frame_dt >= 0.0) {
            return Err(SimError::NegativeTimeStep(frame_dt));
        }
        self.accumulator += frame_dt;

        let mut summaries = Vec::new();
        while self.accumulator >= self.step && summaries.len() < self.max_substeps as usize {
            summaries.push(tick(sim, input, self.step)?);
            self.accumulator -= self.step;
        }
        // Drop backlog we could not catch up on
        if summaries.len() == self.max_substeps as usize {
            self.accumulator = self.accumulator.min(self.step);
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{KinematicPoint, Vector};
    use glam::DVec2;
    use proptest::prelude::*;

    fn sim(seed: u64) -> Simulation {
        Simulation::new(SimConfig::default().with_seed(seed)).unwrap()
    }

    #[test]
    fn test_tick_counts() {
        let mut sim = sim(1);
        let input = TickInput::from_config(sim.config());
        let summary = tick(&mut sim, &input, SIM_DT).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(sim.time_ticks, 1);
        assert!(summary.kinetic_energy > 0.0);
    }

    #[test]
    fn test_tick_rejects_bad_input() {
        let mut sim = sim(1);
        let input = TickInput::from_config(sim.config());
        assert!(matches!(
            tick(&mut sim, &input, -0.1),
            Err(SimError::NegativeTimeStep(_))
        ));
        assert!(matches!(
            tick(&mut sim, &TickInput::new(0.0, 600.0), SIM_DT),
            Err(SimError::InvalidArena { .. })
        ));
        assert_eq!(sim.time_ticks, 0);
    }

    #[test]
    fn test_zero_dt_moves_nothing() {
        let mut sim = sim(2);
        let before = sim.views();
        let input = TickInput::from_config(sim.config());
        tick(&mut sim, &input, 0.0).unwrap();
        assert_eq!(sim.views(), before);
    }

    #[test]
    fn test_determinism() {
        let mut a = sim(99999);
        let mut b = sim(99999);
        let input = TickInput::from_config(a.config());
        for _ in 0..120 {
            tick(&mut a, &input, SIM_DT).unwrap();
            tick(&mut b, &input, SIM_DT).unwrap();
        }
        assert_eq!(a.views(), b.views());
    }

    #[test]
    fn test_roots_bounce_off_each_other() {
        let config = SimConfig {
            depth_count: 1,
            root_count: 2,
            bounce_multiplier: 1.0,
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        let r = sim.roots()[0].outer_radius();
        let roots = sim.roots_mut();
        let (left, right) = roots.split_at_mut(1);
        for (ball, x, vx) in [(&mut left[0], 640.0 - r, 30.0), (&mut right[0], 640.0 + r, -30.0)] {
            let mass = ball.mass();
            ball.set_kinematics(KinematicPoint::new(
                mass,
                Vector::cartesian(vx, 0.0),
                DVec2::new(x, 480.0),
            ));
        }

        let input = TickInput::from_config(sim.config());
        let summary = tick(&mut sim, &input, SIM_DT).unwrap();
        assert_eq!(summary.bounces, 1);
        assert!(sim.roots()[0].velocity().x() < 0.0);
        assert!(sim.roots()[1].velocity().x() > 0.0);
    }

    #[test]
    fn test_fixed_timestep_substeps() {
        let mut sim = sim(3);
        let input = TickInput::from_config(sim.config());
        let mut stepper = FixedTimestep::default();

        let steps = stepper.advance(&mut sim, &input, SIM_DT * 2.5).unwrap();
        assert_eq!(steps.len(), 2);
        assert!((stepper.pending() - SIM_DT * 0.5).abs() < 1e-12);

        // A huge frame is capped
        let steps = stepper.advance(&mut sim, &input, 10.0).unwrap();
        assert_eq!(steps.len(), MAX_SUBSTEPS as usize);
        assert!(stepper.pending() <= SIM_DT);
        assert_eq!(sim.time_ticks, 2 + MAX_SUBSTEPS as u64);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_roots_stay_in_arena(seed in any::<u64>(), speed in 1.0..1000.0f64, heading in 0.0..std::f64::consts::TAU) {
            let config = SimConfig {
                depth_count: 1,
                root_count: 1,
                seed,
                ..Default::default()
            };
            let mut sim = Simulation::new(config).unwrap();
            let root = &mut sim.roots_mut()[0];
            let k = root.kinematics().with_velocity(Vector::polar(speed, heading));
            root.set_kinematics(k);

            let input = TickInput::from_config(sim.config());
            let (w, h) = (input.arena_width, input.arena_height);
            let mut outside_streak = 0;
            for _ in 0..600 {
                tick(&mut sim, &input, SIM_DT).unwrap();
                let root = &sim.roots()[0];
                let r = root.outer_radius();
                let outside = root.x() - r < -1.0 || root.x() + r > w + 1.0
                    || root.y() - r < -1.0 || root.y() + r > h + 1.0;
                outside_streak = if outside { outside_streak + 1 } else { 0 };
                // A wall overshoot is corrected within a couple of ticks
                prop_assert!(outside_streak < 3);
                prop_assert!(root.x() > 0.0 && root.x() < w);
                prop_assert!(root.y() > 0.0 && root.y() < h);
            }
        }
    }
}
