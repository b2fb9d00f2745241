//! Simulation state: the forest of root balls and everything needed to
//! rebuild it deterministically

use std::f64::consts::TAU;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallBuilder, outer_radius_for_depth};
use super::packer::PackingArena;
use super::vector::Vector;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::view::{BallInstance, BallView};

/// RNG state wrapper for reproducible rebuilds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Owns the ball forest for its whole life
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    pub rng_state: RngState,
    /// Ticks since the last build or reset
    pub time_ticks: u64,
    pub arena_width: f64,
    pub arena_height: f64,
    roots: Vec<Ball>,
}

impl Simulation {
    /// Validate `config` and build the initial tree from `config.seed`
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let rng_state = RngState::new(config.seed);
        let roots = build_roots(&config, &rng_state, config.arena_width, config.arena_height)?;

        let sim = Self {
            arena_width: config.arena_width,
            arena_height: config.arena_height,
            config,
            rng_state,
            time_ticks: 0,
            roots,
        };
        log::info!(
            "Simulation built: {} roots, {} balls, seed {}",
            sim.roots.len(),
            sim.ball_count(),
            sim.rng_state.seed
        );
        Ok(sim)
    }

    /// Throw the whole tree away and build a fresh one, optionally with a new
    /// seed. The old tree stays in place if the rebuild fails.
    pub fn reset(&mut self, seed: Option<u64>) -> SimResult<()> {
        let rng_state = RngState::new(seed.unwrap_or(self.rng_state.seed));
        let roots = build_roots(&self.config, &rng_state, self.arena_width, self.arena_height)?;

        self.roots = roots;
        self.rng_state = rng_state;
        self.time_ticks = 0;
        log::info!(
            "Simulation reset: {} balls, seed {}",
            self.ball_count(),
            self.rng_state.seed
        );
        Ok(())
    }

    /// Swap in a new configuration and rebuild from it. Nothing changes if
    /// `config` is invalid or the rebuild fails.
    pub fn reconfigure(&mut self, config: SimConfig) -> SimResult<()> {
        config.validate()?;
        let rng_state = RngState::new(config.seed);
        let roots = build_roots(&config, &rng_state, config.arena_width, config.arena_height)?;

        self.arena_width = config.arena_width;
        self.arena_height = config.arena_height;
        self.config = config;
        self.roots = roots;
        self.rng_state = rng_state;
        self.time_ticks = 0;
        log::info!(
            "Simulation reconfigured: {} balls, seed {}",
            self.ball_count(),
            self.rng_state.seed
        );
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn roots(&self) -> &[Ball] {
        &self.roots
    }

    pub(crate) fn roots_mut(&mut self) -> &mut [Ball] {
        &mut self.roots
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    /// Every ball in the forest, roots included
    pub fn ball_count(&self) -> usize {
        self.roots.iter().map(|r| 1 + r.descendant_count()).sum()
    }

    /// Drawable state for every ball, depth-first, parents before children
    pub fn views(&self) -> Vec<BallView> {
        let mut out = Vec::with_capacity(self.ball_count());
        for root in &self.roots {
            root.collect_views(&mut out);
        }
        out
    }

    pub fn instances(&self) -> Vec<BallInstance> {
        self.views().iter().map(BallInstance::from).collect()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.roots.iter().map(Ball::kinetic_energy).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.roots.iter().all(Ball::is_finite)
    }

    /// Children anywhere in the forest poking out of their parent by more
    /// than `tolerance`
    pub fn containment_violations(&self, tolerance: f64) -> usize {
        self.roots
            .iter()
            .map(|r| r.containment_violations(tolerance))
            .sum()
    }
}

/// Pack the roots into the arena and grow each into a full tree
fn build_roots(
    config: &SimConfig,
    rng_state: &RngState,
    width: f64,
    height: f64,
) -> SimResult<Vec<Ball>> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(SimError::InvalidArena { width, height });
    }

    let mut rng = rng_state.to_rng();
    let mut builder = BallBuilder::new(config, &mut rng);

    let arena = PackingArena::Rect {
        center: DVec2::new(width / 2.0, height / 2.0),
        width,
        height,
    };
    let root_radius = outer_radius_for_depth(config, 0);
    let packer = *builder.packer();
    let centers = packer.pack(config.root_count, root_radius, &arena, builder.rng())?;

    let mut roots = Vec::with_capacity(centers.len());
    for center in centers {
        let rng = builder.rng();
        let speed = rng.random_range(config.root_speed_min..=config.root_speed_max);
        let heading = rng.random_range(0.0..TAU);
        let root = builder.build(0, center, Vector::polar(speed, heading))?;
        roots.push(root);
    }
    log::debug!("Built {} balls from seed {}", builder.built(), rng_state.seed);
    Ok(roots)
}
