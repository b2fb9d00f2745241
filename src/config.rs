//! Simulation configuration
//!
//! Every scaling constant is an explicit field so tests and hosts can vary
//! them. Persisted as JSON the same way host settings are.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};

/// Which positions the collision tests look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionCheck {
    /// Positions one `lookahead_dt` into the future
    #[default]
    Lookahead,
    /// Current positions
    Current,
}

/// Mechanism that stops a touching pair from bouncing every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AntiOscillation {
    /// Bounce only while the pair is closing along the line of centers
    #[default]
    Convergence,
    /// Ignore a pair for `ticks` ticks after it bounced
    Debounce { ticks: u32 },
}

/// What the packer does when it runs out of budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PackingMode {
    /// Fail with `PackingInfeasible`
    #[default]
    Strict,
    /// Keep the largest partial placement seen across restarts
    Lenient,
}

/// Construction and tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Tree shape ===
    /// Cluster size under every non-leaf ball
    pub children_per_ball: usize,
    /// Number of layers; leaves sit at depth `depth_count - 1`
    pub depth_count: u32,
    /// Number of depth-0 balls
    pub root_count: usize,

    // === Arena ===
    pub arena_width: f64,
    pub arena_height: f64,
    pub seed: u64,

    // === Scaling ===
    pub base_radius: f64,
    pub layer_ratio: f64,
    pub outer_radius_ratio: f64,
    pub mass_base: f64,
    pub deceleration: f64,
    pub bounce_multiplier: f64,

    // === Collision engine ===
    pub lookahead_dt: f64,
    pub collision_check: CollisionCheck,
    pub anti_oscillation: AntiOscillation,
    /// Whether depth-0 balls bounce off each other
    pub collide_roots: bool,

    // === Packing ===
    pub packing: PackingMode,
    pub max_tries_per_point: u32,
    pub max_batch_restarts: u32,

    // === Spawning ===
    pub root_speed_min: f64,
    pub root_speed_max: f64,
    pub child_jitter_min: f64,
    pub child_jitter_max: f64,

    /// Inward position nudge at the arena walls
    pub boundary_nudge: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            children_per_ball: 3,
            depth_count: 2,
            root_count: 3,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            seed: 0,

            base_radius: BASE_RADIUS,
            layer_ratio: LAYER_RATIO,
            outer_radius_ratio: OUTER_RADIUS_RATIO,
            mass_base: MASS_BASE,
            deceleration: DECELERATION,
            bounce_multiplier: BOUNCE_MULTIPLIER,

            lookahead_dt: LOOKAHEAD_DT,
            collision_check: CollisionCheck::Lookahead,
            anti_oscillation: AntiOscillation::Convergence,
            collide_roots: true,

            packing: PackingMode::Strict,
            max_tries_per_point: MAX_TRIES_PER_POINT,
            max_batch_restarts: MAX_BATCH_RESTARTS,

            root_speed_min: ROOT_SPEED_MIN,
            root_speed_max: ROOT_SPEED_MAX,
            child_jitter_min: CHILD_JITTER_MIN,
            child_jitter_max: CHILD_JITTER_MAX,

            boundary_nudge: BOUNDARY_NUDGE,
        }
    }
}

fn positive(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

fn ordered_range(name: &str, min: f64, max: f64) -> SimResult<()> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && min <= max {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{name} range must satisfy 0 <= min <= max, got [{min}, {max}]"
        )))
    }
}

impl SimConfig {
    /// Deepest depth in the tree
    pub fn max_depth(&self) -> u32 {
        self.depth_count.saturating_sub(1)
    }

    /// Same configuration, different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject anything that would make the geometry meaningless
    pub fn validate(&self) -> SimResult<()> {
        if self.depth_count == 0 {
            return Err(SimError::InvalidConfig("depth_count must be at least 1".into()));
        }
        positive("arena_width", self.arena_width)?;
        positive("arena_height", self.arena_height)?;
        positive("base_radius", self.base_radius)?;
        positive("layer_ratio", self.layer_ratio)?;
        positive("mass_base", self.mass_base)?;
        positive("bounce_multiplier", self.bounce_multiplier)?;

        if self.layer_ratio <= 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "layer_ratio must exceed 1 so radii shrink with depth, got {}",
                self.layer_ratio
            )));
        }
        // A child's outer edge must fit inside its parent's inner radius
        if !(self.outer_radius_ratio > 1.0 && self.outer_radius_ratio < self.layer_ratio) {
            return Err(SimError::InvalidConfig(format!(
                "outer_radius_ratio must lie in (1, {}), got {}",
                self.layer_ratio, self.outer_radius_ratio
            )));
        }
        if !(self.deceleration > 0.0 && self.deceleration <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "deceleration must lie in (0, 1], got {}",
                self.deceleration
            )));
        }
        if !(self.lookahead_dt.is_finite() && self.lookahead_dt >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "lookahead_dt must be non-negative, got {}",
                self.lookahead_dt
            )));
        }
        if !(self.boundary_nudge.is_finite() && self.boundary_nudge >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "boundary_nudge must be non-negative, got {}",
                self.boundary_nudge
            )));
        }
        ordered_range("root_speed", self.root_speed_min, self.root_speed_max)?;
        ordered_range("child_jitter", self.child_jitter_min, self.child_jitter_max)?;

        if self.max_tries_per_point == 0 || self.max_batch_restarts == 0 {
            return Err(SimError::InvalidConfig("packer budgets must be non-zero".into()));
        }
        if let AntiOscillation::Debounce { ticks: 0 } = self.anti_oscillation {
            return Err(SimError::InvalidConfig("debounce ticks must be non-zero".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SimError::InvalidConfig(format!("malformed config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SimError::InvalidConfig(format!("cannot serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
        assert_eq!(SimConfig::default().max_depth(), 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            SimConfig {
                depth_count: 0,
                ..Default::default()
            },
            SimConfig {
                base_radius: -1.0,
                ..Default::default()
            },
            SimConfig {
                outer_radius_ratio: 0.9,
                ..Default::default()
            },
            SimConfig {
                outer_radius_ratio: 5.0,
                ..Default::default()
            },
            SimConfig {
                deceleration: 1.5,
                ..Default::default()
            },
            SimConfig {
                root_speed_min: 60.0,
                ..Default::default()
            },
            SimConfig {
                anti_oscillation: AntiOscillation::Debounce { ticks: 0 },
                ..Default::default()
            },
            SimConfig {
                arena_width: f64::NAN,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SimError::InvalidConfig(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn test_json_partial_document() {
        let config = SimConfig::from_json(r#"{ "children_per_ball": 5, "seed": 42 }"#).unwrap();
        assert_eq!(config.children_per_ball, 5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.depth_count, 2);
    }

    #[test]
    fn test_json_roundtrip_keeps_enums() {
        let config = SimConfig {
            anti_oscillation: AntiOscillation::Debounce { ticks: 4 },
            packing: PackingMode::Lenient,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_validates() {
        assert!(SimConfig::from_json(r#"{ "layer_ratio": 0.5 }"#).is_err());
        assert!(SimConfig::from_json("not json").is_err());
    }
}
