// crates/robogate-config/src/lib.rs
// ============================================================================
// Crate: robogate-config
// Description: Typed runtime configuration for the Robogate governance layer.
// Purpose: Load every tunable enumerated in §6 from environment variables
//          with an optional TOML-file override, and validate it once at
//          startup rather than letting bad values surface mid-run.
// ============================================================================

//! # robogate-config
//!
//! Configuration is loaded once at process startup and handed out as an
//! immutable snapshot (an `Arc<RuntimeConfig>` in the runtime crate); live
//! reload is out of scope (§5). Every environment variable named in spec
//! §6 has a field here; values fall back to documented defaults when unset,
//! and a TOML file (if provided) overrides environment values before
//! defaults are applied.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable or TOML field held a value of the wrong shape.
    #[error("invalid value for `{field}`: {detail}")]
    InvalidValue {
        /// The offending field name.
        field: String,
        /// Human-readable detail.
        detail: String,
    },

    /// A validated range or cross-field constraint was violated.
    #[error("{0}")]
    Validation(String),

    /// The TOML override file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML override file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    Toml {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Policy-engine risk weights and decision thresholds (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Risk contribution of a HIGH-severity policy hit.
    pub weight_high: f64,
    /// Risk contribution of a MEDIUM-severity policy hit.
    pub weight_medium: f64,
    /// Risk contribution of a LOW-severity policy hit.
    pub weight_low: f64,
    /// Below this aggregated risk score, a proposal with no HIGH deny hit is approved.
    pub approve_max: f64,
    /// At or above this aggregated risk score, the proposal is denied outright.
    pub deny_min: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self { weight_high: 0.5, weight_medium: 0.25, weight_low: 0.1, approve_max: 0.70, deny_min: 0.95 }
    }
}

/// Spatial and speed thresholds driving the policy catalog (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// `HUMAN_PROX_01` hard-stop radius, meters.
    pub stop_radius_m: f64,
    /// `HUMAN_PROX_02` slow-down radius, meters.
    pub slow_radius_m: f64,
    /// Speed cap while `HUMAN_PROX_02` is active, m/s.
    pub slow_speed: f64,
    /// Cruising speed used by the deterministic planner, m/s.
    pub default_speed: f64,
    /// Distance within which the robot is considered "at goal," meters.
    pub arrive_eps: f64,
    /// `COLLISION_01` radius along heading, meters.
    pub collision_radius: f64,
    /// `SPEED_LIMIT_01` cap for the `aisle` zone, m/s.
    pub aisle_speed_limit: f64,
    /// `SPEED_LIMIT_01` cap for the `loading_bay` zone, m/s.
    pub loading_bay_speed_limit: f64,
    /// `PATH_BLOCKED_01` minimum clearance along the straight path, meters.
    pub min_clearance_m: f64,
    /// Perpendicular detour offset used when replanning around an obstacle, meters.
    pub detour_offset_m: f64,
    /// Maximum replans attempted within one tick window.
    pub max_replans: u32,
    /// `BATTERY_01` low-battery advisory threshold, battery fraction in `[0, 1]`.
    pub low_battery_threshold: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            stop_radius_m: 1.0,
            slow_radius_m: 3.0,
            slow_speed: 0.3,
            default_speed: 0.5,
            arrive_eps: 0.3,
            collision_radius: 0.5,
            aisle_speed_limit: 0.5,
            loading_bay_speed_limit: 0.4,
            min_clearance_m: 0.5,
            detour_offset_m: 0.8,
            max_replans: 3,
            low_battery_threshold: 0.20,
        }
    }
}

/// Simulator HTTP client configuration (§4.5, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Base URL of the simulator HTTP API.
    pub base_url: String,
    /// Bearer token sent as `X-Sim-Token`, if configured.
    pub token: Option<String>,
    /// Telemetry/world-snapshot call timeout, milliseconds.
    pub telemetry_timeout_ms: u64,
    /// `send_command` call timeout, milliseconds.
    pub command_timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            token: None,
            telemetry_timeout_ms: 1_000,
            command_timeout_ms: 2_000,
        }
    }
}

/// Agent/planner configuration (§4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Whether the LLM-backed planner provider is enabled; when false, the
    /// deterministic planner and mock provider are used exclusively.
    pub planner_enabled: bool,
    /// Planner provider call timeout, milliseconds.
    pub planner_timeout_ms: u64,
    /// Maximum tool-call steps per agentic-loop invocation.
    pub max_steps: u32,
    /// Wall-clock cap for one agentic-loop invocation, milliseconds.
    pub wall_clock_ms: u64,
    /// Consecutive denials after which the loop forces `graceful_stop`.
    pub max_consecutive_denials: u32,
    /// Ring-buffer capacity for the agent's recent-outcome memory.
    pub memory_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            planner_enabled: false,
            planner_timeout_ms: 10_000,
            max_steps: 6,
            wall_clock_ms: 5_000,
            max_consecutive_denials: 3,
            memory_capacity: 10,
        }
    }
}

/// Broadcast hub configuration (§4.6, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Per-subscriber bounded buffer capacity.
    pub subscriber_buffer: usize,
    /// Consecutive drops after which a slow subscriber is evicted.
    pub slow_sub_evict: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { subscriber_buffer: 64, slow_sub_evict: 8 }
    }
}

/// Stagnation-detector configuration (§4.7, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagnationConfig {
    /// Consecutive low-progress ticks before a `STAGNATION` event is emitted.
    pub cycles: u32,
    /// Minimum per-tick progress, meters, below which a tick counts as stagnant.
    pub eps_m: f64,
    /// Distance from goal below which stagnation is not evaluated.
    pub min_distance_m: f64,
}

impl Default for StagnationConfig {
    fn default() -> Self {
        Self { cycles: 30, eps_m: 0.02, min_distance_m: 0.4 }
    }
}

/// The complete, validated runtime configuration snapshot.
///
/// # Invariants
/// - Only constructible validated: see [`RuntimeConfig::load`] and
///   [`RuntimeConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Control-loop tick period, milliseconds.
    pub tick_period_ms: u64,
    /// Policy-engine risk weights and thresholds.
    pub risk: RiskConfig,
    /// Spatial/speed safety thresholds.
    pub safety: SafetyConfig,
    /// Simulator adapter configuration.
    pub sim: SimConfig,
    /// Agent/planner configuration.
    pub agent: AgentConfig,
    /// Broadcast hub configuration.
    pub hub: HubConfig,
    /// Stagnation detector configuration.
    pub stagnation: StagnationConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 100,
            risk: RiskConfig::default(),
            safety: SafetyConfig::default(),
            sim: SimConfig::default(),
            agent: AgentConfig::default(),
            hub: HubConfig::default(),
            stagnation: StagnationConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration from the process environment, optionally
    /// overridden by a TOML file, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`]/[`ConfigError::Toml`] if `toml_path` is
    /// provided but unreadable or unparsable, [`ConfigError::InvalidValue`]
    /// if an environment variable cannot be parsed as its expected type, or
    /// [`ConfigError::Validation`] if the merged configuration fails a
    /// range check.
    pub fn load(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match toml_path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(&std::env::vars().collect())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a base configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or
    /// [`ConfigError::Toml`] if it cannot be parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Toml { path: path.display().to_string(), source })
    }

    /// Overrides fields from an environment-variable map, matching the
    /// enumeration in §6. Unknown keys are ignored; unset keys leave the
    /// current value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a recognized variable holds
    /// a value that cannot be parsed as its expected type.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        parse_into(env, "TICK_PERIOD_MS", &mut self.tick_period_ms)?;
        parse_into(env, "STOP_RADIUS_M", &mut self.safety.stop_radius_m)?;
        parse_into(env, "SLOW_RADIUS_M", &mut self.safety.slow_radius_m)?;
        parse_into(env, "SLOW_SPEED", &mut self.safety.slow_speed)?;
        parse_into(env, "DEFAULT_SPEED", &mut self.safety.default_speed)?;
        parse_into(env, "ARRIVE_EPS", &mut self.safety.arrive_eps)?;
        parse_into(env, "COLLISION_RADIUS", &mut self.safety.collision_radius)?;
        parse_into(env, "RISK_WEIGHTS_HIGH", &mut self.risk.weight_high)?;
        parse_into(env, "RISK_WEIGHTS_MEDIUM", &mut self.risk.weight_medium)?;
        parse_into(env, "RISK_WEIGHTS_LOW", &mut self.risk.weight_low)?;
        parse_into(env, "RISK_APPROVE_MAX", &mut self.risk.approve_max)?;
        parse_into(env, "RISK_DENY_MIN", &mut self.risk.deny_min)?;
        parse_into(env, "SUBSCRIBER_BUFFER", &mut self.hub.subscriber_buffer)?;
        parse_into(env, "SLOW_SUB_EVICT", &mut self.hub.slow_sub_evict)?;
        if let Some(value) = env.get("SIM_BASE_URL") {
            self.sim.base_url.clone_from(value);
        }
        if let Some(value) = env.get("SIM_TOKEN") {
            self.sim.token = Some(value.clone());
        }
        parse_into(env, "SIM_TIMEOUT_MS", &mut self.sim.telemetry_timeout_ms)?;
        parse_into(env, "PLANNER_ENABLED", &mut self.agent.planner_enabled)?;
        parse_into(env, "PLANNER_TIMEOUT_MS", &mut self.agent.planner_timeout_ms)?;
        parse_into(env, "AGENT_MAX_STEPS", &mut self.agent.max_steps)?;
        parse_into(env, "AGENT_WALL_MS", &mut self.agent.wall_clock_ms)?;
        parse_into(env, "STAGNATION_CYCLES", &mut self.stagnation.cycles)?;
        parse_into(env, "STAGNATION_EPS", &mut self.stagnation.eps_m)?;
        parse_into(env, "STAGNATION_MIN_DIST", &mut self.stagnation.min_distance_m)?;
        Ok(())
    }

    /// Validates every range and cross-field constraint implied by §4/§6.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first violated
    /// constraint found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: &[(bool, &str)] = &[
            (self.tick_period_ms > 0, "tick_period_ms must be greater than zero"),
            (self.safety.stop_radius_m > 0.0, "stop_radius_m must be greater than zero"),
            (self.safety.slow_radius_m > self.safety.stop_radius_m, "slow_radius_m must exceed stop_radius_m"),
            (self.safety.slow_speed > 0.0, "slow_speed must be greater than zero"),
            (self.safety.default_speed >= self.safety.slow_speed, "default_speed must be at least slow_speed"),
            (self.safety.arrive_eps > 0.0, "arrive_eps must be greater than zero"),
            (self.safety.collision_radius > 0.0, "collision_radius must be greater than zero"),
            (self.safety.aisle_speed_limit > 0.0, "aisle_speed_limit must be greater than zero"),
            (self.safety.loading_bay_speed_limit > 0.0, "loading_bay_speed_limit must be greater than zero"),
            (self.safety.max_replans > 0, "max_replans must be greater than zero"),
            (
                (0.0 ..= 1.0).contains(&self.safety.low_battery_threshold),
                "low_battery_threshold must be within [0, 1]",
            ),
            (self.risk.weight_high >= 0.0, "risk weight_high must be non-negative"),
            (self.risk.weight_medium >= 0.0, "risk weight_medium must be non-negative"),
            (self.risk.weight_low >= 0.0, "risk weight_low must be non-negative"),
            ((0.0 ..= 1.0).contains(&self.risk.approve_max), "risk_approve_max must be within [0, 1]"),
            ((0.0 ..= 1.0).contains(&self.risk.deny_min), "risk_deny_min must be within [0, 1]"),
            (self.risk.approve_max < self.risk.deny_min, "risk_approve_max must be less than risk_deny_min"),
            (self.hub.subscriber_buffer > 0, "subscriber_buffer must be greater than zero"),
            (self.hub.slow_sub_evict > 0, "slow_sub_evict must be greater than zero"),
            (!self.sim.base_url.is_empty(), "sim base_url must not be empty"),
            (self.sim.telemetry_timeout_ms > 0, "sim telemetry_timeout_ms must be greater than zero"),
            (self.sim.command_timeout_ms > 0, "sim command_timeout_ms must be greater than zero"),
            (self.agent.planner_timeout_ms > 0, "agent planner_timeout_ms must be greater than zero"),
            (self.agent.max_steps > 0, "agent max_steps must be greater than zero"),
            (self.agent.wall_clock_ms > 0, "agent wall_clock_ms must be greater than zero"),
            (self.agent.max_consecutive_denials > 0, "agent max_consecutive_denials must be greater than zero"),
            (self.agent.memory_capacity > 0, "agent memory_capacity must be greater than zero"),
            (self.stagnation.cycles > 0, "stagnation cycles must be greater than zero"),
            (self.stagnation.eps_m > 0.0, "stagnation eps_m must be greater than zero"),
            (self.stagnation.min_distance_m > 0.0, "stagnation min_distance_m must be greater than zero"),
        ];
        for (ok, message) in checks {
            if !ok {
                return Err(ConfigError::Validation((*message).to_string()));
            }
        }
        Ok(())
    }
}

/// Parses an environment variable into `*target` if present, leaving
/// `*target` unchanged if the variable is unset.
fn parse_into<T>(env: &HashMap<String, String>, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = env.get(key) else {
        return Ok(());
    };
    *target = raw
        .parse()
        .map_err(|err: T::Err| ConfigError::InvalidValue { field: key.to_string(), detail: err.to_string() })?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn risk_thresholds_out_of_order_are_rejected() {
        let mut config = RuntimeConfig::default();
        config.risk.approve_max = 0.95;
        config.risk.deny_min = 0.70;
        let err = config.validate().expect_err("should reject inverted thresholds");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn env_override_replaces_default_tick_period() {
        let mut config = RuntimeConfig::default();
        let env = HashMap::from([("TICK_PERIOD_MS".to_string(), "50".to_string())]);
        config.apply_env(&env).expect("valid override");
        assert_eq!(config.tick_period_ms, 50);
    }

    #[test]
    fn invalid_env_value_reports_the_offending_field() {
        let mut config = RuntimeConfig::default();
        let env = HashMap::from([("TICK_PERIOD_MS".to_string(), "not-a-number".to_string())]);
        let err = config.apply_env(&env).expect_err("should reject non-numeric value");
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "TICK_PERIOD_MS"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn slow_radius_must_exceed_stop_radius() {
        let mut config = RuntimeConfig::default();
        config.safety.slow_radius_m = config.safety.stop_radius_m;
        assert!(config.validate().is_err());
    }
}
