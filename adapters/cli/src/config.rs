use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use stealth_nav_system_movement::MovementConfig;
use stealth_nav_system_pathfinding::{PlannerConfig, PlannerKind};

/// Tunables loaded from the optional TOML configuration file.
///
/// ```toml
/// planner_kind = "fallback"
///
/// [planner]
/// max_iterations = 500
///
/// [movement]
/// base_speed = 4.0
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Strategy used when the command line does not pick one.
    pub planner_kind: PlannerKind,
    /// Planner tunables.
    pub planner: PlannerConfig,
    /// Movement controller tunables.
    pub movement: MovementConfig,
}

impl CliConfig {
    /// Reads the configuration at `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml contents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_uses_defaults() {
        let config = CliConfig::load(None).expect("defaults");
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.planner.max_iterations, 2_000);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = CliConfig::parse(
            r#"
            planner_kind = "fallback"

            [planner]
            max_iterations = 500
            allow_diagonals = false

            [movement]
            base_speed = 4.0
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.planner_kind, PlannerKind::Fallback);
        assert_eq!(config.planner.max_iterations, 500);
        assert!(!config.planner.allow_diagonals);
        assert_eq!(config.planner.max_backtracks, 10);
        assert_eq!(config.movement.base_speed, 4.0);
        assert_eq!(config.movement.injury_multiplier, 0.7);
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(CliConfig::parse("[renderer]\nscale = 2").is_err());
    }
}
