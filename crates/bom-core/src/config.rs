//! Configuration for data locations and explosion limits.
//!
//! Load order: `.bom/config.toml` → environment variables → defaults.

use crate::explode::ExplosionOptions;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BomConfig {
    pub data: DataConfig,
    pub explosion: ExplosionConfig,
}

/// Where the input tables live. Relative paths are resolved against the
/// project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Flat edge list (ParentMaterial, ComponentMaterial, Quantity).
    pub edges: PathBuf,
    /// Material catalog (MaterialNumber, MaterialType).
    pub materials: PathBuf,
}

/// Explosion limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    /// Maximum edges expanded per explosion. Unlimited when unset.
    pub work_budget: Option<usize>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            edges: PathBuf::from("out/bom_table.csv"),
            materials: PathBuf::from("out/material_master.csv"),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl BomConfig {
    /// Load config from `.bom/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".bom").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("BOM_EDGES_FILE", &mut config.data.edges);
        env_override("BOM_MATERIALS_FILE", &mut config.data.materials);
        if let Ok(v) = std::env::var("BOM_WORK_BUDGET")
            && let Ok(n) = v.parse()
        {
            config.explosion.work_budget = Some(n);
        }

        if config.explosion.work_budget == Some(0) {
            anyhow::bail!("explosion.work_budget must be positive when set");
        }

        Ok(config)
    }

    /// Absolute location of the edge list.
    pub fn edges_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.data.edges)
    }

    /// Absolute location of the material catalog.
    pub fn materials_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.data.materials)
    }

    pub fn explosion_options(&self) -> ExplosionOptions {
        ExplosionOptions {
            budget: self.explosion.work_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BomConfig::default();
        assert_eq!(config.data.edges, PathBuf::from("out/bom_table.csv"));
        assert_eq!(
            config.data.materials,
            PathBuf::from("out/material_master.csv")
        );
        assert_eq!(config.explosion.work_budget, None);
        assert_eq!(config.explosion_options(), ExplosionOptions::default());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[data]
edges = "tables/edges.json"

[explosion]
work_budget = 5000
"#;
        let config: BomConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data.edges, PathBuf::from("tables/edges.json"));
        assert_eq!(config.explosion.work_budget, Some(5000));
        // Defaults for unspecified fields
        assert_eq!(
            config.data.materials,
            PathBuf::from("out/material_master.csv")
        );
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = BomConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.data.edges, PathBuf::from("out/bom_table.csv"));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".bom");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[explosion]\nwork_budget = 0\n").unwrap();

        assert!(BomConfig::load(tmp.path()).is_err());
    }

    #[test]
    fn test_paths_resolved_against_root() {
        let config = BomConfig::default();
        let root = Path::new("/data/plant1");
        assert_eq!(
            config.edges_path(root),
            PathBuf::from("/data/plant1/out/bom_table.csv")
        );
    }
}
