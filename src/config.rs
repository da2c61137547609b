use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::models::PlanPreset;

pub(crate) const DB_ENV: &str = "HOUSEBUDGET_DB";
pub(crate) const PLAN_ENV: &str = "HOUSEBUDGET_PLAN";
pub(crate) const LOG_ENV: &str = "HOUSEBUDGET_LOG";

const DEFAULT_LOG_FILTER: &str = "housebudget=info";

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) db_path: PathBuf,
    pub(crate) log_path: PathBuf,
    /// Weight table new households start with.
    pub(crate) default_plan: PlanPreset,
    pub(crate) log_filter: String,
}

impl Config {
    pub(crate) fn load() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "housebudget", "HouseBudget")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Self::from_parts(
            data_dir,
            std::env::var(DB_ENV).ok(),
            std::env::var(PLAN_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        )
    }

    /// Resolve settings from a data directory plus optional overrides.
    pub(crate) fn from_parts(
        data_dir: PathBuf,
        db_override: Option<String>,
        plan_override: Option<String>,
        log_override: Option<String>,
    ) -> Result<Self> {
        let db_path = match db_override.filter(|p| !p.trim().is_empty()) {
            Some(p) => PathBuf::from(crate::run::shellexpand(p.trim())),
            None => data_dir.join("housebudget.db"),
        };
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let default_plan = match plan_override {
            Some(name) => PlanPreset::parse(&name).ok_or_else(|| {
                anyhow::anyhow!(
                    "{PLAN_ENV}='{name}' is not a known plan (expected one of: {})",
                    PlanPreset::all()
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?,
            None => PlanPreset::Classic,
        };

        Ok(Self {
            log_path: data_dir.join("housebudget.log"),
            data_dir,
            db_path,
            default_plan,
            log_filter: log_override.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::from_parts(dir.path().to_path_buf(), None, None, None).unwrap();
        assert_eq!(cfg.db_path, dir.path().join("housebudget.db"));
        assert_eq!(cfg.log_path, dir.path().join("housebudget.log"));
        assert_eq!(cfg.default_plan, PlanPreset::Classic);
        assert_eq!(cfg.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("shared.db");
        let cfg = Config::from_parts(
            dir.path().to_path_buf(),
            Some(db.display().to_string()),
            Some("couple".into()),
            Some("housebudget=debug".into()),
        )
        .unwrap();
        assert_eq!(cfg.db_path, db);
        assert!(dir.path().join("nested").is_dir());
        assert_eq!(cfg.default_plan, PlanPreset::Couple);
        assert_eq!(cfg.log_filter, "housebudget=debug");
    }

    #[test]
    fn test_unknown_plan_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_parts(dir.path().to_path_buf(), None, Some("envelope".into()), None)
            .unwrap_err();
        assert!(err.to_string().contains("envelope"));
    }
}
