use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub output: String,
    pub descriptor_table: String,
    pub ntuple_dir_table: String,
    pub user_dir_table: String,
    /// Number of directories probed between two courtesy pauses.
    pub throttle_every: usize,
    pub throttle_pause_secs: u64,
    /// Priority increment applied to the whole process at start-up. 0 leaves it alone.
    pub niceness: i32,
    pub user_area_root: String,
    pub legacy: LegacyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyConfig {
    pub repo_url: String,
    pub remote_name: String,
    pub clone_dir: String,
    pub descriptor_dir: String,
    pub branches: Vec<String>,
}

impl AppConfig {
    pub fn throttle_pause(&self) -> Duration {
        Duration::from_secs(self.throttle_pause_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: "xml_table.sqlite".to_string(),
            descriptor_table: "xml".to_string(),
            ntuple_dir_table: "xml_ntuple_dir".to_string(),
            user_dir_table: "user_dir".to_string(),
            throttle_every: 1000,
            throttle_pause_secs: 5,
            niceness: 10,
            user_area_root: "/pnfs/desy.de/cms/tier2/store/user".to_string(),
            legacy: LegacyConfig::default(),
        }
    }
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            repo_url: "https://github.com/UHH2/UHH2.git".to_string(),
            remote_name: "UHH".to_string(),
            clone_dir: "UHHCounting".to_string(),
            descriptor_dir: "common/datasets".to_string(),
            branches: [
                "RunII_101_v1",
                "RunII_94X_v3",
                "RunII_94X_v2",
                "RunII_94X_v1",
                "RunII_80X_v6",
                "RunII_80X_v5",
                "RunII_80X_v4",
                "RunII_80X_v3",
            ]
            .iter()
            .map(|b| b.to_string())
            .collect(),
        }
    }
}

/// Load `NtupleIndex.{toml,yaml,json,...}` from the working directory, falling
/// back to built-in defaults for every key the file leaves out.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_configuration_from("NtupleIndex")
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let builder = Config::builder()
        .set_default("output", defaults.output)?
        .set_default("descriptor_table", defaults.descriptor_table)?
        .set_default("ntuple_dir_table", defaults.ntuple_dir_table)?
        .set_default("user_dir_table", defaults.user_dir_table)?
        .set_default("throttle_every", defaults.throttle_every as i64)?
        .set_default("throttle_pause_secs", defaults.throttle_pause_secs as i64)?
        .set_default("niceness", defaults.niceness as i64)?
        .set_default("user_area_root", defaults.user_area_root)?
        .set_default("legacy.repo_url", defaults.legacy.repo_url)?
        .set_default("legacy.remote_name", defaults.legacy.remote_name)?
        .set_default("legacy.clone_dir", defaults.legacy.clone_dir)?
        .set_default("legacy.descriptor_dir", defaults.legacy.descriptor_dir)?
        .set_default("legacy.branches", defaults.legacy.branches)?
        .add_source(ConfigFile::with_name(name).required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_configuration_from("definitely-not-a-config-file").unwrap();
        assert_eq!(config.output, "xml_table.sqlite");
        assert_eq!(config.descriptor_table, "xml");
        assert_eq!(config.ntuple_dir_table, "xml_ntuple_dir");
        assert_eq!(config.throttle_every, 1000);
        assert_eq!(config.throttle_pause(), Duration::from_secs(5));
        assert_eq!(config.legacy.remote_name, "UHH");
        assert_eq!(config.legacy.branches.len(), 8);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "output = \"audit.sqlite\"\nthrottle_every = 50\n\n[legacy]\nbranches = [\"RunII_80X_v3\"]\n",
        )
        .unwrap();

        let stem = dir.path().join("custom");
        let config = load_configuration_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(config.output, "audit.sqlite");
        assert_eq!(config.throttle_every, 50);
        assert_eq!(config.legacy.branches, vec!["RunII_80X_v3".to_string()]);
        assert_eq!(config.legacy.clone_dir, "UHHCounting");
        assert_eq!(config.niceness, 10);
    }
}
