//! 配置管理模块
//!
//! 支持多格式配置文件加载与环境变量覆盖。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub service_name: String,
    pub environment: String,
    /// 新建解析器时是否允许按调用方推断预设
    pub guess: bool,
    pub observability: ObservabilityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_name: "preset-rules".to_string(),
            environment: "development".to_string(),
            guess: true,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl EngineConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml
    /// 2. config/{environment}.toml
    /// 3. config/{service_name}.toml
    /// 4. 环境变量（PRESET_RULES_ 前缀，如 PRESET_RULES_GUESS -> guess）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("PRESET_RULES_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), service_name, &env)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, service_name: &str, env: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("PRESET_RULES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.guess);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.json_logs());
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_load_layers_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "guess = true\n[observability]\nlog_level = \"debug\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("production.toml"),
            "guess = false\n[observability]\nlog_format = \"json\"\n",
        )
        .unwrap();

        let config = EngineConfig::load_from(dir.path(), "preset-rules", "production").unwrap();
        assert_eq!(config.service_name, "preset-rules");
        assert_eq!(config.environment, "production");
        assert!(!config.guess);
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json_logs());
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(dir.path(), "preset-rules", "test").unwrap();
        assert!(config.guess);
        assert_eq!(config.environment, "test");
        assert_eq!(config.observability.log_format, "pretty");
    }
}
