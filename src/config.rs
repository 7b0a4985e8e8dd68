use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Engine thresholds and the commission policy selector.
/// All amounts in kobo.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Minimum withdrawal amount (₦2,000).
    pub min_withdrawal_kobo: u64,
    /// Completed transactions before a referral qualifies.
    pub qualification_threshold: u32,
    /// Flat bonus per qualified referral (₦1,000).
    pub referral_bonus_kobo: u64,
    /// "fixed" | "percent" - see referral::commission for the discrepancy.
    pub commission_model: String,
    /// Basis points for the percent model (50 = 0.5%).
    pub commission_rate_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_withdrawal_kobo: 200_000,
            qualification_threshold: 3,
            referral_bonus_kobo: 100_000,
            commission_model: "fixed".to_string(),
            commission_rate_bps: 50,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_withdrawal_kobo, 200_000);
        assert_eq!(cfg.qualification_threshold, 3);
        assert_eq!(cfg.commission_model, "fixed");
    }

    #[test]
    fn test_engine_section_defaults_when_absent() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: nairadesk.log
use_json: false
rotation: daily
enable_tracing: true
gateway:
  host: 127.0.0.1
  port: 8080
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.engine.qualification_threshold, 3);
        assert_eq!(cfg.gateway.port, 8080);
    }
}
