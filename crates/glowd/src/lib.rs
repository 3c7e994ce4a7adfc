pub mod api;
pub mod config;
pub mod export;
pub mod predict;
pub mod settings;
pub mod status;
pub mod store;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use predict::FALLBACK_RULE;
pub use predict::HttpRuleSource;
pub use predict::RuleSource;
pub use settings::Settings;
pub use settings::SettingsStore;
pub use store::State;
pub use store::Store;
