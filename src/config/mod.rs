//! Configuration for the resolution pipeline.

mod settings;

pub use settings::{
    AssetSettings, CacheSettings, LeaderboardSettings, ModelSettings, ResolverSettings, Settings,
    SettingsError,
};
