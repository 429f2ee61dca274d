pub mod settings;
pub mod user;

pub use settings::{AggregatorSettings, DEFAULT_DEPTH_CAPACITY};
pub use user::{load_user_settings, user_config_path};

use crate::error::AggregatorResult;
use std::path::Path;

/// Resolve settings from layered sources: defaults < user config < explicit file.
///
/// A broken user config is logged and skipped; a broken explicit file is an
/// error, since the caller asked for it by name.
pub fn resolve_settings(explicit: Option<&Path>) -> AggregatorResult<AggregatorSettings> {
    if let Some(path) = explicit {
        return AggregatorSettings::load(path);
    }

    match load_user_settings() {
        Ok(Some(settings)) => {
            log::debug!(
                target: "tree_change_aggregator::config",
                "Loaded user settings from XDG_CONFIG_HOME"
            );
            Ok(settings)
        }
        Ok(None) => Ok(AggregatorSettings::default()),
        Err(err) => {
            log::warn!(
                target: "tree_change_aggregator::config",
                "Failed to load user settings, using defaults: {}",
                err
            );
            Ok(AggregatorSettings::default())
        }
    }
}
