//! User-wide settings for tree-change-aggregator.
//!
//! Location: $XDG_CONFIG_HOME/tree-change-aggregator/settings.toml

use super::AggregatorSettings;
use crate::error::AggregatorResult;
use std::path::PathBuf;

/// Returns the path to the user settings file.
///
/// Returns None when $XDG_CONFIG_HOME is not set.
pub fn user_config_path() -> Option<PathBuf> {
    let xdg_config = std::env::var("XDG_CONFIG_HOME").ok()?;
    Some(
        PathBuf::from(xdg_config)
            .join("tree-change-aggregator")
            .join("settings.toml"),
    )
}

/// Load the user settings file if it exists.
///
/// `Ok(None)` means there is no user file, which is the zero-config default.
pub fn load_user_settings() -> AggregatorResult<Option<AggregatorSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    AggregatorSettings::load(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn user_config_path_uses_xdg_config_home_when_set() {
        let original = env::var("XDG_CONFIG_HOME").ok();

        // SAFETY: only this test touches XDG_CONFIG_HOME and it restores the
        // original value before asserting.
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "/custom/config");
        }

        let path = user_config_path();

        // SAFETY: Same as above - restoring original env state
        unsafe {
            match original {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert_eq!(
            path,
            Some(PathBuf::from(
                "/custom/config/tree-change-aggregator/settings.toml"
            )),
            "should use XDG_CONFIG_HOME/tree-change-aggregator/settings.toml"
        );
    }
}
