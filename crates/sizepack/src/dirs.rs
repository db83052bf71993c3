//! User-level directories

use std::path::PathBuf;

use etcetera::BaseStrategy;

pub const APP_DIR: &str = "sizepack";
pub const CONFIG_FILE_NAME: &str = "sizepack.toml";

/// `<config dir>/sizepack/sizepack.toml`, if a home directory can be found
pub fn user_config_file() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join(APP_DIR).join(CONFIG_FILE_NAME))
}
