use std::path::Path;

use crate::config;

/// Load settings from `explicit` (the `--config` flag) or the default
/// location. Config is optional: failures fall back to defaults.
pub fn load_settings(explicit: Option<&Path>) -> config::Settings {
    if let Some(path) = explicit {
        if !path.exists() {
            eprintln!("record: config file {} not found, ignoring", path.display());
        }
    }
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(config::resolve_config_path);

    match config::Settings::load_from(path.as_deref()) {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("record: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            eprintln!("record: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
