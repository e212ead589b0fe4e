use std::path::Path;

use crate::config::{self, Settings};

/// Load settings from `explicit` (or the resolved default path) plus the
/// environment. Broken configuration falls back to defaults with a notice;
/// logging is not up yet, so the notice goes straight to stderr.
pub fn load_settings(explicit: Option<&Path>) -> Settings {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(config::resolve_config_path);

    match Settings::load_from(path.as_deref()) {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("tunevault: invalid config, using defaults: {msg}");
                Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            eprintln!("tunevault: failed to load config, using defaults: {e}");
            Settings::default()
        }
    }
}
