use crate::config;

/// Load settings, falling back to defaults when the file is broken.
pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("encore: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // A bad config file should not keep the player from starting.
            eprintln!("encore: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
