use clap::Subcommand;
use focusbell_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dot-path key
    Get {
        /// e.g. "timer.work_minutes", "sound.profile"
        key: String,
    },
    /// Change one value and save
    Set { key: String, value: String },
    /// Show every key
    List {
        /// Print the whole config as JSON instead of key = value lines
        #[arg(long)]
        json: bool,
    },
    /// Overwrite the config file with defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;

            // The file keeps what was typed; the timer sees the clamped value.
            let stored = config.get(&key).unwrap_or_default();
            let effective = flatten(&serde_json::to_value(config.settings())?)
                .into_iter()
                .find(|(k, _)| settings_key(&key) == Some(k.as_str()))
                .map(|(_, v)| v);
            match effective {
                Some(v) if v != stored => println!("{key} = {stored} (in effect: {v})"),
                _ => println!("{key} = {stored}"),
            }
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            let value = serde_json::to_value(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for (key, v) in flatten(&value) {
                    println!("{key} = {v}");
                }
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}

/// Map a config dot-path onto the matching flat `Settings` field.
fn settings_key(key: &str) -> Option<&str> {
    match key {
        "sound.enabled" => Some("sound_enabled"),
        "sound.volume" => Some("sound_volume"),
        "sound.profile" => Some("sound_profile"),
        _ => key.strip_prefix("timer."),
    }
}

/// Leaf values keyed by dot-path, sorted by key.
fn flatten(value: &serde_json::Value) -> Vec<(String, String)> {
    fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let path = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&path, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }
    let mut out = Vec::new();
    walk("", value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_uses_dot_paths() {
        let value = serde_json::to_value(Config::default()).unwrap();
        let flat = flatten(&value);
        assert!(flat.contains(&("timer.work_minutes".into(), "25".into())));
        assert!(flat.contains(&("sound.profile".into(), "bell".into())));
    }

    #[test]
    fn settings_key_maps_both_sections() {
        assert_eq!(settings_key("timer.break_minutes"), Some("break_minutes"));
        assert_eq!(settings_key("sound.volume"), Some("sound_volume"));
        assert_eq!(settings_key("bogus"), None);
    }
}
