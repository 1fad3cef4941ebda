use std::path::Path;

use waterfall_core::config::EngineConfig;

use crate::input;

/// Load the engine config, or defaults when no path is given.
///
/// YAML is picked by extension; anything else is read as JSON.
pub fn load(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let contents = input::file::read_text(path)?;

    let is_yaml = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let config = if is_yaml {
        let cfg: EngineConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config '{}': {}", path, e))?;
        cfg.validate()?;
        cfg
    } else {
        EngineConfig::from_json_str(&contents)
            .map_err(|e| format!("Failed to parse config '{}': {}", path, e))?
    };
    tracing::debug!(path, "engine config loaded");
    Ok(config)
}
