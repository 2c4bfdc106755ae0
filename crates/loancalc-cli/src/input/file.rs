use loancalc_core::amortization::EngineConfig;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Load an engine configuration from JSON or YAML, chosen by extension.
/// Missing keys take their defaults; the result is validated before use.
pub fn read_config(path: &str) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let config = parse_config(&canonical, &contents)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(path: &Path, contents: &str) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let config = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?,
        Some("json") => serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?,
        _ => {
            return Err(format!(
                "Unsupported config format '{}': expected .json, .yaml or .yml",
                path.display()
            )
            .into())
        }
    };
    Ok(config)
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loancalc_core::amortization::ScheduleStrategy;

    #[test]
    fn test_parse_yaml_config() {
        let config = parse_config(
            Path::new("loan.yaml"),
            "strategy: principal_amortized\nminor_units_per_major: 1000\n",
        )
        .unwrap();
        assert_eq!(config.strategy, ScheduleStrategy::PrincipalAmortized);
        assert_eq!(config.minor_units_per_major, 1000);
        assert_eq!(config.fixed_point_digits, 12);
    }

    #[test]
    fn test_parse_json_config() {
        let config = parse_config(Path::new("loan.JSON"), r#"{ "rate_decimals": 3 }"#).unwrap();
        assert_eq!(config.rate_decimals, 3);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(parse_config(Path::new("loan.toml"), "").is_err());
    }

    #[test]
    fn test_missing_file_rejected() {
        assert!(read_config("does/not/exist.yaml").is_err());
    }
}
