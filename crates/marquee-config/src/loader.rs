//! Configuration file loading and error types.

use std::{fs, path::Path};

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid yaml config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid toml config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unrecognized config extension (expected toml, yaml, or json)")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

/// Load a config file, picking the parser from the file extension.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let format = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let data = fs::read_to_string(path)?;
    match format {
        "toml" => Ok(toml::from_str(&data)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&data)?),
        "json" | "jsonc" => {
            // Deployment files get to carry // comments.
            let reader = json_comments::StripComments::new(data.as_bytes());
            Ok(serde_json::from_reader(reader)?)
        }
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[server]
listen = "127.0.0.1:4433"

[upstream]
host = "127.0.0.1"

[tls]
cert = "cert.pem"
key = "key.pem"
"#;

    #[test]
    fn loads_toml_by_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.server.listen, "127.0.0.1:4433");
    }

    #[test]
    fn loads_jsonc_with_comments() {
        let mut file = tempfile::Builder::new()
            .suffix(".jsonc")
            .tempfile()
            .unwrap();
        file.write_all(
            br#"{
  // front-tier listener
  "server": { "listen": "127.0.0.1:4433" },
  "upstream": { "host": "127.0.0.1" },
  "tls": { "cert": "cert.pem", "key": "key.pem" }
}"#,
        )
        .unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.upstream.host, "127.0.0.1");
    }

    #[test]
    fn rejects_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        file.write_all(b"listen=1").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat)
        ));
    }
}
