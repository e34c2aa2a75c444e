use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (default: 0.0.0.0, reachable from other machines).
    pub bind: IpAddr,
    /// Listen port (default: 8000).
    pub port: u16,
    /// File holding the registered target embedding.
    pub store_path: PathBuf,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Euclidean distance at or below which a face matches the target.
    ///
    /// Embeddings are L2-normalized, so distance `d` is cosine similarity
    /// `1 - d²/2`. The default 0.5 (cosine 0.875) mostly matches near-identical
    /// photos; different photos of one person usually need 1.0 to 1.1.
    pub tolerance: f32,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            store_path: PathBuf::from(facegate_core::DEFAULT_STORE_PATH),
            model_dir: facegate_core::default_model_dir(),
            tolerance: facegate_core::DEFAULT_TOLERANCE,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind: parse_var(&lookup, "FACEGATE_BIND").unwrap_or(defaults.bind),
            port: parse_var(&lookup, "FACEGATE_PORT").unwrap_or(defaults.port),
            store_path: lookup("FACEGATE_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            model_dir: lookup("FACEGATE_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            tolerance: parse_var(&lookup, "FACEGATE_TOLERANCE")
                .filter(|t: &f32| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.tolerance),
            max_upload_bytes: parse_var(&lookup, "FACEGATE_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_listen_on_all_interfaces() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:8000".parse().unwrap());
        assert_eq!(cfg.store_path, PathBuf::from("target_face.json"));
        assert_eq!(cfg.tolerance, 0.5);
    }

    #[test]
    fn test_overrides() {
        let cfg = config_from(&[
            ("FACEGATE_BIND", "127.0.0.1"),
            ("FACEGATE_PORT", "9100"),
            ("FACEGATE_STORE_PATH", "/var/lib/facegate/target.json"),
            ("FACEGATE_TOLERANCE", "0.9"),
        ]);
        assert_eq!(cfg.listen_addr(), "127.0.0.1:9100".parse().unwrap());
        assert_eq!(cfg.store_path, PathBuf::from("/var/lib/facegate/target.json"));
        assert!((cfg.tolerance - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config_from(&[
            ("FACEGATE_PORT", "not-a-port"),
            ("FACEGATE_TOLERANCE", "-1"),
        ]);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.tolerance, 0.5);
    }
}
