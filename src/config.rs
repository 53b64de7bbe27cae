use serde::Deserialize;

/// Server configuration.
///
/// The MTU doubles as the chunked-transfer threshold and the upper bound on
/// query strings and header blocks; `cache_max_age_ms` is the idle-eviction
/// threshold for page instances.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub mtu: usize,
    pub cache_max_age_ms: u64,
    pub query_char: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:1024".to_string(),
            mtu: 65535,
            cache_max_age_ms: 3_600_000,
            query_char: '?',
        }
    }
}

impl Config {
    /// Loads configuration from the YAML file named by `PAGELET_CONFIG`,
    /// falling back to defaults; a `LISTEN` variable overrides the bind
    /// address either way.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("PAGELET_CONFIG") {
            Ok(path) => Self::from_yaml(&std::fs::read_to_string(&path)?)?,
            Err(_) => Self::default(),
        };
        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.listen_addr = addr;
        }
        Ok(cfg)
    }

    pub fn from_yaml(s: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub(crate) fn cache_max_age(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cache_max_age_ms)
    }
}
