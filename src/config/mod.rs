use serde::Deserialize;

pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:17864/sdapi/v1/txt2img";
pub const DEFAULT_CACHE_DIR: &str = "cache";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub address: String,
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Appended to artifact file names when set, e.g. `png`.
    #[serde(default)]
    pub cache_file_extension: Option<String>,
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}
