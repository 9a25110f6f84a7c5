pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

pub fn default_stream() -> bool {
    true
}

/// Seconds to wait for the next chunk; zero waits forever.
pub fn default_stream_timeout() -> u64 {
    0
}

pub fn default_data_dir() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|home| home.join(".cache").join("runix"))
}
