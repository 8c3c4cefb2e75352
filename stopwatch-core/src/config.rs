/// Default number of laps held before the oldest is evicted.
pub const MAX_LAPS: usize = 50;
/// Render loop period while running, about 60 frames a second.
pub const RENDER_INTERVAL_MS: u64 = 16;
/// Period of the background save timer.
pub const AUTOSAVE_INTERVAL_MS: u64 = 5000;
/// Key the snapshot is stored under.
pub const STORAGE_KEY: &str = "stopwatch.state";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub max_laps: usize,
    pub render_interval_ms: u64,
    pub autosave_interval_ms: u64,
    pub storage_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_laps: MAX_LAPS,
            render_interval_ms: RENDER_INTERVAL_MS,
            autosave_interval_ms: AUTOSAVE_INTERVAL_MS,
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}
