use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub save_dir: PathBuf,
    pub trade_range_tiles: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            trade_range_tiles: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            window_title: "Landfall".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            session: SessionConfig::default(),
        }
    }
}
