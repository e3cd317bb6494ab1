use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Layer with SSRC {ssrc} is already bound to track {track_sid}")]
    DuplicateLayer { track_sid: String, ssrc: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
