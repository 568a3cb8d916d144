use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AlarmError {
    #[error("remote store error: {0}")]
    Store(String),
    #[error("remote store not ready")]
    StoreNotReady,
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motion sensor")]
    MissingSensor,
    #[error("missing buzzer")]
    MissingBuzzer,
    #[error("missing status led")]
    MissingLed,
    #[error("missing remote store")]
    MissingStore,
    #[error("missing wall clock")]
    MissingWallClock,
    #[error("missing device identity")]
    MissingDevice,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
