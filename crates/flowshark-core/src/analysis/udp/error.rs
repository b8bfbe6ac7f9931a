use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UdpError {
    #[error("frame slicing failed: {0}")]
    Slice(String),
    #[error("frame has no network layer")]
    MissingNetworkLayer,
    #[error("UDP segment too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
