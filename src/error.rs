use thiserror::Error;

/// Everything a command or a long-running operation can fail with.
///
/// None of these are fatal: the console prints them and returns to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),
    #[error("invalid number")]
    InvalidNumber,
    #[error("{what} must be 0..{max}")]
    OutOfRange { what: &'static str, max: u32 },
    #[error("{0} must be >= 1")]
    Zero(&'static str),
    #[error("bad dst_ip format (use a.b.c.d)")]
    InvalidAddress,
    #[error("calibration TIMEOUT")]
    CalibrationTimeout,
    #[error("no ARP reply")]
    ArpTimeout,
    #[error("cannot bind UDP port {0}")]
    Bind(u16),
    #[error("no transmit buffer available")]
    NoTxBuffer,
    #[error("payload max too small")]
    PayloadTooSmall,
    #[error("command registry is full")]
    RegistryFull,
    #[error("{0} not present in this build")]
    NotPresent(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
