use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The threshold must be within `1..=128` so that both literal and zero
    /// runs have room in the control byte.
    #[error("invalid threshold {0}, expected a value in 1..=128")]
    InvalidThreshold(u8),
}
