// minirt/src/error.rs

/// Failures reported by the checked entry points.
///
/// The unchecked runtime entry points never fail; they return the sentinel
/// values documented on each function instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("integer division by zero")]
    DivideByZero,
    #[error("invalid arena bounds: start {start:#010x} is above end {end:#010x}")]
    InvalidArenaBounds { start: u32, end: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
