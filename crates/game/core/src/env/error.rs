//! Errors for missing oracle data.

/// Raised when the engine needs an oracle that was not provided, or a lookup
/// that has no tolerable default fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("card data not available")]
    CardsNotAvailable,

    #[error("map data not available")]
    MapNotAvailable,

    #[error("mission data not available")]
    MissionsNotAvailable,

    #[error("rng not available")]
    RngNotAvailable,
}
