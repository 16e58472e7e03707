//! Universe resolution port.

use crate::domain::error::SwingscanError;

pub trait UniversePort {
    /// Ordered instrument identifiers for a named market.
    ///
    /// Fails with `SwingscanError::UniverseUnavailable` when the market cannot
    /// be resolved at all.
    fn resolve_universe(&self, market: &str) -> Result<Vec<String>, SwingscanError>;

    fn list_markets(&self) -> Result<Vec<String>, SwingscanError>;
}
