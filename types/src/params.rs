//! Node-wide threshold-signing parameters.

use serde::{Deserialize, Serialize};

use crate::GossipError;

/// Quorum parameters shared by every gossiper in a deployment.
///
/// Read-only after node initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Total participant count `N`.
    pub total: usize,
    /// Signing threshold `T` — a FULL object is valid only once `T` distinct
    /// signers have contributed fragments.
    pub threshold: usize,
}

impl ThresholdParams {
    pub fn new(total: usize, threshold: usize) -> Result<Self, GossipError> {
        let params = Self { total, threshold };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), GossipError> {
        if self.threshold == 0 || self.threshold > self.total {
            return Err(GossipError::InvalidParams {
                total: self.total,
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}
