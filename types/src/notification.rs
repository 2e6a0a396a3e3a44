//! Compact notification record for the oversized-payload relay optimization.

use serde::{Deserialize, Serialize};

use crate::wire::WireType;

/// Sent in place of an oversized `REV_INIT` payload. The receiver checks
/// whether it already holds a matching object and pulls the full payload from
/// the sender only if it does not.
///
/// The same record shape is used for the pull request back to the notifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadNotification {
    /// URL of the gossiper that holds the full payload.
    pub sender: String,
    /// Period the payload belongs to.
    pub period: String,
    /// Wire type of the withheld object.
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Origin entity URL (payload slot 0) of the withheld object.
    pub entity_url: String,
}
