//! Failure classification for backend calls.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What went wrong with a backend call, reduced to the cases the
/// session cares about. Every kind is recovered the same way on the
/// interactive path; the kind is kept for logging.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    Status,
    Malformed,
    Backend,
}
