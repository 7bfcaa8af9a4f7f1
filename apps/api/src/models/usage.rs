use serde::{Deserialize, Serialize};

use crate::billing::tier::{Quota, Tier};

/// Server-reported usage: the authoritative counter for the current calendar
/// month, with the limit of the tier it was judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUsage {
    pub current: i64,
    pub limit: Quota,
    pub tier: Tier,
}
