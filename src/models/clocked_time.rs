use serde::{Deserialize, Serialize};

/// One completed time stamp taken while a bay was occupied.
///
/// Records are immutable once written; they are only ever deleted.
/// `total_seconds` and `elapsed_time` describe the same duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockedTime {
    #[serde(default)]
    pub id: String,
    pub bay_id: String,
    #[serde(default)]
    pub bay_number: String,
    #[serde(default)]
    pub truck_number: String,
    pub elapsed_time: String,
    pub total_seconds: u64,
    pub clocked_at: u64,
    /// `YYYY-MM-DD` (UTC) of `clocked_at`, used for range queries.
    pub date: String,
}
