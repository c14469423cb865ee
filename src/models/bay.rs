use super::{ClockedTime, StatusTier};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one physical loading bay: `bay1` .. `bayN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BayId(u32);

impl BayId {
    pub fn new(number: u32) -> AppResult<Self> {
        if number == 0 {
            return Err(AppError::UnknownBay(number.to_string()));
        }
        Ok(Self(number))
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// Parse `bay3` or a bare `3`, and check it against the configured bay count.
    pub fn parse_within(s: &str, num_bays: u32) -> AppResult<Self> {
        let id: BayId = s.parse()?;
        if id.0 > num_bays {
            return Err(AppError::UnknownBay(format!(
                "{id} (this site has {num_bays} bays)"
            )));
        }
        Ok(id)
    }

    /// All bay ids `bay1..=bayN` in order.
    pub fn all(num_bays: u32) -> impl Iterator<Item = BayId> {
        (1..=num_bays).map(BayId)
    }
}

impl fmt::Display for BayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bay{}", self.0)
    }
}

impl FromStr for BayId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let digits = raw
            .strip_prefix("bay")
            .or_else(|| raw.strip_prefix("BAY"))
            .unwrap_or(raw);
        let n: u32 = digits
            .parse()
            .map_err(|_| AppError::UnknownBay(s.to_string()))?;
        BayId::new(n).map_err(|_| AppError::UnknownBay(s.to_string()))
    }
}

impl TryFrom<String> for BayId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BayId> for String {
    fn from(id: BayId) -> Self {
        id.to_string()
    }
}

/// Bay record as stored under `truck-loading/bayN`.
///
/// `started_at == 0` means the bay is idle; `truck` is then meaningless.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bay {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub truck: String,
    #[serde(default)]
    pub started_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clocked_times: Option<Vec<ClockedTime>>,
}

impl Bay {
    pub fn new(id: BayId, truck: &str, started_at: u64) -> Self {
        Self {
            id: id.to_string(),
            truck: truck.to_string(),
            started_at,
            clocked_times: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started_at != 0
    }
}

/// A bay plus the fields derived from it at one instant. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayBay {
    pub id: BayId,
    pub truck: String,
    pub started_at: u64,
    pub elapsed_time: String,
    pub elapsed_seconds: u64,
    #[serde(skip)]
    pub tier: StatusTier,
    pub status: &'static str,
    pub status_class: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clocked_times: Vec<ClockedTime>,
}

impl DisplayBay {
    pub fn is_active(&self) -> bool {
        self.started_at != 0
    }
}
