use serde::{Deserialize, Serialize};
use std::fmt;

/// Status tier of a bay, derived only from its elapsed loading time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusTier {
    Available,
    OnTrack,
    Warning,
    Overtime,
}

impl StatusTier {
    /// Human label shown on the board.
    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Available => "Available",
            StatusTier::OnTrack => "On Track",
            StatusTier::Warning => "Warning",
            StatusTier::Overtime => "Overtime",
        }
    }

    /// Style tag consumed by renderers.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusTier::Available => "empty",
            StatusTier::OnTrack => "status-on",
            StatusTier::Warning => "status-warn",
            StatusTier::Overtime => "status-ot",
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
