//! Congestion control algorithms for QUIC-based protocols.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionControl {
    Cubic,
    NewReno,
    #[default]
    Bbr,
    /// Hysteria's fixed-rate sender; needs both bandwidth hints.
    Brutal,
}

impl CongestionControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionControl::Cubic => "cubic",
            CongestionControl::NewReno => "new_reno",
            CongestionControl::Bbr => "bbr",
            CongestionControl::Brutal => "brutal",
        }
    }
}

impl fmt::Display for CongestionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&CongestionControl::NewReno).unwrap(), "\"new_reno\"");
        assert_eq!(CongestionControl::default(), CongestionControl::Bbr);
        assert_eq!(CongestionControl::Brutal.to_string(), "brutal");
    }
}
