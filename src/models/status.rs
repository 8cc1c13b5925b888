use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review state of a property note
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PropertyStatus {
    #[serde(rename = "관심")]
    Interested,
    #[default]
    #[serde(rename = "검토중")]
    Reviewing,
    #[serde(rename = "보류")]
    OnHold,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 3] = [
        PropertyStatus::Interested,
        PropertyStatus::Reviewing,
        PropertyStatus::OnHold,
    ];

    /// Label as stored by the backend
    pub fn label(self) -> &'static str {
        match self {
            PropertyStatus::Interested => "관심",
            PropertyStatus::Reviewing => "검토중",
            PropertyStatus::OnHold => "보류",
        }
    }

    /// Badge color used when rendering the status
    pub fn color(self) -> &'static str {
        match self {
            PropertyStatus::Interested => "green",
            PropertyStatus::Reviewing => "yellow",
            PropertyStatus::OnHold => "red",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "관심" | "interested" => Ok(PropertyStatus::Interested),
            "검토중" | "reviewing" => Ok(PropertyStatus::Reviewing),
            "보류" | "on-hold" | "onhold" => Ok(PropertyStatus::OnHold),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_labels_are_korean() {
        for status in PropertyStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.label()));
        }
    }

    #[test]
    fn parses_english_aliases() {
        assert_eq!("on-hold".parse::<PropertyStatus>(), Ok(PropertyStatus::OnHold));
        assert_eq!("관심".parse::<PropertyStatus>(), Ok(PropertyStatus::Interested));
        assert!("sold".parse::<PropertyStatus>().is_err());
    }
}
