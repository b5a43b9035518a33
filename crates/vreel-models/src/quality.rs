//! Output quality tiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output video quality tier.
///
/// Serialized with the marketing labels the rest of the product uses
/// ("HD", "2K", "4K", "8K").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum VideoQuality {
    #[default]
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
    #[serde(rename = "8K")]
    EightK,
}

impl VideoQuality {
    /// All quality tiers, lowest first.
    pub const ALL: &'static [VideoQuality] = &[
        VideoQuality::Hd,
        VideoQuality::TwoK,
        VideoQuality::FourK,
        VideoQuality::EightK,
    ];

    /// Returns the tier label as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoQuality::Hd => "HD",
            VideoQuality::TwoK => "2K",
            VideoQuality::FourK => "4K",
            VideoQuality::EightK => "8K",
        }
    }

    /// Relative pixel rank (1 = lowest, 4 = highest).
    pub fn rank(&self) -> u8 {
        match self {
            VideoQuality::Hd => 1,
            VideoQuality::TwoK => 2,
            VideoQuality::FourK => 3,
            VideoQuality::EightK => 4,
        }
    }

    /// Whether a plan capped at `self` may render at `requested`.
    pub fn allows(&self, requested: VideoQuality) -> bool {
        self.rank() >= requested.rank()
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoQuality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HD" | "1080P" => Ok(VideoQuality::Hd),
            "2K" | "1440P" => Ok(VideoQuality::TwoK),
            "4K" | "2160P" => Ok(VideoQuality::FourK),
            "8K" | "4320P" => Ok(VideoQuality::EightK),
            _ => Err(QualityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown video quality: {0}")]
pub struct QualityParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parse() {
        assert_eq!("HD".parse::<VideoQuality>().unwrap(), VideoQuality::Hd);
        assert_eq!("hd".parse::<VideoQuality>().unwrap(), VideoQuality::Hd);
        assert_eq!("4K".parse::<VideoQuality>().unwrap(), VideoQuality::FourK);
        assert_eq!("2160p".parse::<VideoQuality>().unwrap(), VideoQuality::FourK);
        assert!("potato".parse::<VideoQuality>().is_err());
    }

    #[test]
    fn test_quality_rank_ordering() {
        assert!(VideoQuality::Hd.rank() < VideoQuality::TwoK.rank());
        assert!(VideoQuality::TwoK.rank() < VideoQuality::FourK.rank());
        assert!(VideoQuality::FourK.rank() < VideoQuality::EightK.rank());
    }

    #[test]
    fn test_quality_allows() {
        assert!(VideoQuality::EightK.allows(VideoQuality::Hd));
        assert!(VideoQuality::FourK.allows(VideoQuality::FourK));
        assert!(!VideoQuality::Hd.allows(VideoQuality::FourK));
        assert!(!VideoQuality::FourK.allows(VideoQuality::EightK));
    }

    #[test]
    fn test_quality_serde_labels() {
        let json = serde_json::to_string(&VideoQuality::FourK).unwrap();
        assert_eq!(json, "\"4K\"");
        let back: VideoQuality = serde_json::from_str("\"8K\"").unwrap();
        assert_eq!(back, VideoQuality::EightK);
    }
}
