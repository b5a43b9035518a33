//! Clip generation settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::quality::VideoQuality;

/// Target aspect ratio for a rendered clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    /// 9:16 vertical (shorts, reels)
    #[default]
    #[serde(rename = "9:16")]
    Vertical,
    /// 16:9 landscape
    #[serde(rename = "16:9")]
    Landscape,
    /// 1:1 square
    #[serde(rename = "1:1")]
    Square,
    /// 4:5 portrait feed
    #[serde(rename = "4:5")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "4:5",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "9:16" => Ok(AspectRatio::Vertical),
            "16:9" => Ok(AspectRatio::Landscape),
            "1:1" => Ok(AspectRatio::Square),
            "4:5" => Ok(AspectRatio::Portrait),
            _ => Err(AspectRatioParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown aspect ratio: {0}")]
pub struct AspectRatioParseError(String);

/// Render options carried by a clip generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipSettings {
    /// Output quality; must not exceed the owning plan's ceiling.
    #[serde(default)]
    pub quality: VideoQuality,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Burn subtitles into the clip.
    #[serde(default = "default_subtitles")]
    pub subtitles: bool,
}

fn default_subtitles() -> bool {
    true
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            quality: VideoQuality::Hd,
            aspect_ratio: AspectRatio::Vertical,
            subtitles: true,
        }
    }
}

impl ClipSettings {
    /// Settings with a specific output quality.
    pub fn with_quality(mut self, quality: VideoQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Settings with a specific aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_parse_round_trip() {
        for ratio in ["9:16", "16:9", "1:1", "4:5"] {
            assert_eq!(ratio.parse::<AspectRatio>().unwrap().as_str(), ratio);
        }
        assert!("21:9".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = ClipSettings::default();
        assert_eq!(settings.quality, VideoQuality::Hd);
        assert_eq!(settings.aspect_ratio, AspectRatio::Vertical);
        assert!(settings.subtitles);
    }

    #[test]
    fn test_builder_setters() {
        let settings = ClipSettings::default()
            .with_quality(VideoQuality::FourK)
            .with_aspect_ratio(AspectRatio::Square);
        assert_eq!(settings.quality, VideoQuality::FourK);
        assert_eq!(settings.aspect_ratio, AspectRatio::Square);
    }
}
