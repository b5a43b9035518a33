//! Subscription plans, per-plan limits and dispatch priority.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quality::VideoQuality;

/// Upload size ceilings in bytes for each plan.
pub const FREE_MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024; // 500 MB
pub const CREATOR_MAX_VIDEO_BYTES: u64 = 5 * 1024 * 1024 * 1024; // 5 GB
pub const PRO_MAX_VIDEO_BYTES: u64 = 20 * 1024 * 1024 * 1024; // 20 GB

/// Source duration ceilings in seconds for each plan.
pub const FREE_MAX_VIDEO_SECS: u64 = 30 * 60; // 30 minutes
pub const CREATOR_MAX_VIDEO_SECS: u64 = 3 * 60 * 60; // 3 hours
pub const PRO_MAX_VIDEO_SECS: u64 = 10 * 60 * 60; // 10 hours

/// Subscription plan enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Creator,
    Pro,
}

impl Plan {
    /// Parse from string (case-insensitive, unknown tiers fall back to Free).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "creator" => Plan::Creator,
            "pro" => Plan::Pro,
            _ => Plan::Free,
        }
    }

    /// Get the plan name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Creator => "creator",
            Plan::Pro => "pro",
        }
    }

    /// Entitlement level, higher means more entitled.
    pub fn entitlement(&self) -> u8 {
        match self {
            Plan::Free => 0,
            Plan::Creator => 1,
            Plan::Pro => 2,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dispatch priority rank. Lower ranks are served first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Priority(pub u8);

impl Priority {
    /// The highest rank any plan can receive.
    pub const HIGHEST: Priority = Priority(1);

    /// Numeric rank (1 is served before 2, before 3).
    pub fn rank(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a plan to its dispatch priority.
///
/// Consulted independently by both stage queues, so it lives here rather
/// than inside either queue's configuration.
pub fn priority_of(plan: Plan) -> Priority {
    match plan {
        Plan::Pro => Priority(1),
        Plan::Creator => Priority(2),
        Plan::Free => Priority(3),
    }
}

/// Quota and quality ceilings for a plan. One immutable record per plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanLimits {
    /// Uploads allowed per calendar month.
    pub videos_per_month: u32,
    /// Maximum source file size in bytes.
    pub max_video_size_bytes: u64,
    /// Maximum source duration in seconds.
    pub max_video_duration_secs: u64,
    /// Highest output quality the plan may request.
    pub max_quality: VideoQuality,
    /// Hard cap on clip jobs submitted per video.
    pub max_clips_per_video: u32,
    /// Dispatch priority for all of the subscriber's jobs.
    pub priority_rank: Priority,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            videos_per_month: 1,
            max_video_size_bytes: FREE_MAX_VIDEO_BYTES,
            max_video_duration_secs: FREE_MAX_VIDEO_SECS,
            max_quality: VideoQuality::Hd,
            max_clips_per_video: 5,
            priority_rank: Priority(3),
        }
    }
}

impl PlanLimits {
    /// Limits for a specific plan.
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => Self::default(),
            Plan::Creator => Self {
                videos_per_month: 20,
                max_video_size_bytes: CREATOR_MAX_VIDEO_BYTES,
                max_video_duration_secs: CREATOR_MAX_VIDEO_SECS,
                max_quality: VideoQuality::FourK,
                max_clips_per_video: 10,
                priority_rank: Priority(2),
            },
            Plan::Pro => Self {
                // Effectively unlimited, kept as a finite count so the
                // quota check stays uniform across plans.
                videos_per_month: 999_999,
                max_video_size_bytes: PRO_MAX_VIDEO_BYTES,
                max_video_duration_secs: PRO_MAX_VIDEO_SECS,
                max_quality: VideoQuality::EightK,
                max_clips_per_video: 20,
                priority_rank: Priority(1),
            },
        }
    }
}

/// Snapshot of a subscriber's consumption, supplied by the caller at
/// submission time. Usage metering itself is billing-side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlanUsage {
    /// Videos already submitted this calendar month.
    pub videos_this_month: u32,
}

impl PlanUsage {
    /// Create a new usage snapshot.
    pub fn new(videos_this_month: u32) -> Self {
        Self { videos_this_month }
    }

    /// Whether one more upload would exceed the monthly quota.
    pub fn at_video_limit(&self, limits: &PlanLimits) -> bool {
        self.videos_this_month >= limits.videos_per_month
    }

    /// Uploads remaining this month.
    pub fn remaining_videos(&self, limits: &PlanLimits) -> u32 {
        limits.videos_per_month.saturating_sub(self.videos_this_month)
    }
}
