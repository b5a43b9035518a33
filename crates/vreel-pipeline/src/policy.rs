//! Submission-time admission checks against plan limits.
//!
//! Violations are rejected before anything is enqueued; the error names
//! the specific limit so callers can surface it verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vreel_models::{ClipSettings, Plan, PlanLimits, PlanUsage, VideoQuality};

/// One upload as presented for admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Owning user ID
    pub user_id: String,
    /// Original filename
    pub filename: String,
    /// Source file size in bytes
    pub size_bytes: u64,
    /// Source duration in seconds
    pub duration_secs: u64,
    /// Requested clip output settings
    #[serde(default)]
    pub settings: ClipSettings,
    /// Spoken-language hint forwarded to transcription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Minimum segment score required to cut a clip; falls back to the
    /// pipeline-wide default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_threshold: Option<f64>,
}

impl UploadRequest {
    pub fn new(
        user_id: impl Into<String>,
        filename: impl Into<String>,
        size_bytes: u64,
        duration_secs: u64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            filename: filename.into(),
            size_bytes,
            duration_secs,
            settings: ClipSettings::default(),
            language: None,
            publish_threshold: None,
        }
    }

    pub fn with_settings(mut self, settings: ClipSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_publish_threshold(mut self, threshold: f64) -> Self {
        self.publish_threshold = Some(threshold);
        self
    }
}

/// A plan limit the upload failed, named so callers can report it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyViolation {
    #[error("monthly video limit reached ({used}/{limit} on the {plan} plan)")]
    MonthlyQuota { plan: Plan, used: u32, limit: u32 },

    #[error("file size {size_bytes} bytes exceeds the {plan} plan limit of {max_bytes} bytes")]
    FileTooLarge {
        plan: Plan,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("duration {duration_secs}s exceeds the {plan} plan limit of {max_secs}s")]
    VideoTooLong {
        plan: Plan,
        duration_secs: u64,
        max_secs: u64,
    },

    #[error("quality {requested} is not available on the {plan} plan (up to {max})")]
    QualityNotAllowed {
        plan: Plan,
        requested: VideoQuality,
        max: VideoQuality,
    },
}

/// Validate an upload against the plan's limits.
///
/// Returns the first violated limit. Reads only the caller-supplied usage
/// snapshot; nothing here touches the queues.
pub fn check_upload(
    request: &UploadRequest,
    plan: Plan,
    usage: &PlanUsage,
) -> Result<(), PolicyViolation> {
    let limits = PlanLimits::for_plan(plan);

    if usage.at_video_limit(&limits) {
        return Err(PolicyViolation::MonthlyQuota {
            plan,
            used: usage.videos_this_month,
            limit: limits.videos_per_month,
        });
    }
    if request.size_bytes > limits.max_video_size_bytes {
        return Err(PolicyViolation::FileTooLarge {
            plan,
            size_bytes: request.size_bytes,
            max_bytes: limits.max_video_size_bytes,
        });
    }
    if request.duration_secs > limits.max_video_duration_secs {
        return Err(PolicyViolation::VideoTooLong {
            plan,
            duration_secs: request.duration_secs,
            max_secs: limits.max_video_duration_secs,
        });
    }
    if !limits.max_quality.allows(request.settings.quality) {
        return Err(PolicyViolation::QualityNotAllowed {
            plan,
            requested: request.settings.quality,
            max: limits.max_quality,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn usage(videos: u32) -> PlanUsage {
        PlanUsage {
            videos_this_month: videos,
        }
    }

    #[test]
    fn test_upload_within_limits_passes() {
        let request = UploadRequest::new("user_1", "interview.mp4", 1024 * MB, 3600);
        assert_eq!(check_upload(&request, Plan::Creator, &usage(19)), Ok(()));
    }

    #[test]
    fn test_boundary_values_pass() {
        // Exactly at the Free plan's size and duration ceilings.
        let request = UploadRequest::new("user_1", "short.mp4", 500 * MB, 1800);
        assert_eq!(check_upload(&request, Plan::Free, &usage(0)), Ok(()));
    }

    #[test]
    fn test_monthly_quota_reached() {
        let request = UploadRequest::new("user_1", "one_more.mp4", 10 * MB, 60);
        let err = check_upload(&request, Plan::Free, &usage(1)).unwrap_err();
        assert!(matches!(
            err,
            PolicyViolation::MonthlyQuota {
                used: 1,
                limit: 1,
                ..
            }
        ));
        assert!(err.to_string().contains("monthly video limit"));
    }

    #[test]
    fn test_oversize_rejected() {
        let request = UploadRequest::new("user_1", "huge.mp4", 600 * MB, 60);
        let err = check_upload(&request, Plan::Free, &usage(0)).unwrap_err();
        assert!(matches!(err, PolicyViolation::FileTooLarge { .. }));
        assert!(err.to_string().contains("free plan"));
    }

    #[test]
    fn test_overlong_rejected() {
        let request = UploadRequest::new("user_1", "documentary.mp4", 100 * MB, 2400);
        let err = check_upload(&request, Plan::Free, &usage(0)).unwrap_err();
        assert!(matches!(
            err,
            PolicyViolation::VideoTooLong {
                duration_secs: 2400,
                max_secs: 1800,
                ..
            }
        ));
    }

    #[test]
    fn test_quality_above_plan_rejected() {
        let settings = ClipSettings {
            quality: VideoQuality::FourK,
            ..ClipSettings::default()
        };
        let request =
            UploadRequest::new("user_1", "crisp.mp4", 100 * MB, 600).with_settings(settings);
        let err = check_upload(&request, Plan::Free, &usage(0)).unwrap_err();
        assert!(matches!(err, PolicyViolation::QualityNotAllowed { .. }));
        assert!(err.to_string().contains("4K"));

        // The same settings are fine one tier up.
        let request = UploadRequest::new("user_1", "crisp.mp4", 100 * MB, 600).with_settings(
            ClipSettings {
                quality: VideoQuality::FourK,
                ..ClipSettings::default()
            },
        );
        assert_eq!(check_upload(&request, Plan::Creator, &usage(0)), Ok(()));
    }
}
