//! Closed identifier sets for guards, screens, and operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StateSlice;

/// Identifier of a registered precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardId {
    BaselineRequired,
    DraftRequired,
    CommittedRequired,
    AnalyticsRequired,
    AssessmentRequired,
}

impl GuardId {
    pub const ALL: [GuardId; 5] = [
        GuardId::BaselineRequired,
        GuardId::DraftRequired,
        GuardId::CommittedRequired,
        GuardId::AnalyticsRequired,
        GuardId::AssessmentRequired,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaselineRequired => "baseline_required",
            Self::DraftRequired => "draft_required",
            Self::CommittedRequired => "committed_required",
            Self::AnalyticsRequired => "analytics_required",
            Self::AssessmentRequired => "assessment_required",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal name of a view, decoupled from its navigable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenId {
    Upload,
    Assessment,
    TimelineGenerate,
    TimelineDraft,
    TimelineCommitted,
    Progress,
    Dashboard,
    Analytics,
    AssessmentResults,
}

impl ScreenId {
    pub const ALL: [ScreenId; 9] = [
        ScreenId::Upload,
        ScreenId::TimelineGenerate,
        ScreenId::TimelineDraft,
        ScreenId::TimelineCommitted,
        ScreenId::Progress,
        ScreenId::Dashboard,
        ScreenId::Analytics,
        ScreenId::Assessment,
        ScreenId::AssessmentResults,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Assessment => "assessment",
            Self::TimelineGenerate => "timeline_generate",
            Self::TimelineDraft => "timeline_draft",
            Self::TimelineCommitted => "timeline_committed",
            Self::Progress => "progress",
            Self::Dashboard => "dashboard",
            Self::Analytics => "analytics",
            Self::AssessmentResults => "assessment_results",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Upload => "Upload Documents",
            Self::Assessment => "Wellbeing Assessment",
            Self::TimelineGenerate => "Generate Timeline",
            Self::TimelineDraft => "Draft Timeline",
            Self::TimelineCommitted => "Committed Timeline",
            Self::Progress => "Progress Tracking",
            Self::Dashboard => "Dashboard",
            Self::Analytics => "Analytics",
            Self::AssessmentResults => "Assessment Results",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend event that justifies a State Store setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confirmation {
    BaselineCreated,
    DraftGenerated,
    TimelineCommitted,
    AssessmentSubmitted,
}

impl Confirmation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaselineCreated => "baseline_created",
            Self::DraftGenerated => "draft_generated",
            Self::TimelineCommitted => "timeline_committed",
            Self::AssessmentSubmitted => "assessment_submitted",
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-changing request sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateBaseline,
    GenerateTimeline,
    CommitTimeline,
    StartProgressTracking,
    RequestAnalytics,
    SubmitAssessment,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::CreateBaseline,
        Operation::GenerateTimeline,
        Operation::CommitTimeline,
        Operation::StartProgressTracking,
        Operation::RequestAnalytics,
        Operation::SubmitAssessment,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateBaseline => "create_baseline",
            Self::GenerateTimeline => "generate_timeline",
            Self::CommitTimeline => "commit_timeline",
            Self::StartProgressTracking => "start_progress_tracking",
            Self::RequestAnalytics => "request_analytics",
            Self::SubmitAssessment => "submit_assessment",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateBaseline => "Create baseline",
            Self::GenerateTimeline => "Generate timeline",
            Self::CommitTimeline => "Commit timeline",
            Self::StartProgressTracking => "Start progress tracking",
            Self::RequestAnalytics => "Request analytics",
            Self::SubmitAssessment => "Submit assessment",
        }
    }

    /// The confirmation a successful backend response stands for, if any.
    #[must_use]
    pub const fn confirmation(self) -> Option<Confirmation> {
        match self {
            Self::CreateBaseline => Some(Confirmation::BaselineCreated),
            Self::GenerateTimeline => Some(Confirmation::DraftGenerated),
            Self::CommitTimeline => Some(Confirmation::TimelineCommitted),
            Self::SubmitAssessment => Some(Confirmation::AssessmentSubmitted),
            Self::StartProgressTracking | Self::RequestAnalytics => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A screen or operation precondition did not hold.
///
/// Expected under normal use; callers turn it into a redirect or a
/// notification and never let it reach a generic error handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GuardViolationError {
    pub operation_id: GuardId,
    pub message: &'static str,
    pub relevant_state: StateSlice,
}

#[cfg(test)]
mod tests {
    use super::{Confirmation, GuardId, Operation, ScreenId};

    #[test]
    fn guard_ids_round_trip_through_their_names() {
        for id in GuardId::ALL {
            assert_eq!(GuardId::parse(id.as_str()), Some(id));
        }
        assert_eq!(GuardId::parse("unknown_guard"), None);
    }

    #[test]
    fn guard_id_serializes_as_snake_case() {
        let json = serde_json::to_string(&GuardId::CommittedRequired).unwrap();
        assert_eq!(json, "\"committed_required\"");
    }

    #[test]
    fn only_mutating_operations_carry_confirmations() {
        assert_eq!(
            Operation::CommitTimeline.confirmation(),
            Some(Confirmation::TimelineCommitted)
        );
        assert_eq!(Operation::RequestAnalytics.confirmation(), None);
        assert_eq!(Operation::StartProgressTracking.confirmation(), None);
    }

    #[test]
    fn every_screen_has_a_title() {
        for screen in ScreenId::ALL {
            assert!(!screen.title().is_empty());
        }
    }
}
