//! Guard Predicate Registry.
//!
//! Every [`GuardId`] maps to one [`GuardSpec`]: a pure predicate over the
//! [`StateModel`], the default message shown when it fails, and the fields it
//! reads. Screens and operations map onto guards through exhaustive matches,
//! so adding a variant without deciding its precondition does not compile.

use tracing::warn;

use waypoint_types::{
    BaselineStatus, DoctorStatus, FieldSet, GuardId, GuardViolationError, Operation, ScreenId,
    StateField, StateModel, TimelineStatus,
};

/// A registered precondition.
#[derive(Debug, Clone, Copy)]
pub struct GuardSpec {
    id: GuardId,
    message: &'static str,
    fields: FieldSet,
    predicate: fn(&StateModel) -> bool,
}

impl GuardSpec {
    #[must_use]
    pub const fn id(&self) -> GuardId {
        self.id
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Fields the predicate reads.
    #[must_use]
    pub const fn fields(&self) -> FieldSet {
        self.fields
    }

    #[must_use]
    pub fn holds(&self, state: &StateModel) -> bool {
        (self.predicate)(state)
    }

    /// Whether a change touching `changed` can alter this guard's outcome.
    #[must_use]
    pub const fn is_affected_by(&self, changed: FieldSet) -> bool {
        self.fields.intersects(changed)
    }

    /// The structured violation for `state`, or `Ok` if the guard holds.
    pub fn check(&self, state: &StateModel) -> Result<(), GuardViolationError> {
        if self.holds(state) {
            return Ok(());
        }
        let violation = GuardViolationError {
            operation_id: self.id,
            message: self.message,
            relevant_state: state.slice(self.fields),
        };
        warn!(
            guard = %violation.operation_id,
            slice = %violation.relevant_state,
            "Guard precondition failed"
        );
        Err(violation)
    }
}

fn baseline_exists(state: &StateModel) -> bool {
    state.baseline_status() == BaselineStatus::Exists
}

fn timeline_is_draft(state: &StateModel) -> bool {
    state.timeline_status() == TimelineStatus::Draft
}

fn timeline_is_committed(state: &StateModel) -> bool {
    state.timeline_status() == TimelineStatus::Committed
}

fn assessment_submitted(state: &StateModel) -> bool {
    state.doctor_status() == DoctorStatus::Submitted
}

static BASELINE_REQUIRED: GuardSpec = GuardSpec {
    id: GuardId::BaselineRequired,
    message: "Please create a baseline first",
    fields: FieldSet::of(&[StateField::Baseline]),
    predicate: baseline_exists,
};

static DRAFT_REQUIRED: GuardSpec = GuardSpec {
    id: GuardId::DraftRequired,
    message: "Please generate a draft timeline first",
    fields: FieldSet::of(&[StateField::Timeline]),
    predicate: timeline_is_draft,
};

static COMMITTED_REQUIRED: GuardSpec = GuardSpec {
    id: GuardId::CommittedRequired,
    message: "Please commit your timeline first",
    fields: FieldSet::of(&[StateField::Timeline]),
    predicate: timeline_is_committed,
};

// Gates on the commit itself rather than the analytics flag; the commit step
// sets both together.
static ANALYTICS_REQUIRED: GuardSpec = GuardSpec {
    id: GuardId::AnalyticsRequired,
    message: "Analytics become available once your timeline is committed",
    fields: FieldSet::of(&[StateField::Timeline]),
    predicate: timeline_is_committed,
};

static ASSESSMENT_REQUIRED: GuardSpec = GuardSpec {
    id: GuardId::AssessmentRequired,
    message: "Please submit the wellbeing assessment first",
    fields: FieldSet::of(&[StateField::Doctor]),
    predicate: assessment_submitted,
};

/// Look up the registered precondition for `id`.
#[must_use]
pub fn guard_spec(id: GuardId) -> &'static GuardSpec {
    match id {
        GuardId::BaselineRequired => &BASELINE_REQUIRED,
        GuardId::DraftRequired => &DRAFT_REQUIRED,
        GuardId::CommittedRequired => &COMMITTED_REQUIRED,
        GuardId::AnalyticsRequired => &ANALYTICS_REQUIRED,
        GuardId::AssessmentRequired => &ASSESSMENT_REQUIRED,
    }
}

/// The precondition gating a screen. `None` means always reachable.
#[must_use]
pub const fn guard_for_screen(screen: ScreenId) -> Option<GuardId> {
    match screen {
        ScreenId::Upload | ScreenId::Assessment => None,
        ScreenId::TimelineGenerate => Some(GuardId::BaselineRequired),
        ScreenId::TimelineDraft => Some(GuardId::DraftRequired),
        ScreenId::TimelineCommitted | ScreenId::Progress | ScreenId::Dashboard => {
            Some(GuardId::CommittedRequired)
        }
        ScreenId::Analytics => Some(GuardId::AnalyticsRequired),
        ScreenId::AssessmentResults => Some(GuardId::AssessmentRequired),
    }
}

/// The precondition checked before dispatching an operation.
#[must_use]
pub const fn guard_for_operation(operation: Operation) -> Option<GuardId> {
    match operation {
        Operation::CreateBaseline | Operation::SubmitAssessment => None,
        Operation::GenerateTimeline => Some(GuardId::BaselineRequired),
        Operation::CommitTimeline => Some(GuardId::DraftRequired),
        Operation::StartProgressTracking => Some(GuardId::CommittedRequired),
        Operation::RequestAnalytics => Some(GuardId::AnalyticsRequired),
    }
}

/// Cached outcomes for a set of guards evaluated against one state.
///
/// [`GuardBatch::update`] only re-runs guards whose declared fields changed.
#[derive(Debug, Clone)]
pub struct GuardBatch {
    outcomes: Vec<(GuardId, bool)>,
    state: StateModel,
}

impl GuardBatch {
    pub fn new(ids: impl IntoIterator<Item = GuardId>, state: StateModel) -> Self {
        let mut outcomes: Vec<(GuardId, bool)> = Vec::new();
        for id in ids {
            if outcomes.iter().all(|(seen, _)| *seen != id) {
                outcomes.push((id, guard_spec(id).holds(&state)));
            }
        }
        Self { outcomes, state }
    }

    /// Re-evaluate against `state`. Returns how many guards were recomputed.
    pub fn update(&mut self, state: StateModel) -> usize {
        let changed = self.state.diff(&state);
        self.state = state;
        if changed.is_empty() {
            return 0;
        }

        let mut recomputed = 0;
        for (id, holds) in &mut self.outcomes {
            let spec = guard_spec(*id);
            if spec.is_affected_by(changed) {
                *holds = spec.holds(&state);
                recomputed += 1;
            }
        }
        recomputed
    }

    #[must_use]
    pub fn holds(&self, id: GuardId) -> Option<bool> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, holds)| *holds)
    }

    pub fn failing(&self) -> impl Iterator<Item = GuardId> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, holds)| !holds)
            .map(|(id, _)| *id)
    }
}
