//! Workflow status flags and the State Model built from them.
//!
//! Pure domain types with no IO and no async. Every transition is a pure
//! function from one snapshot to the next: a rejected transition returns an
//! error and the caller's snapshot is left exactly as it was.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Status axes ──────────────────────────────────────────────

/// Whether a program baseline has been recorded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaselineStatus {
    #[default]
    None,
    Exists,
}

impl BaselineStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Exists => "EXISTS",
        }
    }
}

/// Progression of the generated plan. Ordered `None < Draft < Committed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineStatus {
    #[default]
    None,
    Draft,
    Committed,
}

impl TimelineStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Draft => "DRAFT",
            Self::Committed => "COMMITTED",
        }
    }
}

/// Whether the wellbeing questionnaire has been finalized.
///
/// Independent of the baseline/timeline axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoctorStatus {
    #[default]
    NotSubmitted,
    Submitted,
}

impl DoctorStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotSubmitted => "NOT_SUBMITTED",
            Self::Submitted => "SUBMITTED",
        }
    }
}

/// Whether aggregate analytics may be computed.
///
/// Derived from the timeline axis but stored explicitly. Only the commit step
/// makes it `Available`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsStatus {
    #[default]
    Unavailable,
    Available,
}

impl AnalyticsStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "UNAVAILABLE",
            Self::Available => "AVAILABLE",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

display_as_str!(BaselineStatus, TimelineStatus, DoctorStatus, AnalyticsStatus);

// ── Fields ───────────────────────────────────────────────────

/// One field of the [`StateModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Baseline,
    Timeline,
    Doctor,
    Analytics,
}

impl StateField {
    pub const ALL: [StateField; 4] = [
        StateField::Baseline,
        StateField::Timeline,
        StateField::Doctor,
        StateField::Analytics,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Timeline => "timeline",
            Self::Doctor => "doctor",
            Self::Analytics => "analytics",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Baseline => 1 << 0,
            Self::Timeline => 1 << 1,
            Self::Doctor => 1 << 2,
            Self::Analytics => 1 << 3,
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`StateField`]s, used to declare which fields a guard reads and
/// which fields a transition changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldSet(u8);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);
    pub const ALL: FieldSet = FieldSet::of(&StateField::ALL);

    #[must_use]
    pub const fn of(fields: &[StateField]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < fields.len() {
            bits |= fields[i].bit();
            i += 1;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn with(self, field: StateField) -> Self {
        Self(self.0 | field.bit())
    }

    #[must_use]
    pub const fn contains(self, field: StateField) -> bool {
        self.0 & field.bit() != 0
    }

    #[must_use]
    pub const fn intersects(self, other: FieldSet) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = StateField> {
        StateField::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }
}

impl FromIterator<StateField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = StateField>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, FieldSet::with)
    }
}

// ── Transition errors ────────────────────────────────────────

/// A transition that would break a State Model invariant.
///
/// Always a programming error on the caller's side: setters are only invoked
/// after the backend confirmed the corresponding event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransitionError {
    #[error("{field} status cannot move backward from {from} to {to}")]
    Regression {
        field: StateField,
        from: &'static str,
        to: &'static str,
    },
    #[error("timeline cannot become {to} before a baseline exists")]
    TimelineWithoutBaseline { to: TimelineStatus },
    #[error("timeline cannot be committed before a draft exists")]
    CommitWithoutDraft,
    #[error("timeline can only be committed through the commit step")]
    CommitOutsideCommitStep,
    #[error("analytics can only become available by committing the timeline")]
    AnalyticsWithoutCommit,
}

fn forward<T>(
    field: StateField,
    from: T,
    to: T,
    name: fn(T) -> &'static str,
) -> Result<T, InvalidTransitionError>
where
    T: Ord + Copy,
{
    if to < from {
        return Err(InvalidTransitionError::Regression {
            field,
            from: name(from),
            to: name(to),
        });
    }
    Ok(to)
}

// ── State Model ──────────────────────────────────────────────

/// Backend-confirmed workflow position.
///
/// Fields are private: the only ways to obtain a value are [`StateModel::initial`],
/// the validated transitions below, and [`StateModel::from_snapshot`]. Every
/// reachable value satisfies:
///
/// - a draft or committed timeline implies an existing baseline
/// - available analytics implies a committed timeline, and vice versa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateModel {
    baseline_status: BaselineStatus,
    timeline_status: TimelineStatus,
    doctor_status: DoctorStatus,
    analytics_status: AnalyticsStatus,
}

impl StateModel {
    /// The "nothing done yet" state every session starts from.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            baseline_status: BaselineStatus::None,
            timeline_status: TimelineStatus::None,
            doctor_status: DoctorStatus::NotSubmitted,
            analytics_status: AnalyticsStatus::Unavailable,
        }
    }

    #[must_use]
    pub const fn baseline_status(&self) -> BaselineStatus {
        self.baseline_status
    }

    #[must_use]
    pub const fn timeline_status(&self) -> TimelineStatus {
        self.timeline_status
    }

    #[must_use]
    pub const fn doctor_status(&self) -> DoctorStatus {
        self.doctor_status
    }

    #[must_use]
    pub const fn analytics_status(&self) -> AnalyticsStatus {
        self.analytics_status
    }

    pub fn with_baseline(self, status: BaselineStatus) -> Result<Self, InvalidTransitionError> {
        let baseline_status = forward(
            StateField::Baseline,
            self.baseline_status,
            status,
            BaselineStatus::as_str,
        )?;
        Ok(Self {
            baseline_status,
            ..self
        })
    }

    /// Move the timeline to `None` or `Draft`.
    ///
    /// `Committed` is only reachable through [`StateModel::committed`], which
    /// also flips analytics; re-asserting an existing commit is a no-op.
    pub fn with_timeline(self, status: TimelineStatus) -> Result<Self, InvalidTransitionError> {
        if status == TimelineStatus::Committed && self.timeline_status != TimelineStatus::Committed
        {
            return Err(InvalidTransitionError::CommitOutsideCommitStep);
        }
        let timeline_status = forward(
            StateField::Timeline,
            self.timeline_status,
            status,
            TimelineStatus::as_str,
        )?;
        if timeline_status != TimelineStatus::None && self.baseline_status == BaselineStatus::None {
            return Err(InvalidTransitionError::TimelineWithoutBaseline { to: status });
        }
        Ok(Self {
            timeline_status,
            ..self
        })
    }

    /// Commit the timeline and make analytics available in one step.
    pub fn committed(self) -> Result<Self, InvalidTransitionError> {
        match self.timeline_status {
            TimelineStatus::None => Err(InvalidTransitionError::CommitWithoutDraft),
            TimelineStatus::Draft | TimelineStatus::Committed => Ok(Self {
                timeline_status: TimelineStatus::Committed,
                analytics_status: AnalyticsStatus::Available,
                ..self
            }),
        }
    }

    pub fn with_doctor(self, status: DoctorStatus) -> Result<Self, InvalidTransitionError> {
        let doctor_status = forward(
            StateField::Doctor,
            self.doctor_status,
            status,
            DoctorStatus::as_str,
        )?;
        Ok(Self {
            doctor_status,
            ..self
        })
    }

    /// Set analytics directly. Only a value the commit step already produced
    /// is accepted, so the derived flag can never be inverted from outside.
    pub fn with_analytics(self, status: AnalyticsStatus) -> Result<Self, InvalidTransitionError> {
        if status == AnalyticsStatus::Available
            && self.timeline_status != TimelineStatus::Committed
        {
            return Err(InvalidTransitionError::AnalyticsWithoutCommit);
        }
        let analytics_status = forward(
            StateField::Analytics,
            self.analytics_status,
            status,
            AnalyticsStatus::as_str,
        )?;
        Ok(Self {
            analytics_status,
            ..self
        })
    }

    /// Build a model from a backend snapshot, checking consistency.
    ///
    /// A committed timeline reported with unavailable analytics is normalized
    /// to available, since the flag is derived from the commit.
    pub fn from_snapshot(snapshot: StatusSnapshot) -> Result<Self, InvalidTransitionError> {
        if snapshot.timeline_status != TimelineStatus::None
            && snapshot.baseline_status == BaselineStatus::None
        {
            return Err(InvalidTransitionError::TimelineWithoutBaseline {
                to: snapshot.timeline_status,
            });
        }
        let analytics_status = match (snapshot.timeline_status, snapshot.analytics_status) {
            (TimelineStatus::Committed, _) => AnalyticsStatus::Available,
            (_, AnalyticsStatus::Available) => {
                return Err(InvalidTransitionError::AnalyticsWithoutCommit);
            }
            (_, AnalyticsStatus::Unavailable) => AnalyticsStatus::Unavailable,
        };
        Ok(Self {
            baseline_status: snapshot.baseline_status,
            timeline_status: snapshot.timeline_status,
            doctor_status: snapshot.doctor_status,
            analytics_status,
        })
    }

    /// Replace this model with `target`, refusing any backward movement.
    pub fn advance_to(self, target: StateModel) -> Result<Self, InvalidTransitionError> {
        forward(
            StateField::Baseline,
            self.baseline_status,
            target.baseline_status,
            BaselineStatus::as_str,
        )?;
        forward(
            StateField::Timeline,
            self.timeline_status,
            target.timeline_status,
            TimelineStatus::as_str,
        )?;
        forward(
            StateField::Doctor,
            self.doctor_status,
            target.doctor_status,
            DoctorStatus::as_str,
        )?;
        forward(
            StateField::Analytics,
            self.analytics_status,
            target.analytics_status,
            AnalyticsStatus::as_str,
        )?;
        Ok(target)
    }

    /// Fields whose values differ between `self` and `other`.
    #[must_use]
    pub fn diff(&self, other: &StateModel) -> FieldSet {
        let mut changed = FieldSet::EMPTY;
        if self.baseline_status != other.baseline_status {
            changed = changed.with(StateField::Baseline);
        }
        if self.timeline_status != other.timeline_status {
            changed = changed.with(StateField::Timeline);
        }
        if self.doctor_status != other.doctor_status {
            changed = changed.with(StateField::Doctor);
        }
        if self.analytics_status != other.analytics_status {
            changed = changed.with(StateField::Analytics);
        }
        changed
    }

    /// Project this model onto `fields`.
    #[must_use]
    pub fn slice(&self, fields: FieldSet) -> StateSlice {
        StateSlice {
            baseline_status: fields
                .contains(StateField::Baseline)
                .then_some(self.baseline_status),
            timeline_status: fields
                .contains(StateField::Timeline)
                .then_some(self.timeline_status),
            doctor_status: fields
                .contains(StateField::Doctor)
                .then_some(self.doctor_status),
            analytics_status: fields
                .contains(StateField::Analytics)
                .then_some(self.analytics_status),
        }
    }
}

impl fmt::Display for StateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.slice(FieldSet::ALL).fmt(f)
    }
}

// ── Slices & snapshots ───────────────────────────────────────

/// The part of a [`StateModel`] a guard declared interest in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSlice {
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline_status: Option<BaselineStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline_status: Option<TimelineStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doctor_status: Option<DoctorStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analytics_status: Option<AnalyticsStatus>,
}

impl StateSlice {
    #[must_use]
    pub const fn baseline_status(&self) -> Option<BaselineStatus> {
        self.baseline_status
    }

    #[must_use]
    pub const fn timeline_status(&self) -> Option<TimelineStatus> {
        self.timeline_status
    }

    #[must_use]
    pub const fn doctor_status(&self) -> Option<DoctorStatus> {
        self.doctor_status
    }

    #[must_use]
    pub const fn analytics_status(&self) -> Option<AnalyticsStatus> {
        self.analytics_status
    }

    #[must_use]
    pub fn fields(&self) -> FieldSet {
        let mut fields = FieldSet::EMPTY;
        if self.baseline_status.is_some() {
            fields = fields.with(StateField::Baseline);
        }
        if self.timeline_status.is_some() {
            fields = fields.with(StateField::Timeline);
        }
        if self.doctor_status.is_some() {
            fields = fields.with(StateField::Doctor);
        }
        if self.analytics_status.is_some() {
            fields = fields.with(StateField::Analytics);
        }
        fields
    }
}

impl fmt::Display for StateSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            self.baseline_status
                .map(|s| format!("{}={s}", StateField::Baseline)),
            self.timeline_status
                .map(|s| format!("{}={s}", StateField::Timeline)),
            self.doctor_status
                .map(|s| format!("{}={s}", StateField::Doctor)),
            self.analytics_status
                .map(|s| format!("{}={s}", StateField::Analytics)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Raw status flags as reported by the backend, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default)]
    pub baseline_status: BaselineStatus,
    #[serde(default)]
    pub timeline_status: TimelineStatus,
    #[serde(default)]
    pub doctor_status: DoctorStatus,
    #[serde(default)]
    pub analytics_status: AnalyticsStatus,
}
