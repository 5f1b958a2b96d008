//! Route Resolver - navigable paths to screens, and the fallback route.
//!
//! Matching is an exact lookup followed by a linear first-prefix scan.
//! [`RouteTable::new`] rejects any table where an earlier path is a prefix of
//! a later one, so declaration order can never shadow a more specific entry.

use std::collections::HashMap;

use thiserror::Error;

use waypoint_types::{BaselineStatus, GuardViolationError, ScreenId, StateModel, TimelineStatus};

use crate::guards::{guard_for_screen, guard_spec};

/// One path-to-screen mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub screen: ScreenId,
}

impl RouteEntry {
    #[must_use]
    pub const fn new(path: &'static str, screen: ScreenId) -> Self {
        Self { path, screen }
    }
}

/// The standard route table. Specific prefixes precede general ones.
pub const STANDARD_ROUTES: [RouteEntry; 9] = [
    RouteEntry::new("/upload", ScreenId::Upload),
    RouteEntry::new("/timeline/generate", ScreenId::TimelineGenerate),
    RouteEntry::new("/timeline/draft", ScreenId::TimelineDraft),
    RouteEntry::new("/timeline/committed", ScreenId::TimelineCommitted),
    RouteEntry::new("/progress", ScreenId::Progress),
    RouteEntry::new("/dashboard", ScreenId::Dashboard),
    RouteEntry::new("/analytics", ScreenId::Analytics),
    RouteEntry::new("/assessment/results", ScreenId::AssessmentResults),
    RouteEntry::new("/assessment", ScreenId::Assessment),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route entry {index} has an empty path")]
    EmptyPath { index: usize },
    #[error("route {later} is shadowed by earlier route {earlier}")]
    Shadowed {
        earlier: &'static str,
        later: &'static str,
    },
    #[error("screen {screen} has no route")]
    Unrouted { screen: ScreenId },
}

/// A validated, ordered route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    canonical: HashMap<ScreenId, &'static str>,
}

impl RouteTable {
    /// Validate and build a table.
    ///
    /// Every screen needs at least one route; its first route is canonical.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, RouteTableError> {
        for (index, entry) in entries.iter().enumerate() {
            if entry.path.is_empty() {
                return Err(RouteTableError::EmptyPath { index });
            }
            if let Some(earlier) = entries[..index]
                .iter()
                .find(|earlier| entry.path.starts_with(earlier.path))
            {
                return Err(RouteTableError::Shadowed {
                    earlier: earlier.path,
                    later: entry.path,
                });
            }
        }

        let mut canonical = HashMap::new();
        for entry in &entries {
            canonical.entry(entry.screen).or_insert(entry.path);
        }
        if let Some(screen) = ScreenId::ALL
            .into_iter()
            .find(|screen| !canonical.contains_key(screen))
        {
            return Err(RouteTableError::Unrouted { screen });
        }

        Ok(Self { entries, canonical })
    }

    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_ROUTES.to_vec()).expect("standard route table is valid")
    }

    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Canonical path of `screen`.
    #[must_use]
    pub fn path_for(&self, screen: ScreenId) -> &'static str {
        // Construction guarantees every screen is present.
        self.canonical[&screen]
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteResolver {
    table: RouteTable,
}

impl RouteResolver {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The guarded screen at `path`, or `None` for paths the engine does not gate.
    #[must_use]
    pub fn screen_for(&self, path: &str) -> Option<ScreenId> {
        let entries = self.table.entries();
        entries
            .iter()
            .find(|entry| entry.path == path)
            .or_else(|| entries.iter().find(|entry| path.starts_with(entry.path)))
            .map(|entry| entry.screen)
    }

    /// The one "next correct step" for `state`, by pipeline position only.
    #[must_use]
    pub fn fallback_screen_for(state: &StateModel) -> ScreenId {
        if state.baseline_status() == BaselineStatus::None {
            return ScreenId::Upload;
        }
        match state.timeline_status() {
            TimelineStatus::None => ScreenId::TimelineGenerate,
            TimelineStatus::Draft => ScreenId::TimelineDraft,
            TimelineStatus::Committed => ScreenId::Progress,
        }
    }

    #[must_use]
    pub fn fallback_route_for(&self, state: &StateModel) -> &'static str {
        self.table.path_for(Self::fallback_screen_for(state))
    }

    #[must_use]
    pub fn screen_valid_for(screen: ScreenId, state: &StateModel) -> bool {
        guard_for_screen(screen).is_none_or(|id| guard_spec(id).holds(state))
    }

    /// The violation that makes `screen` unreachable in `state`, if any.
    #[must_use]
    pub fn violation_for(screen: ScreenId, state: &StateModel) -> Option<GuardViolationError> {
        let id = guard_for_screen(screen)?;
        guard_spec(id).check(state).err()
    }
}
