//! Focus-group sessions: one uninterrupted block split across several tasks.
//!
//! The coordinator is a segment ledger. The caller measures focus time and
//! feeds it in with `record_focused`; switching members closes the pending
//! amount into a segment for the member that was active. After every commit,
//! the sum of segment durations equals the total focused time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::TaskTemplate;
use crate::error::ValidationError;

pub type TemplateId = String;

/// Time attributed to one member between two switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSegment {
    pub template_id: TemplateId,
    /// Seconds.
    pub duration: f64,
    pub closed_at: DateTime<Utc>,
}

/// Final allocation of an exploration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSummary {
    pub segments: Vec<FocusSegment>,
    /// Template id -> summed segment duration.
    pub allocations: BTreeMap<TemplateId, f64>,
    pub total_focused_seconds: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl ExplorationSummary {
    /// Pair each allocation with its template. Ids the lookup does not know
    /// are skipped.
    pub fn resolve<F>(&self, lookup: F) -> Vec<(TaskTemplate, f64)>
    where
        F: Fn(&str) -> Option<TaskTemplate>,
    {
        self.allocations
            .iter()
            .filter_map(|(id, secs)| lookup(id).map(|t| (t, *secs)))
            .collect()
    }
}

/// Ledger for a single exploration. Consumed by [`end_exploration`].
///
/// [`end_exploration`]: FocusGroupSessionCoordinator::end_exploration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusGroupSessionCoordinator {
    member_template_ids: Vec<TemplateId>,
    active_index: usize,
    pending: f64,
    segments: Vec<FocusSegment>,
    started_at: DateTime<Utc>,
}

impl FocusGroupSessionCoordinator {
    /// Start an exploration on the first member.
    ///
    /// # Errors
    /// Returns an error if `member_template_ids` is empty.
    pub fn new(
        member_template_ids: Vec<TemplateId>,
        start_time: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if member_template_ids.is_empty() {
            return Err(ValidationError::EmptyCollection(
                "focus group members".into(),
            ));
        }
        Ok(Self {
            member_template_ids,
            active_index: 0,
            pending: 0.0,
            segments: Vec::new(),
            started_at: start_time,
        })
    }

    pub fn members(&self) -> &[TemplateId] {
        &self.member_template_ids
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_template_id(&self) -> &str {
        &self.member_template_ids[self.active_index]
    }

    pub fn active_template<F>(&self, lookup: F) -> Option<TaskTemplate>
    where
        F: Fn(&str) -> Option<TaskTemplate>,
    {
        lookup(self.active_template_id())
    }

    pub fn pending_seconds(&self) -> f64 {
        self.pending
    }

    pub fn segments(&self) -> &[FocusSegment] {
        &self.segments
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Committed plus pending seconds.
    pub fn total_focused_seconds(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum::<f64>() + self.pending
    }

    /// Credit `seconds` to the active member. Negative or non-finite input
    /// is ignored.
    pub fn record_focused(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.pending += seconds;
        }
    }

    /// Move focus to member `index`, closing the pending time into a segment
    /// for the previous member. Out-of-range indices return `false` and
    /// change nothing.
    pub fn switch_to(&mut self, index: usize, at: DateTime<Utc>) -> bool {
        if index >= self.member_template_ids.len() {
            return false;
        }
        self.commit_pending(at);
        debug!(
            from = %self.active_template_id(),
            to = %self.member_template_ids[index],
            "focus group switch"
        );
        self.active_index = index;
        true
    }

    /// Close the last segment and produce the allocation.
    pub fn end_exploration(mut self, at: DateTime<Utc>) -> ExplorationSummary {
        self.commit_pending(at);
        let mut allocations = BTreeMap::new();
        for segment in &self.segments {
            *allocations
                .entry(segment.template_id.clone())
                .or_insert(0.0) += segment.duration;
        }
        let total_focused_seconds: f64 = self.segments.iter().map(|s| s.duration).sum();
        ExplorationSummary {
            segments: self.segments,
            allocations,
            total_focused_seconds,
            started_at: self.started_at,
            ended_at: at,
        }
    }

    fn commit_pending(&mut self, at: DateTime<Utc>) {
        if self.pending > 0.0 {
            self.segments.push(FocusSegment {
                template_id: self.member_template_ids[self.active_index].clone(),
                duration: self.pending,
                closed_at: at,
            });
        }
        self.pending = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BossStyle;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 14, 0, 0).unwrap()
    }

    fn members() -> Vec<TemplateId> {
        vec!["email".into(), "review".into(), "design".into()]
    }

    #[test]
    fn rejects_empty_group() {
        assert!(FocusGroupSessionCoordinator::new(Vec::new(), t0()).is_err());
    }

    #[test]
    fn switch_commits_previous_member() {
        let mut group = FocusGroupSessionCoordinator::new(members(), t0()).unwrap();
        group.record_focused(300.0);
        assert!(group.switch_to(2, t0() + Duration::seconds(300)));
        assert_eq!(group.active_template_id(), "design");
        assert_eq!(group.segments().len(), 1);
        assert_eq!(group.segments()[0].template_id, "email");
        assert_eq!(group.pending_seconds(), 0.0);
    }

    #[test]
    fn empty_pending_is_not_a_segment() {
        let mut group = FocusGroupSessionCoordinator::new(members(), t0()).unwrap();
        assert!(group.switch_to(1, t0()));
        assert!(group.switch_to(0, t0()));
        assert!(group.segments().is_empty());
    }

    #[test]
    fn out_of_range_switch_is_ignored() {
        let mut group = FocusGroupSessionCoordinator::new(members(), t0()).unwrap();
        group.record_focused(60.0);
        assert!(!group.switch_to(3, t0()));
        assert_eq!(group.active_index(), 0);
        assert_eq!(group.pending_seconds(), 60.0);
        assert!(group.segments().is_empty());
    }

    #[test]
    fn summary_allocates_by_template() {
        let mut group = FocusGroupSessionCoordinator::new(members(), t0()).unwrap();
        group.record_focused(100.0);
        group.switch_to(1, t0());
        group.record_focused(50.0);
        group.switch_to(0, t0());
        group.record_focused(25.0);

        let summary = group.end_exploration(t0() + Duration::seconds(175));
        assert_eq!(summary.segments.len(), 3);
        assert_eq!(summary.allocations["email"], 125.0);
        assert_eq!(summary.allocations["review"], 50.0);
        assert!(!summary.allocations.contains_key("design"));
        assert_eq!(summary.total_focused_seconds, 175.0);
    }

    #[test]
    fn negative_time_is_ignored() {
        let mut group = FocusGroupSessionCoordinator::new(members(), t0()).unwrap();
        group.record_focused(-5.0);
        group.record_focused(f64::INFINITY);
        assert_eq!(group.total_focused_seconds(), 0.0);
    }

    #[test]
    fn resolve_uses_lookup() {
        let mut group = FocusGroupSessionCoordinator::new(members(), t0()).unwrap();
        group.record_focused(90.0);
        let summary = group.end_exploration(t0());
        let lookup = |id: &str| {
            (id == "email").then(|| TaskTemplate {
                id: id.to_string(),
                name: "Email triage".into(),
                duration_secs: 900.0,
                style: BossStyle::Focus,
            })
        };
        let resolved = summary.resolve(lookup);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0.name, "Email triage");
        assert_eq!(resolved[0].1, 90.0);
    }
}
