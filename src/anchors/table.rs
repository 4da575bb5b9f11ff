//! Name to tracking-anchor table.
//!
//! Owned by the delivery thread. Adds are two-phase: [`AnchorTable::begin_add`]
//! creates the tracking anchor and, unless it is already attached, parks it
//! as a pending attachment with a deadline. The attachment completes through
//! [`AnchorTable::on_attached`] (tracking event) or [`AnchorTable::poll`]
//! (periodic `is_anchor_attached` check), and fails once the deadline passes.
//!
//! At any instant a name maps to at most one live tracking anchor, counting
//! both committed and pending entries.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::AnchorSection;
use crate::core::{AnchorId, Transform};
use crate::error::{Result, SthanaError};
use crate::session::TrackingSession;

use super::record::AnchorRecord;

/// How a pending add ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Committed to the table
    Attached { name: String, anchor: AnchorId },
    /// Deadline passed, tracking anchor removed
    TimedOut { name: String, anchor: AnchorId },
    /// Replaced by a newer add or a remove for the same name
    Superseded { name: String, anchor: AnchorId },
    /// Dropped by a session reset
    Cancelled { name: String, anchor: AnchorId },
}

impl AttachOutcome {
    /// Tracking anchor the outcome refers to
    pub fn anchor(&self) -> AnchorId {
        match self {
            AttachOutcome::Attached { anchor, .. }
            | AttachOutcome::TimedOut { anchor, .. }
            | AttachOutcome::Superseded { anchor, .. }
            | AttachOutcome::Cancelled { anchor, .. } => *anchor,
        }
    }

    /// Caller-facing result
    pub fn into_result(self, budget: Duration) -> Result<AnchorId> {
        match self {
            AttachOutcome::Attached { anchor, .. } => Ok(anchor),
            AttachOutcome::TimedOut { name, .. } => Err(SthanaError::AttachTimeout {
                name,
                waited_ms: budget.as_millis() as u64,
            }),
            AttachOutcome::Superseded { name, .. } => Err(SthanaError::Superseded(name)),
            AttachOutcome::Cancelled { name, .. } => Err(SthanaError::AttachCancelled(name)),
        }
    }
}

/// Result of [`AnchorTable::begin_add`]
#[derive(Debug)]
pub struct AddStarted {
    /// Tracking anchor created for this add
    pub anchor: AnchorId,
    /// Outcomes produced synchronously: the superseded earlier add (if any)
    /// and this add's own outcome when it attached immediately
    pub outcomes: Vec<AttachOutcome>,
}

#[derive(Debug)]
struct PendingAttach {
    transform: Transform,
    anchor: AnchorId,
    deadline: Instant,
    polls: u32,
}

/// Named anchors plus the single shared (cloud) anchor slot
pub struct AnchorTable {
    records: HashMap<String, AnchorRecord>,
    pending: HashMap<String, PendingAttach>,
    shared: Option<AnchorRecord>,
    budget: Duration,
}

impl AnchorTable {
    /// Create an empty table
    pub fn new(config: &AnchorSection) -> Self {
        Self {
            records: HashMap::new(),
            pending: HashMap::new(),
            shared: None,
            budget: config.attach_budget(),
        }
    }

    /// Total attach wait
    pub fn attach_budget(&self) -> Duration {
        self.budget
    }

    /// Start adding `name` at `transform`; a pending attach fails once
    /// `deadline` passes.
    ///
    /// Any earlier anchor under `name` (committed or pending) is removed from
    /// the session first.
    pub fn begin_add(
        &mut self,
        name: &str,
        transform: Transform,
        tracking: &dyn TrackingSession,
        deadline: Instant,
    ) -> AddStarted {
        let mut outcomes = Vec::new();
        if let Some(outcome) = self.remove(name, tracking) {
            outcomes.push(outcome);
        }

        let anchor = tracking.add_anchor(transform);
        if tracking.is_anchor_attached(anchor) {
            self.commit(name.to_string(), transform, anchor);
            outcomes.push(AttachOutcome::Attached {
                name: name.to_string(),
                anchor,
            });
        } else {
            log::debug!("[Anchors] '{}' waiting for {} to attach", name, anchor);
            self.pending.insert(
                name.to_string(),
                PendingAttach {
                    transform,
                    anchor,
                    deadline,
                    polls: 0,
                },
            );
        }

        AddStarted { anchor, outcomes }
    }

    /// Tracking subsystem reported `anchor` as attached.
    ///
    /// A report arriving at or after the add's deadline expires it instead.
    pub fn on_attached(
        &mut self,
        anchor: AnchorId,
        tracking: &dyn TrackingSession,
        now: Instant,
    ) -> Option<AttachOutcome> {
        let name = self
            .pending
            .iter()
            .find(|(_, p)| p.anchor == anchor)
            .map(|(name, _)| name.clone())?;
        let pending = self.pending.remove(&name)?;
        if now >= pending.deadline {
            return Some(self.expire(name, pending, tracking));
        }
        self.commit(name.clone(), pending.transform, anchor);
        Some(AttachOutcome::Attached { name, anchor })
    }

    /// Check every pending add; commit attached ones, expire late ones.
    pub fn poll(&mut self, tracking: &dyn TrackingSession, now: Instant) -> Vec<AttachOutcome> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let mut attached = Vec::new();
        let mut expired = Vec::new();
        for (name, pending) in self.pending.iter_mut() {
            pending.polls += 1;
            if now >= pending.deadline {
                expired.push(name.clone());
            } else if tracking.is_anchor_attached(pending.anchor) {
                attached.push(name.clone());
            }
        }

        let mut outcomes = Vec::with_capacity(attached.len() + expired.len());
        for name in attached {
            if let Some(pending) = self.pending.remove(&name) {
                self.commit(name.clone(), pending.transform, pending.anchor);
                outcomes.push(AttachOutcome::Attached {
                    name,
                    anchor: pending.anchor,
                });
            }
        }
        for name in expired {
            if let Some(pending) = self.pending.remove(&name) {
                outcomes.push(self.expire(name, pending, tracking));
            }
        }
        outcomes
    }

    fn expire(
        &self,
        name: String,
        pending: PendingAttach,
        tracking: &dyn TrackingSession,
    ) -> AttachOutcome {
        log::warn!(
            "[Anchors] '{}' not attached after {} polls ({}ms), removing {}",
            name,
            pending.polls,
            self.budget.as_millis(),
            pending.anchor
        );
        tracking.remove_anchor(pending.anchor);
        AttachOutcome::TimedOut {
            name,
            anchor: pending.anchor,
        }
    }

    /// True while any add is waiting for attachment
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    fn commit(&mut self, name: String, transform: Transform, anchor: AnchorId) {
        log::debug!("[Anchors] '{}' attached as {}", name, anchor);
        self.records
            .insert(name.clone(), AnchorRecord::new(name, transform, anchor));
    }

    /// Remove `name`: detach its child content, remove the tracking anchor,
    /// delete the entry. No-op if absent.
    ///
    /// Returns the outcome of a pending add this cancelled, if any.
    pub fn remove(&mut self, name: &str, tracking: &dyn TrackingSession) -> Option<AttachOutcome> {
        if let Some(record) = self.records.remove(name) {
            tracking.detach_children(record.anchor);
            tracking.remove_anchor(record.anchor);
            log::debug!("[Anchors] Removed '{}' ({})", name, record.anchor);
        }

        let pending = self.pending.remove(name)?;
        tracking.remove_anchor(pending.anchor);
        log::debug!(
            "[Anchors] Pending add of '{}' ({}) superseded",
            name,
            pending.anchor
        );
        Some(AttachOutcome::Superseded {
            name: name.to_string(),
            anchor: pending.anchor,
        })
    }

    /// Look up a committed anchor
    pub fn get(&self, name: &str) -> Option<&AnchorRecord> {
        self.records.get(name)
    }

    /// Tracking handle for a committed anchor
    pub fn anchor(&self, name: &str) -> Option<AnchorId> {
        self.records.get(name).map(|r| r.anchor)
    }

    /// Re-pose a committed anchor's node
    pub fn set_transform(
        &mut self,
        name: &str,
        transform: Transform,
        tracking: &dyn TrackingSession,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| SthanaError::UnknownAnchor(name.to_string()))?;
        record.transform = transform;
        tracking.set_node_transform(record.anchor, transform);
        Ok(())
    }

    /// Committed names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of committed named anchors
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no named anchor is committed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Put `record` in the shared slot, removing any previous shared anchor.
    pub fn install_shared(&mut self, record: AnchorRecord, tracking: &dyn TrackingSession) {
        if let Some(previous) = self.shared.replace(record) {
            tracking.detach_children(previous.anchor);
            tracking.remove_anchor(previous.anchor);
        }
    }

    /// Shared anchor, if any
    pub fn shared(&self) -> Option<&AnchorRecord> {
        self.shared.as_ref()
    }

    /// Mutable shared anchor
    pub fn shared_mut(&mut self) -> Option<&mut AnchorRecord> {
        self.shared.as_mut()
    }

    /// Remove the shared anchor from the session and clear the slot
    pub fn remove_shared(&mut self, tracking: &dyn TrackingSession) -> Option<AnchorRecord> {
        let record = self.shared.take()?;
        tracking.detach_children(record.anchor);
        tracking.remove_anchor(record.anchor);
        Some(record)
    }

    /// Remove every anchor (session reset).
    ///
    /// Pending adds are reported as cancelled.
    pub fn clear(&mut self, tracking: &dyn TrackingSession) -> Vec<AttachOutcome> {
        for (_, record) in self.records.drain() {
            tracking.detach_children(record.anchor);
            tracking.remove_anchor(record.anchor);
        }
        self.remove_shared(tracking);
        self.pending
            .drain()
            .map(|(name, pending)| {
                tracking.remove_anchor(pending.anchor);
                AttachOutcome::Cancelled {
                    name,
                    anchor: pending.anchor,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec3;
    use crate::mock::{AttachBehavior, MockTracking};
    use crate::session::EventSink;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tracking(behavior: AttachBehavior) -> MockTracking {
        MockTracking::new(EventSink::detached()).with_attach_behavior(behavior)
    }

    fn at(x: f32) -> Transform {
        Transform::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_millis(200)
    }

    #[test]
    fn test_add_attached_immediately() {
        let tracking = tracking(AttachBehavior::Immediate);
        let mut table = AnchorTable::new(&AnchorSection::default());

        let started = table.begin_add("mug", at(1.0), &tracking, soon());
        assert_eq!(
            started.outcomes,
            vec![AttachOutcome::Attached {
                name: "mug".to_string(),
                anchor: started.anchor
            }]
        );
        assert_eq!(table.anchor("mug"), Some(started.anchor));
        assert!(!table.has_pending());
    }

    #[test]
    fn test_double_add_keeps_one_anchor() {
        let tracking = tracking(AttachBehavior::Immediate);
        let mut table = AnchorTable::new(&AnchorSection::default());

        let first = table.begin_add("mug", at(1.0), &tracking, soon());
        let second = table.begin_add("mug", at(2.0), &tracking, soon());

        assert_eq!(table.len(), 1);
        let record = table.get("mug").unwrap();
        assert_eq!(record.anchor, second.anchor);
        assert_eq!(record.transform, at(2.0));
        assert!(!tracking.is_live(first.anchor));
        assert!(tracking.detached_children().contains(&first.anchor));
        assert_eq!(tracking.live_anchor_count(), 1);
    }

    #[test]
    fn test_pending_attach_via_event() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());

        let started = table.begin_add("lamp", at(0.5), &tracking, soon());
        assert!(started.outcomes.is_empty());
        assert!(table.has_pending());
        assert!(table.get("lamp").is_none());

        let outcome = table.on_attached(started.anchor, &tracking, Instant::now()).unwrap();
        assert_eq!(outcome.anchor(), started.anchor);
        assert_eq!(table.anchor("lamp"), Some(started.anchor));
        assert!(table.on_attached(started.anchor, &tracking, Instant::now()).is_none());
    }

    #[test]
    fn test_pending_attach_via_poll() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let now = Instant::now();
        let deadline = now + table.attach_budget();

        let started = table.begin_add("lamp", at(0.5), &tracking, deadline);
        assert!(table.poll(&tracking, now).is_empty());

        tracking.mark_attached(started.anchor);
        let outcomes = table.poll(&tracking, now + Duration::from_millis(10));
        assert!(matches!(outcomes[0], AttachOutcome::Attached { .. }));
        assert!(!table.has_pending());
    }

    #[test]
    fn test_attach_timeout_leaves_nothing() {
        let tracking = tracking(AttachBehavior::Never);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let now = Instant::now();
        let deadline = now + table.attach_budget();

        let started = table.begin_add("ghost", at(0.0), &tracking, deadline);
        assert!(table.poll(&tracking, now + Duration::from_millis(100)).is_empty());

        let outcomes = table.poll(&tracking, now + Duration::from_millis(200));
        assert_eq!(outcomes.len(), 1);
        let err = outcomes[0].clone().into_result(table.attach_budget()).unwrap_err();
        assert_eq!(
            err,
            SthanaError::AttachTimeout {
                name: "ghost".to_string(),
                waited_ms: 200
            }
        );
        assert!(table.get("ghost").is_none());
        assert!(!tracking.is_live(started.anchor));
    }

    #[test]
    fn test_second_add_supersedes_pending() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());

        let first = table.begin_add("cup", at(1.0), &tracking, soon());
        let second = table.begin_add("cup", at(2.0), &tracking, soon());

        assert_eq!(
            second.outcomes,
            vec![AttachOutcome::Superseded {
                name: "cup".to_string(),
                anchor: first.anchor
            }]
        );
        assert!(!tracking.is_live(first.anchor));
        assert!(table.on_attached(first.anchor, &tracking, Instant::now()).is_none());
        assert!(table.on_attached(second.anchor, &tracking, Instant::now()).is_some());
        assert_eq!(table.get("cup").unwrap().transform, at(2.0));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let tracking = tracking(AttachBehavior::Immediate);
        let mut table = AnchorTable::new(&AnchorSection::default());
        assert!(table.remove("nothing", &tracking).is_none());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_set_transform() {
        let tracking = tracking(AttachBehavior::Immediate);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let started = table.begin_add("box", at(1.0), &tracking, soon());

        table.set_transform("box", at(3.0), &tracking).unwrap();
        assert_eq!(table.get("box").unwrap().transform, at(3.0));
        assert_eq!(tracking.node_transform(started.anchor), Some(at(3.0)));

        let err = table.set_transform("nope", at(0.0), &tracking).unwrap_err();
        assert_eq!(err, SthanaError::UnknownAnchor("nope".to_string()));
    }

    #[test]
    fn test_shared_slot_is_separate() {
        let tracking = tracking(AttachBehavior::Immediate);
        let mut table = AnchorTable::new(&AnchorSection::default());
        table.begin_add("shared", at(1.0), &tracking, soon());

        let anchor = tracking.add_anchor(at(5.0));
        table.install_shared(AnchorRecord::new("shared", at(5.0), anchor), &tracking);
        assert_eq!(table.len(), 1);
        assert_eq!(table.shared().unwrap().anchor, anchor);

        let replacement = tracking.add_anchor(at(6.0));
        table.install_shared(AnchorRecord::new("shared", at(6.0), replacement), &tracking);
        assert!(!tracking.is_live(anchor));

        table.remove_shared(&tracking);
        assert!(table.shared().is_none());
        assert!(!tracking.is_live(replacement));
        assert!(table.get("shared").is_some());
    }

    #[test]
    fn test_clear_cancels_pending() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let started = table.begin_add("a", at(1.0), &tracking, soon());
        tracking.mark_attached(started.anchor);
        table.on_attached(started.anchor, &tracking, Instant::now());
        table.begin_add("b", at(2.0), &tracking, soon());

        let outcomes = table.clear(&tracking);
        assert!(matches!(&outcomes[..], [AttachOutcome::Cancelled { name, .. }] if name == "b"));
        assert!(table.is_empty());
        assert!(!table.has_pending());
        assert_eq!(tracking.live_anchor_count(), 0);
    }

    #[test]
    fn test_names_sorted() {
        let tracking = tracking(AttachBehavior::Immediate);
        let mut table = AnchorTable::new(&AnchorSection::default());
        for name in ["c", "a", "b"] {
            table.begin_add(name, at(0.0), &tracking, soon());
        }
        assert_eq!(table.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_attach_event_after_deadline_expires() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let now = Instant::now();
        let deadline = now + table.attach_budget();

        let started = table.begin_add("late", at(0.0), &tracking, deadline);
        tracking.mark_attached(started.anchor);
        let outcome = table.on_attached(started.anchor, &tracking, deadline);

        assert!(matches!(outcome, Some(AttachOutcome::TimedOut { .. })));
        assert!(table.get("late").is_none());
        assert!(!tracking.is_live(started.anchor));
    }

    #[test]
    fn test_poll_after_deadline_expires_attached_anchor() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let now = Instant::now();
        let deadline = now + table.attach_budget();

        let started = table.begin_add("late", at(0.0), &tracking, deadline);
        tracking.mark_attached(started.anchor);
        let outcomes = table.poll(&tracking, deadline + Duration::from_millis(50));

        assert!(matches!(&outcomes[..], [AttachOutcome::TimedOut { .. }]));
        assert!(table.is_empty());
        assert_eq!(tracking.live_anchor_count(), 0);
    }

    #[test]
    fn test_next_deadline_is_earliest_pending() {
        let tracking = tracking(AttachBehavior::Manual);
        let mut table = AnchorTable::new(&AnchorSection::default());
        let now = Instant::now();
        assert_eq!(table.next_deadline(), None);

        table.begin_add("a", at(0.0), &tracking, now + Duration::from_millis(300));
        table.begin_add("b", at(0.0), &tracking, now + Duration::from_millis(100));
        assert_eq!(table.next_deadline(), Some(now + Duration::from_millis(100)));
    }

    /// Live tracking anchors match the table and no name holds two handles
    fn assert_one_handle_per_name(table: &AnchorTable, tracking: &MockTracking, seed: u64) {
        assert_eq!(
            tracking.live_anchor_count(),
            table.len() + table.pending.len(),
            "seed {}",
            seed
        );
        for (name, record) in &table.records {
            assert!(!table.pending.contains_key(name), "seed {}: '{}'", seed, name);
            assert!(tracking.is_live(record.anchor), "seed {}: '{}'", seed, name);
        }
        for (name, pending) in &table.pending {
            assert!(tracking.is_live(pending.anchor), "seed {}: '{}'", seed, name);
        }
    }

    #[test]
    fn test_one_handle_per_name_for_any_sequence() {
        const NAMES: [&str; 4] = ["cup", "lamp", "mug", "vase"];

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tracking = tracking(AttachBehavior::Manual);
            let mut table = AnchorTable::new(&AnchorSection::default());
            let mut clock = Instant::now();

            for _ in 0..200 {
                clock += Duration::from_millis(10);
                let name = NAMES[rng.random_range(0..NAMES.len())];
                match rng.random_range(0..5) {
                    0 | 1 => {
                        let deadline = clock + table.attach_budget();
                        let pose = at(rng.random_range(-1.0..1.0));
                        table.begin_add(name, pose, &tracking, deadline);
                    }
                    2 => {
                        table.remove(name, &tracking);
                    }
                    3 => {
                        let mut waiting: Vec<AnchorId> =
                            table.pending.values().map(|p| p.anchor).collect();
                        waiting.sort();
                        if !waiting.is_empty() {
                            let anchor = waiting[rng.random_range(0..waiting.len())];
                            tracking.mark_attached(anchor);
                            if rng.random_bool(0.5) {
                                table.on_attached(anchor, &tracking, clock);
                            }
                        }
                    }
                    _ => {
                        table.poll(&tracking, clock);
                    }
                }
                assert_one_handle_per_name(&table, &tracking, seed);
            }
        }
    }
}
