//! Pending-operation queue with deterministic flush order.
//!
//! [`OperationScheduler`] buffers operations between submission and
//! delivery. It enforces capacity, assigns monotonic sequence ids, and
//! resolves due operations into one total order at flush time.
//!
//! # Ordering
//!
//! Flushed operations are sorted by `(scheduled_time, priority, sequence_id)`
//! where priority is fixed by kind (Seed < Washout < Feed < Treat). For
//! operations sharing a due time the order depends only on priority and
//! sequence, never on how submissions interleaved with unrelated ones.
//!
//! Submission never touches vessel state: the scheduler has no access to it.

use indexmap::IndexMap;
use vitro_core::{
    CausalityError, OperationHandle, OperationRequest, PendingOperation, SequenceId, SubmitError,
};

/// Bounded queue of operations awaiting delivery.
#[derive(Clone, Debug)]
pub struct OperationScheduler {
    pending: IndexMap<SequenceId, PendingOperation>,
    capacity: usize,
    next_sequence: u64,
}

impl OperationScheduler {
    /// Create a scheduler holding at most `capacity` pending operations.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`SessionConfig::validate`](crate::SessionConfig::validate)
    /// rejects that before a scheduler is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "OperationScheduler capacity must be at least 1");
        Self {
            pending: IndexMap::new(),
            capacity,
            next_sequence: 0,
        }
    }

    /// Enqueue `request`. No vessel state is read or written.
    ///
    /// # Errors
    ///
    /// - [`CausalityError::NonFiniteTime`] for a NaN or infinite time.
    /// - [`CausalityError::ScheduledInPast`] when `scheduled_time < now`.
    /// - [`SubmitError::InvalidPayload`] for a meaningless payload.
    /// - [`SubmitError::QueueFull`] at capacity.
    ///
    /// Rejected requests consume no sequence id.
    pub fn submit(
        &mut self,
        request: OperationRequest,
        now: f64,
    ) -> Result<OperationHandle, SubmitError> {
        let t = request.scheduled_time;
        if !t.is_finite() {
            return Err(CausalityError::NonFiniteTime { time: t }.into());
        }
        if t < now {
            return Err(CausalityError::ScheduledInPast {
                scheduled_time: t,
                now,
            }
            .into());
        }
        request
            .payload
            .validate()
            .map_err(|reason| SubmitError::InvalidPayload { reason })?;
        if self.pending.len() >= self.capacity {
            return Err(SubmitError::QueueFull {
                capacity: self.capacity,
            });
        }

        let seq = SequenceId(self.next_sequence);
        self.next_sequence += 1;
        self.pending.insert(seq, PendingOperation::new(request, seq));
        Ok(OperationHandle(seq))
    }

    /// Withdraw a pending operation before it is flushed.
    ///
    /// # Errors
    ///
    /// [`SubmitError::UnknownHandle`] if the handle is not pending
    /// (never issued, already withdrawn, or already delivered).
    pub fn withdraw(&mut self, handle: OperationHandle) -> Result<PendingOperation, SubmitError> {
        self.pending
            .shift_remove(&handle.0)
            .ok_or(SubmitError::UnknownHandle(handle))
    }

    /// Remove and return every operation with `scheduled_time <= upto`,
    /// in delivery order.
    pub fn flush(&mut self, upto: f64) -> Vec<PendingOperation> {
        let (due, kept): (IndexMap<_, _>, IndexMap<_, _>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, op)| op.scheduled_time() <= upto);
        self.pending = kept;
        let mut due: Vec<PendingOperation> = due.into_iter().map(|(_, op)| op).collect();
        due.sort_by(PendingOperation::delivery_cmp);
        due
    }

    /// Earliest scheduled time strictly after `t`.
    pub fn next_due_after(&self, t: f64) -> Option<f64> {
        self.pending
            .values()
            .map(PendingOperation::scheduled_time)
            .filter(|&s| s > t)
            .min_by(f64::total_cmp)
    }

    /// Look up a pending operation.
    pub fn get(&self, handle: OperationHandle) -> Option<&PendingOperation> {
        self.pending.get(&handle.0)
    }

    /// Pending operations in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.pending.values()
    }

    /// Number of pending operations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Maximum number of pending operations.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitro_core::{CellLineId, CompoundId, OperationKind, OperationPayload, VesselId};

    fn seed(vessel: u32, t: f64) -> OperationRequest {
        OperationRequest {
            target_vessel: VesselId(vessel),
            scheduled_time: t,
            payload: OperationPayload::Seed {
                cell_line: CellLineId::from("HepG2"),
                cell_count: 1.0e5,
                viability: 0.95,
            },
        }
    }

    fn treat(vessel: u32, t: f64) -> OperationRequest {
        OperationRequest {
            target_vessel: VesselId(vessel),
            scheduled_time: t,
            payload: OperationPayload::Treat {
                compound: CompoundId::from("tunicamycin"),
                dose_um: 1.0,
            },
        }
    }

    fn feed(vessel: u32, t: f64) -> OperationRequest {
        OperationRequest {
            target_vessel: VesselId(vessel),
            scheduled_time: t,
            payload: OperationPayload::Feed {
                glucose_mm: 25.0,
                glutamine_mm: 4.0,
            },
        }
    }

    fn washout(vessel: u32, t: f64) -> OperationRequest {
        OperationRequest {
            target_vessel: VesselId(vessel),
            scheduled_time: t,
            payload: OperationPayload::Washout { compound: None },
        }
    }

    #[test]
    fn submit_assigns_monotonic_sequence() {
        let mut s = OperationScheduler::new(8);
        let a = s.submit(seed(0, 0.0), 0.0).unwrap();
        let b = s.submit(feed(0, 1.0), 0.0).unwrap();
        assert_eq!(a, OperationHandle(SequenceId(0)));
        assert_eq!(b, OperationHandle(SequenceId(1)));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn past_scheduling_rejected() {
        let mut s = OperationScheduler::new(8);
        let err = s.submit(treat(0, 4.0), 5.0).unwrap_err();
        assert_eq!(
            err,
            SubmitError::Causality(CausalityError::ScheduledInPast {
                scheduled_time: 4.0,
                now: 5.0
            })
        );
        assert!(s.is_empty());
    }

    #[test]
    fn scheduling_at_now_accepted() {
        let mut s = OperationScheduler::new(8);
        assert!(s.submit(treat(0, 5.0), 5.0).is_ok());
    }

    #[test]
    fn non_finite_time_rejected() {
        let mut s = OperationScheduler::new(8);
        let err = s.submit(treat(0, f64::NAN), 0.0).unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Causality(CausalityError::NonFiniteTime { .. })
        ));
    }

    #[test]
    fn rejected_submit_consumes_no_sequence() {
        let mut s = OperationScheduler::new(8);
        let _ = s.submit(treat(0, -1.0), 0.0);
        let h = s.submit(treat(0, 1.0), 0.0).unwrap();
        assert_eq!(h, OperationHandle(SequenceId(0)));
    }

    #[test]
    fn submit_rejects_when_full() {
        let mut s = OperationScheduler::new(2);
        s.submit(seed(0, 0.0), 0.0).unwrap();
        s.submit(seed(1, 0.0), 0.0).unwrap();
        assert_eq!(
            s.submit(seed(2, 0.0), 0.0),
            Err(SubmitError::QueueFull { capacity: 2 })
        );
    }

    #[test]
    fn invalid_payload_rejected() {
        let mut s = OperationScheduler::new(2);
        let mut req = treat(0, 0.0);
        req.payload = OperationPayload::Treat {
            compound: CompoundId::from("x"),
            dose_um: -1.0,
        };
        assert!(matches!(
            s.submit(req, 0.0),
            Err(SubmitError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn flush_takes_only_due_operations() {
        let mut s = OperationScheduler::new(8);
        s.submit(feed(0, 2.0), 0.0).unwrap();
        s.submit(feed(0, 6.0), 0.0).unwrap();
        let due = s.flush(2.0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].scheduled_time(), 2.0);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn flush_keeps_remaining_in_submission_order() {
        let mut s = OperationScheduler::new(16);
        for i in 0..8u32 {
            let t = if i % 2 == 0 { 1.0 } else { 5.0 + f64::from(i) };
            s.submit(feed(i, t), 0.0).unwrap();
        }
        assert_eq!(s.flush(1.0).len(), 4);
        let left: Vec<u64> = s.iter().map(|op| op.sequence_id().0).collect();
        assert_eq!(left, vec![1, 3, 5, 7]);
        assert_eq!(s.next_due_after(1.0), Some(6.0));

        s.submit(feed(9, 2.0), 1.0).unwrap();
        let due: Vec<u64> = s.flush(8.0).iter().map(|op| op.sequence_id().0).collect();
        assert_eq!(due, vec![8, 1, 3]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn flush_orders_by_time_then_priority_then_sequence() {
        let mut s = OperationScheduler::new(16);
        s.submit(treat(0, 1.0), 0.0).unwrap();
        s.submit(treat(1, 0.0), 0.0).unwrap();
        s.submit(feed(0, 0.0), 0.0).unwrap();
        s.submit(washout(0, 0.0), 0.0).unwrap();
        s.submit(seed(3, 0.0), 0.0).unwrap();
        s.submit(treat(2, 0.0), 0.0).unwrap();
        let kinds: Vec<(f64, OperationKind, u64)> = s
            .flush(10.0)
            .iter()
            .map(|op| (op.scheduled_time(), op.kind(), op.sequence_id().0))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (0.0, OperationKind::Seed, 4),
                (0.0, OperationKind::Washout, 3),
                (0.0, OperationKind::Feed, 2),
                (0.0, OperationKind::Treat, 1),
                (0.0, OperationKind::Treat, 5),
                (1.0, OperationKind::Treat, 0),
            ]
        );
    }

    #[test]
    fn withdraw_before_flush_only() {
        let mut s = OperationScheduler::new(8);
        let h = s.submit(treat(0, 3.0), 0.0).unwrap();
        let other = s.submit(feed(0, 1.0), 0.0).unwrap();
        assert_eq!(s.withdraw(h).unwrap().kind(), OperationKind::Treat);
        assert_eq!(s.withdraw(h), Err(SubmitError::UnknownHandle(h)));
        s.flush(5.0);
        assert_eq!(s.withdraw(other), Err(SubmitError::UnknownHandle(other)));
        assert!(s.is_empty());
    }

    #[test]
    fn next_due_after_is_strict() {
        let mut s = OperationScheduler::new(8);
        s.submit(feed(0, 2.0), 0.0).unwrap();
        s.submit(feed(0, 5.0), 0.0).unwrap();
        assert_eq!(s.next_due_after(0.0), Some(2.0));
        assert_eq!(s.next_due_after(2.0), Some(5.0));
        assert_eq!(s.next_due_after(5.0), None);
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_request() -> impl Strategy<Value = OperationRequest> {
            (0u32..4, 0u8..4, 0u8..4).prop_map(|(vessel, kind, slot)| {
                let t = f64::from(slot) * 0.5;
                match kind {
                    0 => seed(vessel, t),
                    1 => washout(vessel, t),
                    2 => feed(vessel, t),
                    _ => treat(vessel, t),
                }
            })
        }

        proptest! {
            #[test]
            fn flush_always_sorted(requests in prop::collection::vec(arb_request(), 0..48)) {
                let mut s = OperationScheduler::new(64);
                for r in requests {
                    s.submit(r, 0.0).unwrap();
                }
                let due = s.flush(10.0);
                for pair in due.windows(2) {
                    prop_assert!(pair[0].delivery_cmp(&pair[1]).is_lt());
                }
                prop_assert!(s.is_empty());
            }

            #[test]
            fn unrelated_interleaving_does_not_change_same_time_order(
                same_time in prop::collection::vec(arb_request(), 1..12),
                unrelated in prop::collection::vec(arb_request(), 0..12),
                split in 0usize..12,
            ) {
                // Same-time operations keep their relative submission order;
                // unrelated later-time operations are spliced in between.
                let same: Vec<OperationRequest> = same_time
                    .into_iter()
                    .map(|mut r| { r.scheduled_time = 1.0; r })
                    .collect();
                let later: Vec<OperationRequest> = unrelated
                    .into_iter()
                    .map(|mut r| { r.scheduled_time = 7.0; r })
                    .collect();

                let mut a = OperationScheduler::new(64);
                for r in same.iter().cloned() {
                    a.submit(r, 0.0).unwrap();
                }
                for r in later.iter().cloned() {
                    a.submit(r, 0.0).unwrap();
                }

                let mut b = OperationScheduler::new(64);
                let cut = split.min(later.len());
                let mut later_iter = later.iter().cloned();
                for r in later_iter.by_ref().take(cut) {
                    b.submit(r, 0.0).unwrap();
                }
                for (i, r) in same.iter().cloned().enumerate() {
                    b.submit(r, 0.0).unwrap();
                    if i == 0 {
                        for r in later_iter.by_ref() {
                            b.submit(r, 0.0).unwrap();
                        }
                    }
                }

                let key = |ops: Vec<PendingOperation>| -> Vec<(VesselId, OperationKind)> {
                    ops.iter().map(|op| (op.target_vessel(), op.kind())).collect()
                };
                prop_assert_eq!(key(a.flush(1.0)), key(b.flush(1.0)));
            }
        }
    }
}
