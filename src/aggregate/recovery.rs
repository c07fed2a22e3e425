//! Reconstructing the recovery timeline from per-phase durations.

use std::collections::BTreeMap;

use crate::ingest::record::{PhaseDeltas, RawPhase};

/// The phases shown in recovery charts, in timeline order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum_macros::EnumIter,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPhase {
    #[strum(serialize = "get peer")]
    GetPeer,
    #[strum(serialize = "connect")]
    Connect,
    #[strum(serialize = "rdma read")]
    RdmaRead,
    #[strum(serialize = "sync peer")]
    SyncPeer,
    #[strum(serialize = "parse")]
    Parse,
}

/// The phases whose values accumulate, each with the raw delta it
/// adds.
const CUMULATIVE: [(RecoveryPhase, RawPhase); 4] = [
    (RecoveryPhase::GetPeer, RawPhase::GetPeer),
    (RecoveryPhase::Connect, RawPhase::Connect),
    (RecoveryPhase::RdmaRead, RawPhase::Recover),
    (RecoveryPhase::SyncPeer, RawPhase::SyncPeers),
];

fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1e6
}

/// Per (backend, database): phase -> milliseconds. The cumulative
/// phases are either all present or all absent. `Parse` is the
/// `end_recover` duration on its own, not stacked on the others.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RecoveryTrace {
    phases: BTreeMap<RecoveryPhase, f64>,
}

/// One rectangle of a stacked recovery bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSegment {
    pub phase: RecoveryPhase,
    pub bottom: f64,
    pub top: f64,
}

impl RecoveryTrace {
    pub fn get(&self, phase: RecoveryPhase) -> Option<f64> {
        self.phases.get(&phase).copied()
    }

    pub fn has_cumulative_group(&self) -> bool {
        self.phases.contains_key(&RecoveryPhase::GetPeer)
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// In timeline order.
    pub fn iter(&self) -> impl Iterator<Item = (RecoveryPhase, f64)> + '_ {
        self.phases.iter().map(|(p, v)| (*p, *v))
    }

    /// Segments in drawing order (`Parse` first, from zero, so that
    /// the cumulative segments are painted over it). Each cumulative
    /// segment spans from the previous cumulative value to its own.
    pub fn segments(&self) -> Vec<PhaseSegment> {
        let mut segments = Vec::new();
        if let Some(top) = self.get(RecoveryPhase::Parse) {
            segments.push(PhaseSegment {
                phase: RecoveryPhase::Parse,
                bottom: 0.,
                top,
            });
        }
        let mut bottom = 0.;
        let mut cumulative = Vec::new();
        for (phase, _) in CUMULATIVE {
            if let Some(top) = self.get(phase) {
                cumulative.push(PhaseSegment { phase, bottom, top });
                bottom = top;
            }
        }
        segments.extend(cumulative.into_iter().rev());
        segments
    }
}

/// Running sums over get peer, connect, rdma read and sync peer; if
/// any of their deltas is missing, none of them is produced. `Parse`
/// comes from `end_recover` regardless.
pub fn reconstruct_recovery(deltas: &PhaseDeltas) -> RecoveryTrace {
    let mut phases = BTreeMap::new();

    let mut total_ns: u64 = 0;
    let cumulative: Option<Vec<(RecoveryPhase, f64)>> = CUMULATIVE
        .iter()
        .map(|(phase, raw)| {
            total_ns = total_ns.saturating_add(deltas.get(*raw)?);
            Some((*phase, ns_to_ms(total_ns)))
        })
        .collect();
    if let Some(cumulative) = cumulative {
        phases.extend(cumulative);
    }

    if let Some(parse) = deltas.get(RawPhase::EndRecover) {
        phases.insert(RecoveryPhase::Parse, ns_to_ms(parse));
    }

    RecoveryTrace { phases }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn full_deltas() -> PhaseDeltas {
        PhaseDeltas::default()
            .with(RawPhase::GetPeer, 1_000_000)
            .with(RawPhase::Connect, 500_000)
            .with(RawPhase::Recover, 2_000_000)
            .with(RawPhase::SyncPeers, 300_000)
            .with(RawPhase::EndRecover, 400_000)
    }

    #[test]
    fn t_cumulative() {
        let t = reconstruct_recovery(&full_deltas());
        assert_relative_eq!(t.get(RecoveryPhase::GetPeer).unwrap(), 1.0);
        assert_relative_eq!(t.get(RecoveryPhase::Connect).unwrap(), 1.5);
        assert_relative_eq!(t.get(RecoveryPhase::RdmaRead).unwrap(), 3.5);
        assert_relative_eq!(t.get(RecoveryPhase::SyncPeer).unwrap(), 3.8);
        assert_relative_eq!(t.get(RecoveryPhase::Parse).unwrap(), 0.4);
        assert!(t.has_cumulative_group());
        let mut previous = 0.;
        for (phase, v) in t.iter().filter(|(p, _)| *p != RecoveryPhase::Parse) {
            assert!(v >= previous, "{phase}");
            previous = v;
        }
    }

    #[test]
    fn t_missing_intermediate_drops_group() {
        let deltas = PhaseDeltas::default()
            .with(RawPhase::GetPeer, 1_000_000)
            .with(RawPhase::Recover, 2_000_000)
            .with(RawPhase::SyncPeers, 300_000)
            .with(RawPhase::EndRecover, 400_000);
        let t = reconstruct_recovery(&deltas);
        assert!(!t.has_cumulative_group());
        assert_eq!(
            t.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            [RecoveryPhase::Parse]
        );
    }

    #[test]
    fn t_missing_parse_keeps_group() {
        let deltas = PhaseDeltas::default()
            .with(RawPhase::GetPeer, 1)
            .with(RawPhase::Connect, 1)
            .with(RawPhase::Recover, 1)
            .with(RawPhase::SyncPeers, 1);
        let t = reconstruct_recovery(&deltas);
        assert!(t.has_cumulative_group());
        assert_eq!(t.get(RecoveryPhase::Parse), None);
        assert!(reconstruct_recovery(&PhaseDeltas::default()).is_empty());
    }

    #[test]
    fn t_segments() {
        let t = reconstruct_recovery(&full_deltas());
        let segs = t.segments();
        assert_eq!(
            segs.iter().map(|s| s.phase).collect::<Vec<_>>(),
            [
                RecoveryPhase::Parse,
                RecoveryPhase::SyncPeer,
                RecoveryPhase::RdmaRead,
                RecoveryPhase::Connect,
                RecoveryPhase::GetPeer,
            ]
        );
        assert_relative_eq!(segs[0].top, 0.4);
        assert_relative_eq!(segs[2].bottom, 1.5);
        assert_relative_eq!(segs[2].top - segs[2].bottom, 2.0);
        assert_relative_eq!(segs[4].bottom, 0.0);
    }

    #[test]
    fn t_labels() {
        let labels: Vec<String> = RecoveryPhase::iter().map(|p| p.to_string()).collect();
        assert_eq!(
            labels,
            ["get peer", "connect", "rdma read", "sync peer", "parse"]
        );
    }
}
