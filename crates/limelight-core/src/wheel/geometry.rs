//! Wheel partition geometry.
//!
//! Segments are derived, never stored across updates: any change to the
//! participant list or ticket limits rebuilds the whole partition.

use serde::Serialize;

use crate::events::Participant;

use super::tickets::{self, TicketLimits};

pub const FULL_TURN: f64 = 360.0;

/// Fixed pointer position at the top of the circle, in screen space.
pub const POINTER_ANGLE: f64 = -90.0;

/// One contiguous slice of the wheel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WheelSegment {
    pub participant_id: String,
    pub weight: u32,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl WheelSegment {
    /// Containment over `[start, end)`, handling a span that wraps the
    /// 0/360 seam.
    pub fn contains(&self, angle: f64) -> bool {
        if self.start_angle <= self.end_angle {
            angle >= self.start_angle && angle < self.end_angle
        } else {
            angle >= self.start_angle || angle < self.end_angle
        }
    }
}

/// Builds contiguous segments in participant list order.
///
/// Each end angle comes from the running cumulative weight, so adjacent
/// segments share an edge exactly and the final one closes at precisely
/// 360 degrees, with no per-segment rounding drift.
pub fn build_segments(participants: &[Participant], limits: TicketLimits) -> Vec<WheelSegment> {
    let weights: Vec<u32> = participants
        .iter()
        .map(|p| tickets::tickets_for(p, limits))
        .collect();
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let total = f64::from(total);

    let mut segments = Vec::with_capacity(participants.len());
    let mut cumulative: u32 = 0;
    let mut start = 0.0;
    for (participant, weight) in participants.iter().zip(weights) {
        cumulative += weight;
        let end = FULL_TURN * f64::from(cumulative) / total;
        segments.push(WheelSegment {
            participant_id: participant.id.clone(),
            weight,
            start_angle: start,
            end_angle: end,
        });
        start = end;
    }
    segments
}

/// Normalizes an angle to `[0, 360)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let normalized = angle % FULL_TURN;
    if normalized < 0.0 {
        normalized + FULL_TURN
    } else {
        normalized
    }
}

/// Position of the fixed pointer in un-rotated wheel space for a given
/// wheel rotation.
pub fn pointer_position(rotation: f64) -> f64 {
    normalize_angle(-rotation - POINTER_ANGLE)
}

/// Finds the segment under the pointer at the given rotation.
///
/// Falls back to the last segment when floating-point edge effects leave
/// the pointer on no segment at all.
pub fn segment_at_pointer(segments: &[WheelSegment], rotation: f64) -> Option<&WheelSegment> {
    if segments.is_empty() {
        return None;
    }
    let pointer = pointer_position(rotation);
    segments
        .iter()
        .find(|segment| segment.contains(pointer))
        .or_else(|| segments.last())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SubscriberTier;

    fn participant(id: &str, entry_count: u32) -> Participant {
        Participant {
            id: id.to_string(),
            entry_count,
            is_subscriber: false,
            subscriber_tier: SubscriberTier::Unknown,
            subscribed_months: 0,
        }
    }

    fn uncapped() -> TicketLimits {
        TicketLimits {
            base: 0,
            final_total: 0,
        }
    }

    #[test]
    fn test_segments_sum_to_full_turn() {
        let participants = vec![
            participant("a", 3),
            participant("b", 7),
            participant("c", 1),
            participant("d", 11),
        ];
        let segments = build_segments(&participants, uncapped());
        assert_eq!(segments.len(), 4);

        let total: f64 = segments
            .iter()
            .map(|s| s.end_angle - s.start_angle)
            .sum();
        assert!((total - FULL_TURN).abs() <= 1e-6);
        assert_eq!(segments.last().unwrap().end_angle, FULL_TURN);
    }

    #[test]
    fn test_segments_are_contiguous() {
        let participants = vec![participant("a", 2), participant("b", 3), participant("c", 5)];
        let segments = build_segments(&participants, uncapped());
        assert_eq!(segments[0].start_angle, 0.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_angle, pair[1].start_angle);
        }
    }

    #[test]
    fn test_no_participants_no_segments() {
        assert!(build_segments(&[], uncapped()).is_empty());
        assert_eq!(segment_at_pointer(&[], 0.0), None);
    }

    #[test]
    fn test_pointer_on_even_two_way_split() {
        let participants = vec![participant("a", 1), participant("b", 1)];
        let segments = build_segments(&participants, uncapped());

        let at_rest = segment_at_pointer(&segments, 0.0).unwrap();
        assert_eq!(at_rest.participant_id, "a");
        assert_eq!(at_rest.start_angle, 0.0);

        let half_turn = segment_at_pointer(&segments, 180.0).unwrap();
        assert_eq!(half_turn.participant_id, "b");
    }

    #[test]
    fn test_pointer_matches_wrapped_segment() {
        let segments = vec![
            WheelSegment {
                participant_id: "seam".to_string(),
                weight: 1,
                start_angle: 350.0,
                end_angle: 10.0,
            },
            WheelSegment {
                participant_id: "rest".to_string(),
                weight: 35,
                start_angle: 10.0,
                end_angle: 350.0,
            },
        ];

        // Pointer lands at 355 and 5 degrees, both inside the wrapped span.
        assert_eq!(
            segment_at_pointer(&segments, 95.0).unwrap().participant_id,
            "seam"
        );
        assert_eq!(
            segment_at_pointer(&segments, 85.0).unwrap().participant_id,
            "seam"
        );
        assert_eq!(
            segment_at_pointer(&segments, 70.0).unwrap().participant_id,
            "rest"
        );
    }

    #[test]
    fn test_pointer_falls_back_to_last_segment() {
        // A malformed partition that covers nothing still yields a segment.
        let segments = vec![WheelSegment {
            participant_id: "only".to_string(),
            weight: 1,
            start_angle: 100.0,
            end_angle: 100.0,
        }];
        assert_eq!(
            segment_at_pointer(&segments, 0.0).unwrap().participant_id,
            "only"
        );
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(360.0), 0.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(725.0), 5.0);
        assert_eq!(normalize_angle(-725.0), 355.0);
    }
}
