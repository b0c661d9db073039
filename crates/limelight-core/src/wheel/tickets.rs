//! Ticket weighting.
//!
//! Converts a participant's entitlements (entries plus subscriber bonus)
//! into the ticket count that sizes their wheel segment.

use crate::events::Participant;

/// Caps applied during weighting. Zero means uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketLimits {
    /// Cap on tickets earned from entry count alone.
    pub base: u32,
    /// Cap on the final total after the subscriber bonus.
    pub final_total: u32,
}

impl Default for TicketLimits {
    fn default() -> Self {
        TicketLimits {
            base: 10,
            final_total: 0,
        }
    }
}

/// Final ticket count for one participant. Never less than one.
pub fn tickets_for(participant: &Participant, limits: TicketLimits) -> u32 {
    let mut base = participant.entry_count.max(1);
    if limits.base > 0 {
        base = base.min(limits.base);
    }
    let mut total = base + subscriber_bonus(participant);
    if limits.final_total > 0 {
        total = total.min(limits.final_total);
    }
    total.max(1)
}

/// Bonus tickets from subscription tenure and tier.
///
/// Any subscriber gets at least one bonus ticket, even when the computed
/// value rounds to zero (fresh subscription or unrecognized tier).
fn subscriber_bonus(participant: &Participant) -> u32 {
    if !participant.is_subscriber {
        return 0;
    }
    let months = f64::from(participant.subscribed_months);
    let raw = (months * participant.subscriber_tier.coefficient() * 1.1 / 3.0).ceil();
    (raw as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SubscriberTier;

    fn participant(
        entry_count: u32,
        is_subscriber: bool,
        tier: SubscriberTier,
        months: u32,
    ) -> Participant {
        Participant {
            id: "p".to_string(),
            entry_count,
            is_subscriber,
            subscriber_tier: tier,
            subscribed_months: months,
        }
    }

    #[test]
    fn test_non_subscriber_uses_capped_entries() {
        let p = participant(3, false, SubscriberTier::Unknown, 0);
        let limits = TicketLimits {
            base: 3,
            final_total: 0,
        };
        assert_eq!(tickets_for(&p, limits), 3);
    }

    #[test]
    fn test_tier_two_bonus() {
        // base 1, bonus ceil(6 * 1.1 * 1.1 / 3) = 3.
        let p = participant(1, true, SubscriberTier::Tier2, 6);
        let limits = TicketLimits {
            base: 3,
            final_total: 0,
        };
        assert_eq!(tickets_for(&p, limits), 4);
    }

    #[test]
    fn test_final_limit_caps_total() {
        // base 3 capped, bonus ceil(12 * 1.0 * 1.1 / 3) = 5, total 8 -> capped.
        let p = participant(7, true, SubscriberTier::Tier1, 12);
        let limits = TicketLimits {
            base: 3,
            final_total: 5,
        };
        assert_eq!(tickets_for(&p, limits), 5);
    }

    #[test]
    fn test_zero_limits_mean_uncapped() {
        let p = participant(40, false, SubscriberTier::Unknown, 0);
        let limits = TicketLimits {
            base: 0,
            final_total: 0,
        };
        assert_eq!(tickets_for(&p, limits), 40);
    }

    #[test]
    fn test_subscriber_floor_applies_to_unknown_tier() {
        // Coefficient 0 computes a zero bonus, floored to one.
        let p = participant(1, true, SubscriberTier::Unknown, 24);
        assert_eq!(tickets_for(&p, TicketLimits::default()), 2);
    }

    #[test]
    fn test_everyone_gets_at_least_one_ticket() {
        let p = participant(0, false, SubscriberTier::Unknown, 0);
        assert_eq!(tickets_for(&p, TicketLimits::default()), 1);
    }

    #[test]
    fn test_base_cap_applies_before_bonus() {
        // base min(9, 3) = 3, bonus ceil(3 * 1.2 * 1.1 / 3) = 2.
        let p = participant(9, true, SubscriberTier::Tier3, 3);
        let limits = TicketLimits {
            base: 3,
            final_total: 0,
        };
        assert_eq!(tickets_for(&p, limits), 5);
    }
}
