//! Loss distribution across a roster
//!
//! The phalanx takes up to 60% of the budget, support up to 30% of what is
//! left, the rest spreads over the other kinds by count. Rounding leftovers
//! fall on whichever other kind still has the most units standing. The
//! phalanx and support never take more than their capped shares, so a
//! budget the other kinds cannot absorb goes unspent.

use crate::combat::constants::{PHALANX_LOSS_SHARE_PCT, SUPPORT_LOSS_SHARE_PCT};
use crate::combat::formation::Roles;
use crate::core::types::UnitKind;
use crate::units::Roster;

/// Fraction of its own units a side loses
///
/// A side with zero power is treated as having power 1.
pub fn loss_ratio(opponent_power: f64, own_power: f64) -> f64 {
    let own = if own_power > 0.0 { own_power } else { 1.0 };
    (opponent_power / own).clamp(0.0, 1.0)
}

/// Number of units lost for a roster of `total` units
pub fn loss_budget(total: u64, ratio: f64) -> u64 {
    ((total as f64 * ratio).floor() as u64).min(total)
}

/// Split `budget` losses over `roster` by role priority
///
/// No kind ever loses more than it has, and the returned roster never sums
/// to more than `budget`.
pub fn distribute_losses(roster: &Roster, budget: u64, roles: &Roles) -> Roster {
    let budget = budget.min(roster.total());
    let mut losses = Roster::new();
    let mut remaining = budget;

    if let Some(phalanx) = &roles.phalanx {
        let taken = (budget * PHALANX_LOSS_SHARE_PCT / 100).min(roster.get(phalanx) as u64);
        losses.add(phalanx, taken as u32);
        remaining -= taken;
    }

    if let Some(support) = &roles.support {
        let standing = roster.get(support) - losses.get(support);
        let taken = (remaining * SUPPORT_LOSS_SHARE_PCT / 100).min(standing as u64);
        losses.add(support, taken as u32);
        remaining -= taken;
    }

    let others: Vec<(&UnitKind, u32)> = roster
        .iter()
        .filter(|(kind, _)| roles.phalanx.as_ref() != Some(*kind) && roles.support.as_ref() != Some(*kind))
        .collect();
    let others_total: u64 = others.iter().map(|(_, count)| *count as u64).sum();

    if others_total > 0 && remaining > 0 {
        let pool = remaining;
        for (kind, count) in &others {
            let share = ((pool as u128 * *count as u128) / others_total as u128) as u64;
            let taken = share.min(*count as u64).min(remaining);
            losses.add(kind, taken as u32);
            remaining -= taken;
        }
    }

    // Rounding leftovers go to the largest other stack still standing
    while remaining > 0 {
        let largest = others
            .iter()
            .map(|(kind, count)| (*kind, count - losses.get(kind)))
            .filter(|(_, standing)| *standing > 0)
            .fold(None, |best: Option<(&UnitKind, u32)>, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            });

        let Some((kind, standing)) = largest else {
            break;
        };
        let taken = (standing as u64).min(remaining);
        losses.add(kind, taken as u32);
        remaining -= taken;
    }

    losses
}
