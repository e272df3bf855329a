//! Plunder taken from a beaten defender

use crate::combat::constants::PLUNDER_PCT;
use crate::world::ResourceLedger;

/// A quarter of every defender resource, floored
pub fn plunder(defender_resources: &ResourceLedger) -> ResourceLedger {
    defender_resources.map(|_, amount| (amount as u128 * PLUNDER_PCT as u128 / 100) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_floored() {
        let loot = plunder(&ResourceLedger::new(1000, 333, 3));
        assert_eq!(loot, ResourceLedger::new(250, 83, 0));
    }

    #[test]
    fn test_never_exceeds_stock() {
        let stock = ResourceLedger::new(u64::MAX, 1, 0);
        let loot = plunder(&stock);
        assert!(loot.wood <= stock.wood);
        assert!(loot.stone <= stock.stone);
    }
}
