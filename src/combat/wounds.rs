//! Wounded conversion: part of the attacker's land losses survive injured
//!
//! Naval and mythical losses are always permanent.

use crate::combat::constants::WOUNDED_PCT;
use crate::units::{Roster, UnitCatalog};

/// Split raw losses into (permanent losses, wounded)
pub fn split_wounded(catalog: &UnitCatalog, losses: &Roster) -> (Roster, Roster) {
    let mut permanent = Roster::new();
    let mut wounded = Roster::new();

    for (kind, lost) in losses.iter() {
        let eligible = catalog.get(kind).is_some_and(|s| s.can_be_wounded());
        let injured = if eligible { (lost as u64 * WOUNDED_PCT as u64 / 100) as u32 } else { 0 };
        permanent.add(kind, lost - injured);
        wounded.add(kind, injured);
    }

    (permanent, wounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifteen_percent_of_land_losses() {
        let catalog = UnitCatalog::with_defaults();
        let losses = Roster::new().with("hoplite", 40).with("archer", 6);

        let (permanent, wounded) = split_wounded(&catalog, &losses);

        assert_eq!(wounded.get(&"hoplite".into()), 6);
        assert_eq!(permanent.get(&"hoplite".into()), 34);
        // 15% of 6 floors to zero
        assert_eq!(wounded.get(&"archer".into()), 0);
        assert_eq!(permanent.get(&"archer".into()), 6);
    }

    #[test]
    fn test_naval_and_mythical_never_wounded() {
        let catalog = UnitCatalog::with_defaults();
        let losses = Roster::new().with("trireme", 100).with("minotaur", 100);

        let (permanent, wounded) = split_wounded(&catalog, &losses);

        assert!(wounded.is_empty());
        assert_eq!(permanent, losses);
    }
}
