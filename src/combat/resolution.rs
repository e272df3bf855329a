//! Battle resolution
//!
//! `resolve_battle` fights one domain (land or sea). `resolve_combat` chains
//! a naval phase in front of the land phase when the attack crosses water,
//! then applies plunder and wounded conversion. Both are pure: identical
//! inputs always give identical outputs.

use serde::{Deserialize, Serialize};

use crate::combat::formation::Formation;
use crate::combat::losses::{distribute_losses, loss_budget, loss_ratio};
use crate::combat::plunder::plunder;
use crate::combat::power::{power_breakdown, total_power, Side};
use crate::combat::wounds::split_wounded;
use crate::units::{Domain, Roster, UnitCatalog};
use crate::world::ResourceLedger;

/// Outcome of one single-domain battle
#[derive(Debug, Clone, PartialEq)]
pub struct BattleOutcome {
    pub attacker_won: bool,
    pub attacker_losses: Roster,
    pub defender_losses: Roster,
}

impl BattleOutcome {
    fn walkover(attacker_won: bool) -> Self {
        Self {
            attacker_won,
            attacker_losses: Roster::new(),
            defender_losses: Roster::new(),
        }
    }
}

/// Everything the engine needs to know about a clash
#[derive(Debug, Clone, Copy)]
pub struct Engagement<'a> {
    pub attacker: &'a Roster,
    pub defender: &'a Roster,
    pub defender_resources: &'a ResourceLedger,
    /// The attacker must cross a sea boundary
    pub cross_domain: bool,
    pub attacker_formation: &'a Formation,
    pub defender_formation: Option<&'a Formation>,
}

/// Final result of a (one- or two-phase) combat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker_won: bool,
    /// Permanent attacker losses (wounded already deducted)
    pub attacker_losses: Roster,
    pub defender_losses: Roster,
    pub plunder: ResourceLedger,
    /// Attacker units that return home injured
    pub wounded: Roster,
    /// The fleet was sunk and the land force with it
    pub naval_defeat: bool,
}

impl CombatResult {
    /// Units that march home on their own feet: sent - losses - wounded
    pub fn survivors(&self, sent: &Roster) -> Roster {
        let mut survivors = sent.clone();
        survivors.subtract(&self.attacker_losses);
        survivors.subtract(&self.wounded);
        survivors
    }
}

/// Resolve one domain's battle
pub fn resolve_battle(
    catalog: &UnitCatalog,
    domain: Domain,
    attacker: &Roster,
    defender: &Roster,
    attacker_formation: &Formation,
    defender_formation: Option<&Formation>,
) -> BattleOutcome {
    let attacking = catalog.in_domain(attacker, domain);
    let defending = catalog.in_domain(defender, domain);

    // An undefended target is taken without a fight
    if defending.is_empty() {
        return BattleOutcome::walkover(true);
    }
    // Nothing sent, nothing lost
    if attacking.is_empty() {
        return BattleOutcome::walkover(false);
    }

    let attacker_roles = attacker_formation.roles_for(&attacking);
    let defender_roles = defender_formation.cloned().unwrap_or_default().roles_for(&defending);

    let attacker_initial =
        power_breakdown(catalog, &attacking, &attacker_roles, Side::Attacker, &defending).initial();
    let defender_initial =
        power_breakdown(catalog, &defending, &defender_roles, Side::Defender, &attacking).initial();

    let attacker_budget = loss_budget(attacking.total(), loss_ratio(defender_initial, attacker_initial));
    let defender_budget = loss_budget(defending.total(), loss_ratio(attacker_initial, defender_initial));

    let attacker_losses = distribute_losses(&attacking, attacker_budget, &attacker_roles);
    let defender_losses = distribute_losses(&defending, defender_budget, &defender_roles);

    let mut attacking_left = attacking;
    attacking_left.subtract(&attacker_losses);
    let mut defending_left = defending;
    defending_left.subtract(&defender_losses);

    let attacker_final = total_power(catalog, &attacking_left, Side::Attacker, &defending_left);
    let defender_final = total_power(catalog, &defending_left, Side::Defender, &attacking_left);

    tracing::debug!(
        ?domain,
        attacker_initial,
        defender_initial,
        attacker_final,
        defender_final,
        "Battle phase resolved"
    );

    BattleOutcome {
        // Ties favour the attacker
        attacker_won: attacker_final >= defender_final,
        attacker_losses,
        defender_losses,
    }
}

/// Resolve a full combat, including the naval crossing when needed
pub fn resolve_combat(catalog: &UnitCatalog, engagement: &Engagement<'_>) -> CombatResult {
    let mut attacker_losses = Roster::new();
    let mut defender_losses = Roster::new();

    if engagement.cross_domain {
        let naval = resolve_battle(
            catalog,
            Domain::Naval,
            engagement.attacker,
            engagement.defender,
            engagement.attacker_formation,
            engagement.defender_formation,
        );
        attacker_losses.merge(&naval.attacker_losses);
        defender_losses.merge(&naval.defender_losses);

        if !naval.attacker_won {
            // Transports went down with everything they carried
            let drowned = engagement
                .attacker
                .filtered(|kind| catalog.domain_of(kind) != Some(Domain::Naval));
            attacker_losses.merge(&drowned);

            return CombatResult {
                attacker_won: false,
                attacker_losses,
                defender_losses,
                plunder: ResourceLedger::default(),
                wounded: Roster::new(),
                naval_defeat: true,
            };
        }
    }

    let land = resolve_battle(
        catalog,
        Domain::Land,
        engagement.attacker,
        engagement.defender,
        engagement.attacker_formation,
        engagement.defender_formation,
    );
    attacker_losses.merge(&land.attacker_losses);
    defender_losses.merge(&land.defender_losses);

    let loot = if land.attacker_won {
        plunder(engagement.defender_resources)
    } else {
        ResourceLedger::default()
    };

    let (permanent, wounded) = split_wounded(catalog, &attacker_losses);

    CombatResult {
        attacker_won: land.attacker_won,
        attacker_losses: permanent,
        defender_losses,
        plunder: loot,
        wounded,
        naval_defeat: false,
    }
}
