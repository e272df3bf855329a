//! Attack formations and combat roles
//!
//! A formation names the unit kind standing in front (phalanx), in the
//! middle (support) and at the back. Only the first two carry combat
//! weight; everything else counts as "other".

use serde::{Deserialize, Serialize};

use crate::core::types::UnitKind;
use crate::units::Roster;

/// Player-chosen role assignment sent along with an attack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(default)]
    pub front: Option<UnitKind>,
    #[serde(default)]
    pub mid: Option<UnitKind>,
    #[serde(default)]
    pub back: Option<UnitKind>,
}

impl Formation {
    pub fn new(front: impl Into<UnitKind>, mid: impl Into<UnitKind>) -> Self {
        Self {
            front: Some(front.into()),
            mid: Some(mid.into()),
            back: None,
        }
    }

    /// Roles as they apply to one domain's roster
    ///
    /// Only kinds the formation names and the roster actually holds get a
    /// role. Everything else fights as "other", so a side without a
    /// formation has neither phalanx nor support.
    pub fn roles_for(&self, roster: &Roster) -> Roles {
        let present = |kind: &Option<UnitKind>| kind.clone().filter(|k| roster.contains(k));

        let phalanx = present(&self.front);
        let support = present(&self.mid).filter(|k| Some(k) != phalanx.as_ref());

        Roles { phalanx, support }
    }
}

/// Resolved roles for one side of one battle phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    pub phalanx: Option<UnitKind>,
    pub support: Option<UnitKind>,
}

impl Roles {
    pub fn role_of(&self, kind: &UnitKind) -> Role {
        if self.phalanx.as_ref() == Some(kind) {
            Role::Phalanx
        } else if self.support.as_ref() == Some(kind) {
            Role::Support
        } else {
            Role::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Phalanx,
    Support,
    Other,
}
