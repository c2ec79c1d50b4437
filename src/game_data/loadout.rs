//! Loadout ID to faction/class mapping.
//!
//! The feed identifies a character's current class only through a numeric
//! loadout ID. The table is closed: an ID outside it is a referential gap
//! and the caller decides whether that invalidates the whole message (kill
//! attribution does) or just the class sub-update (squad display does not).

use phf::phf_map;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Nc,
    Tr,
    Vs,
    Ns,
}

impl Faction {
    pub fn tag(&self) -> &'static str {
        match self {
            Faction::Nc => "NC",
            Faction::Tr => "TR",
            Faction::Vs => "VS",
            Faction::Ns => "NS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Infiltrator,
    LightAssault,
    Medic,
    Engineer,
    Heavy,
    Max,
}

impl ClassKind {
    /// Single-letter code shown in squad rosters.
    pub fn code(&self) -> &'static str {
        match self {
            ClassKind::Infiltrator => "I",
            ClassKind::LightAssault => "L",
            ClassKind::Medic => "M",
            ClassKind::Engineer => "E",
            ClassKind::Heavy => "H",
            ClassKind::Max => "W",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Loadout {
    pub faction: Faction,
    pub class: ClassKind,
}

impl Loadout {
    const fn new(faction: Faction, class: ClassKind) -> Self {
        Self { faction, class }
    }
}

pub fn lookup_loadout(id: &str) -> Option<&'static Loadout> {
    LOADOUTS.get(id)
}

/// Loadout table, keyed by feed loadout ID.
pub static LOADOUTS: phf::Map<&'static str, Loadout> = phf_map! {
    // NC
    "1" => Loadout::new(Faction::Nc, ClassKind::Infiltrator),
    "3" => Loadout::new(Faction::Nc, ClassKind::LightAssault),
    "4" => Loadout::new(Faction::Nc, ClassKind::Medic),
    "5" => Loadout::new(Faction::Nc, ClassKind::Engineer),
    "6" => Loadout::new(Faction::Nc, ClassKind::Heavy),
    "7" => Loadout::new(Faction::Nc, ClassKind::Max),
    // TR
    "8" => Loadout::new(Faction::Tr, ClassKind::Infiltrator),
    "10" => Loadout::new(Faction::Tr, ClassKind::LightAssault),
    "11" => Loadout::new(Faction::Tr, ClassKind::Medic),
    "12" => Loadout::new(Faction::Tr, ClassKind::Engineer),
    "13" => Loadout::new(Faction::Tr, ClassKind::Heavy),
    "14" => Loadout::new(Faction::Tr, ClassKind::Max),
    // VS
    "15" => Loadout::new(Faction::Vs, ClassKind::Infiltrator),
    "17" => Loadout::new(Faction::Vs, ClassKind::LightAssault),
    "18" => Loadout::new(Faction::Vs, ClassKind::Medic),
    "19" => Loadout::new(Faction::Vs, ClassKind::Engineer),
    "20" => Loadout::new(Faction::Vs, ClassKind::Heavy),
    "21" => Loadout::new(Faction::Vs, ClassKind::Max),
    // NS
    "28" => Loadout::new(Faction::Ns, ClassKind::Infiltrator),
    "29" => Loadout::new(Faction::Ns, ClassKind::LightAssault),
    "30" => Loadout::new(Faction::Ns, ClassKind::Medic),
    "31" => Loadout::new(Faction::Ns, ClassKind::Engineer),
    "32" => Loadout::new(Faction::Ns, ClassKind::Heavy),
    "45" => Loadout::new(Faction::Ns, ClassKind::Max),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_loadouts_resolve() {
        let l = lookup_loadout("4").unwrap();
        assert_eq!(l.faction, Faction::Nc);
        assert_eq!(l.class.code(), "M");
        assert!(lookup_loadout("2").is_none());
    }
}
