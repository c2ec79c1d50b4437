//! Squad roster entries.

/// One squad. Permanent squads exist for the whole session and are only
/// ever emptied; guess squads are created and destroyed by the inference
/// engine. Membership exclusivity is enforced by the tracker's reverse
/// index, not here.
#[derive(Debug, Clone)]
pub struct Squad {
    pub id: u64,
    pub name: String,
    pub display_name: String,
    pub permanent: bool,
    /// Kept sorted: online members first, then alphabetical by name
    pub member_ids: Vec<String>,
}

impl Squad {
    pub fn new(id: u64, name: String, display_name: String, permanent: bool) -> Self {
        Self {
            id,
            name,
            display_name,
            permanent,
            member_ids: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    pub fn contains(&self, character_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == character_id)
    }
}
