//! Running totals for a room, read by objective evaluation

use serde::{Deserialize, Serialize};

use crate::domain::entities::Combatant;

use super::Roster;

/// Counters only ever grow during a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedStats {
    pub total_monsters_killed: u32,
    pub total_damage_dealt: u32,
    pub total_damage_taken: u32,
    pub total_loot_collected: u32,
    pub total_gold_collected: u32,
    pub rounds_completed: u32,
    pub characters_exhausted: u32,
    pub character_deaths: u32,
}

impl AccumulatedStats {
    /// Reconcile counters with the roster without ever lowering them
    pub fn refresh_from(&mut self, roster: &Roster) {
        let killed = roster.monsters.iter().filter(|m| m.core.is_dead).count() as u32;
        let exhausted = roster.characters.iter().filter(|c| c.is_exhausted).count() as u32;
        let dead = roster.characters.iter().filter(|c| !c.is_active() && c.core.is_dead).count() as u32;
        let dealt: u32 = roster.characters.iter().map(|c| c.damage_dealt).sum();
        let loot: u32 = roster.characters.iter().map(|c| c.loot_collected).sum();
        let gold: u32 = roster.characters.iter().map(|c| c.gold).sum();

        self.total_monsters_killed = self.total_monsters_killed.max(killed);
        self.characters_exhausted = self.characters_exhausted.max(exhausted);
        self.character_deaths = self.character_deaths.max(dead);
        self.total_damage_dealt = self.total_damage_dealt.max(dealt);
        self.total_loot_collected = self.total_loot_collected.max(loot);
        self.total_gold_collected = self.total_gold_collected.max(gold);
    }
}
