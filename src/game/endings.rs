//! 结局判定。按顺序匹配，第一个满足的结局生效。

use serde::{Deserialize, Serialize};

use super::reputation::{FactionId, ReputationStatus};
use super::state::GameState;

const WARLORD_BATTLES_WON: u32 = 3;
const OUTCAST_HOSTILE_FACTIONS: usize = 2;
const PEACEMAKER_COMPROMISES: u32 = 2;
const FORTUNE_HUNTER_BOUNTY: u32 = 2000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    Warlord,
    Outcast,
    FactionChampion,
    Peacemaker,
    FortuneHunter,
    Drifter,
}

impl Ending {
    pub fn as_str(self) -> &'static str {
        match self {
            Ending::Warlord => "warlord",
            Ending::Outcast => "outcast",
            Ending::FactionChampion => "faction_champion",
            Ending::Peacemaker => "peacemaker",
            Ending::FortuneHunter => "fortune_hunter",
            Ending::Drifter => "drifter",
        }
    }
}

pub fn evaluate_ending(state: &GameState) -> Ending {
    let stats = &state.stats;
    let hostile = FactionId::ALL
        .iter()
        .filter(|faction| state.reputation_status(**faction) == ReputationStatus::Hostile)
        .count();
    let devoted = FactionId::ALL
        .iter()
        .any(|faction| state.reputation_status(*faction) == ReputationStatus::Devoted);

    if stats.battles_won >= WARLORD_BATTLES_WON {
        Ending::Warlord
    } else if hostile >= OUTCAST_HOSTILE_FACTIONS {
        Ending::Outcast
    } else if devoted {
        Ending::FactionChampion
    } else if stats.compromises >= PEACEMAKER_COMPROMISES
        || (stats.compromises >= 1 && stats.battles_fought() == 0)
    {
        Ending::Peacemaker
    } else if state.bounty >= FORTUNE_HUNTER_BOUNTY {
        Ending::FortuneHunter
    } else {
        Ending::Drifter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_game_drifts() {
        assert_eq!(evaluate_ending(&GameState::new()), Ending::Drifter);
    }

    #[test]
    fn battles_outrank_reputation() {
        let mut state = GameState::new();
        state.stats.battles_won = 3;
        state.set_reputation(FactionId::Ashfall, -90);
        state.set_reputation(FactionId::Meridian, -90);
        assert_eq!(evaluate_ending(&state), Ending::Warlord);

        state.stats.battles_won = 1;
        assert_eq!(evaluate_ending(&state), Ending::Outcast);
    }

    #[test]
    fn single_compromise_without_battles_is_peacemaker() {
        let mut state = GameState::new();
        state.stats.compromises = 1;
        assert_eq!(evaluate_ending(&state), Ending::Peacemaker);
        state.stats.battles_drawn = 1;
        assert_eq!(evaluate_ending(&state), Ending::Drifter);
        state.bounty = 2500;
        assert_eq!(evaluate_ending(&state), Ending::FortuneHunter);
    }
}
