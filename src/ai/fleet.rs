//! 对手舰队的生成：从对立阵营的卡池中用引擎随机源抽取。

use crate::config::TacticalConfig;
use crate::game::combat::{BattleCard, CombatRng};
use crate::game::content::ContentCatalog;
use crate::game::reputation::FactionId;
use crate::game::state::{CombatantState, EnergyPool, OwnedCard, TacticalCard, FLEET_SIZE};

fn shuffled_pool<C: ContentCatalog>(content: &C, faction_id: FactionId, rng: &mut CombatRng) -> Vec<TacticalCard> {
    let mut pool: Vec<TacticalCard> = content
        .opponent_pool(faction_id)
        .iter()
        .filter_map(|card_id| content.get_card_by_id(card_id))
        .map(|definition| definition.to_tactical_card())
        .collect();
    rng.shuffle(&mut pool);
    pool
}

/// 经典对决的五艘对手舰船；卡池不足五张时循环补足，卡池为空返回 `None`。
pub fn generate_opponent_fleet<C: ContentCatalog>(
    content: &C,
    faction_id: FactionId,
    rng: &mut CombatRng,
) -> Option<Vec<BattleCard>> {
    let mut pool: Vec<BattleCard> = content
        .opponent_pool(faction_id)
        .iter()
        .filter_map(|card_id| content.get_card_by_id(card_id))
        .map(|definition| BattleCard {
            card_id: definition.id.clone(),
            name: definition.name.clone(),
            attack: definition.attack,
            armor: definition.armor,
            agility: definition.agility,
        })
        .collect();
    if pool.is_empty() {
        return None;
    }
    rng.shuffle(&mut pool);
    Some(pool.iter().cycle().take(FLEET_SIZE).cloned().collect())
}

fn combatant(config: &TacticalConfig, mut deck: Vec<TacticalCard>) -> CombatantState {
    let opening = config.opening_hand.min(deck.len());
    let hand: Vec<TacticalCard> = deck.drain(..opening).collect();
    CombatantState {
        flagship_hull: config.flagship_hull,
        flagship_max_hull: config.flagship_hull,
        battlefield: Default::default(),
        hand,
        deck,
        energy: EnergyPool {
            current: config.starting_energy.min(config.max_energy),
            maximum: config.max_energy,
            regeneration: config.energy_regeneration,
        },
    }
}

/// 玩家一方：提交的舰队洗牌后抽起手牌。
pub fn player_combatant(fleet: &[OwnedCard], config: &TacticalConfig, rng: &mut CombatRng) -> CombatantState {
    let mut deck: Vec<TacticalCard> = fleet.iter().map(OwnedCard::to_tactical_card).collect();
    rng.shuffle(&mut deck);
    combatant(config, deck)
}

/// 对手一方：阵营卡池洗牌，取舰队规模的牌组；卡池为空返回 `None`。
pub fn opponent_combatant<C: ContentCatalog>(
    content: &C,
    faction_id: FactionId,
    config: &TacticalConfig,
    rng: &mut CombatRng,
) -> Option<CombatantState> {
    let pool = shuffled_pool(content, faction_id, rng);
    if pool.is_empty() {
        return None;
    }
    let deck = pool.iter().cycle().take(FLEET_SIZE).cloned().collect();
    Some(combatant(config, deck))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::content::{builtin, Catalog};

    #[test]
    fn same_seed_builds_same_fleet() {
        let first = generate_opponent_fleet(builtin(), FactionId::Ashfall, &mut CombatRng::seeded(42))
            .expect("ashfall pool should exist");
        let second = generate_opponent_fleet(builtin(), FactionId::Ashfall, &mut CombatRng::seeded(42))
            .expect("ashfall pool should exist");
        assert_eq!(first, second);
        assert_eq!(first.len(), FLEET_SIZE);
        let pool = builtin().opponent_pool(FactionId::Ashfall);
        assert!(first.iter().all(|card| pool.contains(&card.card_id)));
    }

    #[test]
    fn empty_pool_yields_none() {
        let empty = Catalog::default();
        assert!(generate_opponent_fleet(&empty, FactionId::Meridian, &mut CombatRng::seeded(1)).is_none());
        assert!(opponent_combatant(
            &empty,
            FactionId::Meridian,
            &TacticalConfig::default(),
            &mut CombatRng::seeded(1)
        )
        .is_none());
    }

    #[test]
    fn combatant_draws_opening_hand() {
        let config = TacticalConfig::default();
        let opponent = opponent_combatant(builtin(), FactionId::SunderedOath, &config, &mut CombatRng::seeded(9))
            .expect("pool should exist");
        assert_eq!(opponent.hand.len(), config.opening_hand);
        assert_eq!(opponent.deck.len(), FLEET_SIZE - config.opening_hand);
        assert_eq!(opponent.energy.current, config.starting_energy);
        assert_eq!(opponent.flagship_hull, config.flagship_hull);
    }
}
