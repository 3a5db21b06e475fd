//! 对手在战术战斗中的规则式决策：先部署，再攻击，最后结束回合。

use serde::{Deserialize, Serialize};

use crate::game::rules::RuleError;
use crate::game::state::{CardId, CombatantState, Side, TacticalBattleState, TargetRef};
use crate::game::tactical::TacticalSim;

/// 部署位置的偏好顺序：中间优先，向两侧展开。
pub const DEPLOY_PREFERENCE: [usize; 5] = [2, 1, 3, 0, 4];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpponentAction {
    Deploy { card_id: CardId, slot: usize },
    Attack { attacker_slot: usize, target: TargetRef },
    EndTurn,
}

fn preferred_empty_slot(combatant: &CombatantState) -> Option<usize> {
    DEPLOY_PREFERENCE
        .iter()
        .copied()
        .find(|slot| combatant.ship(*slot).is_none())
}

/// 能负担得起的最贵手牌；费用相同时取手牌中靠前的一张。
fn costliest_affordable(combatant: &CombatantState) -> Option<CardId> {
    let budget = combatant.energy.current;
    combatant
        .hand
        .iter()
        .filter(|card| card.energy_cost <= budget)
        .fold(None, |best: Option<&crate::game::state::TacticalCard>, card| match best {
            Some(current) if current.energy_cost >= card.energy_cost => Some(current),
            _ => Some(card),
        })
        .map(|card| card.card_id.clone())
}

/// 目标优先级：正对面的舰船 > 船体最低的舰船（同值取低位）> 旗舰。
pub fn choose_target(attacker_slot: usize, enemy: &CombatantState) -> TargetRef {
    if enemy.ship(attacker_slot).is_some() {
        return TargetRef::Ship {
            slot: attacker_slot,
        };
    }
    enemy
        .ships()
        .min_by_key(|(slot, ship)| (ship.hull, *slot))
        .map(|(slot, _)| TargetRef::Ship { slot })
        .unwrap_or(TargetRef::Flagship)
}

/// 按当前局面给出对手的下一个动作。
pub fn next_action(battle: &TacticalBattleState) -> OpponentAction {
    let own = &battle.opponent;
    if let (Some(card_id), Some(slot)) = (costliest_affordable(own), preferred_empty_slot(own)) {
        return OpponentAction::Deploy { card_id, slot };
    }

    own.ships()
        .find(|(_, ship)| !ship.exhausted && ship.attack > 0)
        .map(|(attacker_slot, _)| OpponentAction::Attack {
            attacker_slot,
            target: choose_target(attacker_slot, &battle.player),
        })
        .unwrap_or(OpponentAction::EndTurn)
}

/// 执行完整的对手回合。任何一次攻击分出胜负后立即返回；
/// 否则结束回合、检查回合上限，并开始玩家的下一回合。
pub fn take_turn(sim: &mut TacticalSim) -> Result<(), RuleError> {
    sim.start_turn(Side::Opponent);

    loop {
        if sim.is_finished() {
            return Ok(());
        }
        match next_action(sim.battle()) {
            OpponentAction::Deploy { card_id, slot } => {
                sim.deploy(Side::Opponent, &card_id, slot)?;
            }
            OpponentAction::Attack {
                attacker_slot,
                target,
            } => {
                sim.attack(Side::Opponent, attacker_slot, target)?;
            }
            OpponentAction::EndTurn => break,
        }
    }

    sim.end_turn(Side::Opponent)?;
    if !sim.is_finished() {
        sim.start_turn(Side::Player);
    }
    Ok(())
}

/// 玩家结束回合，随后对手在同一步里走完自己的回合。
pub fn end_player_turn(sim: &mut TacticalSim) -> Result<(), RuleError> {
    sim.end_turn(Side::Player)?;
    if !sim.is_finished() {
        take_turn(sim)?;
    }
    Ok(())
}
