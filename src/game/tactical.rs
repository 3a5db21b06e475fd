//! 回合制战术战斗。
//!
//! [`TacticalSim`] 在战斗状态的副本上逐步执行动作：每个动作先校验，再产生事件，
//! 事件立即通过 [`apply_tactical_event`] 折叠回副本，所以后续校验看到的就是回放后的状态。

use super::events::GameEvent;
use super::projection::apply_tactical_event;
use super::rules::RuleError;
use super::state::{
    ShipAbility, Side, TacticalBattleState, TacticalOutcome, TargetRef, VictoryCondition,
    BATTLEFIELD_SLOTS, MAX_HAND_SIZE,
};

/// 舰船互击伤害，至少为 1。
pub fn ship_damage(attack: i32, armor: i32) -> i32 {
    (attack - armor).max(1)
}

/// 旗舰被毁或舰队覆灭。双方同时满足时判平。
pub fn evaluate_victory(battle: &TacticalBattleState) -> Option<TacticalOutcome> {
    let decide = |player_lost: bool, opponent_lost: bool, condition| match (player_lost, opponent_lost) {
        (true, true) => Some(TacticalOutcome {
            winner: None,
            victory_condition: condition,
        }),
        (false, true) => Some(TacticalOutcome {
            winner: Some(Side::Player),
            victory_condition: condition,
        }),
        (true, false) => Some(TacticalOutcome {
            winner: Some(Side::Opponent),
            victory_condition: condition,
        }),
        (false, false) => None,
    };

    decide(
        battle.player.flagship_destroyed(),
        battle.opponent.flagship_destroyed(),
        VictoryCondition::FlagshipDestroyed,
    )
    .or_else(|| {
        decide(
            battle.player.is_eliminated(),
            battle.opponent.is_eliminated(),
            VictoryCondition::FleetEliminated,
        )
    })
}

/// 回合结束时检查回合上限：`turn_number + 1 >= 2 * round_limit` 时按旗舰剩余船体判定，
/// 相同再比较场上舰船船体总和，仍相同则平局。
pub fn evaluate_round_limit(battle: &TacticalBattleState) -> Option<TacticalOutcome> {
    if battle.is_finished() || battle.turn_number + 1 < battle.round_limit.saturating_mul(2) {
        return None;
    }

    let by_flagship = battle
        .player
        .flagship_hull
        .cmp(&battle.opponent.flagship_hull);
    let ordering = by_flagship.then_with(|| {
        battle
            .player
            .total_ship_hull()
            .cmp(&battle.opponent.total_ship_hull())
    });
    let winner = match ordering {
        std::cmp::Ordering::Greater => Some(Side::Player),
        std::cmp::Ordering::Less => Some(Side::Opponent),
        std::cmp::Ordering::Equal => None,
    };
    Some(TacticalOutcome {
        winner,
        victory_condition: VictoryCondition::Timeout,
    })
}

fn check_slot(slot: usize) -> Result<(), RuleError> {
    if slot < BATTLEFIELD_SLOTS {
        Ok(())
    } else {
        Err(RuleError::InvalidPosition { position: slot })
    }
}

#[derive(Debug, Clone)]
pub struct TacticalSim {
    battle: TacticalBattleState,
    events: Vec<GameEvent>,
}

impl TacticalSim {
    pub fn new(battle: TacticalBattleState) -> Self {
        Self {
            battle,
            events: Vec::new(),
        }
    }

    pub fn battle(&self) -> &TacticalBattleState {
        &self.battle
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.battle.is_finished()
    }

    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }

    fn emit(&mut self, event: GameEvent) {
        apply_tactical_event(&mut self.battle, &event);
        self.events.push(event);
    }

    fn ensure_turn(&self, side: Side) -> Result<(), RuleError> {
        if self.battle.is_finished() {
            return Err(RuleError::BattleAlreadyResolved);
        }
        if self.battle.active_player != side {
            return Err(RuleError::NotPlayerTurn);
        }
        Ok(())
    }

    fn ensure_energy(&self, side: Side, required: u32) -> Result<(), RuleError> {
        let available = self.battle.combatant(side).energy.current;
        if available < required {
            return Err(RuleError::InsufficientEnergy {
                required,
                available,
            });
        }
        Ok(())
    }

    pub fn deploy(&mut self, side: Side, card_id: &str, slot: usize) -> Result<(), RuleError> {
        self.ensure_turn(side)?;
        check_slot(slot)?;
        let combatant = self.battle.combatant(side);
        let index = combatant
            .hand_index(card_id)
            .ok_or_else(|| RuleError::CardNotInHand {
                card_id: card_id.to_string(),
            })?;
        if combatant.ship(slot).is_some() {
            return Err(RuleError::SlotOccupied { slot });
        }
        let card = combatant.hand[index].clone();
        self.ensure_energy(side, card.energy_cost)?;

        let energy_spent = card.energy_cost;
        self.emit(GameEvent::ShipDeployed {
            side,
            card,
            slot,
            energy_spent,
        });
        Ok(())
    }

    pub fn move_ship(&mut self, side: Side, from_slot: usize, to_slot: usize) -> Result<(), RuleError> {
        self.ensure_turn(side)?;
        check_slot(from_slot)?;
        check_slot(to_slot)?;
        let combatant = self.battle.combatant(side);
        let ship = combatant
            .ship(from_slot)
            .ok_or(RuleError::EmptySlot { slot: from_slot })?;
        if ship.exhausted {
            return Err(RuleError::ShipExhausted { slot: from_slot });
        }
        if combatant.ship(to_slot).is_some() {
            return Err(RuleError::SlotOccupied { slot: to_slot });
        }
        let energy_spent = self.battle.move_cost;
        self.ensure_energy(side, energy_spent)?;

        self.emit(GameEvent::ShipMoved {
            side,
            from_slot,
            to_slot,
            energy_spent,
        });
        Ok(())
    }

    pub fn attack(&mut self, side: Side, attacker_slot: usize, target: TargetRef) -> Result<(), RuleError> {
        self.ensure_turn(side)?;
        check_slot(attacker_slot)?;
        let attacker = self
            .battle
            .combatant(side)
            .ship(attacker_slot)
            .ok_or(RuleError::EmptySlot {
                slot: attacker_slot,
            })?;
        if attacker.exhausted {
            return Err(RuleError::ShipExhausted {
                slot: attacker_slot,
            });
        }
        if attacker.attack <= 0 {
            return Err(RuleError::ZeroAttackShip {
                slot: attacker_slot,
            });
        }
        let attack = attacker.attack;

        let enemy_side = side.opponent();
        let enemy = self.battle.combatant(enemy_side);
        let amount = match target {
            TargetRef::Ship { slot } => {
                check_slot(slot)?;
                let defender = enemy.ship(slot).ok_or(RuleError::EmptySlot { slot })?;
                ship_damage(attack, defender.armor)
            }
            TargetRef::Flagship => {
                if enemy.has_ships() {
                    return Err(RuleError::FlagshipScreened);
                }
                attack.max(1)
            }
        };

        self.emit(GameEvent::ShipAttacked {
            side,
            attacker_slot,
            target,
        });
        self.apply_damage(enemy_side, target, amount);
        Ok(())
    }

    pub fn activate_ability(&mut self, side: Side, slot: usize, ability_index: usize) -> Result<(), RuleError> {
        self.ensure_turn(side)?;
        check_slot(slot)?;
        let ship = self
            .battle
            .combatant(side)
            .ship(slot)
            .ok_or(RuleError::EmptySlot { slot })?;
        if ship.ability_used {
            return Err(RuleError::AbilityUsed { slot });
        }
        let ability = *ship
            .abilities
            .get(ability_index)
            .ok_or(RuleError::UnknownAbility {
                slot,
                ability_index,
            })?;
        let energy_spent = ability.energy_cost();
        self.ensure_energy(side, energy_spent)?;

        self.emit(GameEvent::AbilityActivated {
            side,
            slot,
            ability,
            energy_spent,
        });

        match ability {
            ShipAbility::Repair { amount, .. } => {
                let combatant = self.battle.combatant(side);
                let remaining_hull = (combatant.flagship_hull + amount.max(0))
                    .min(combatant.flagship_max_hull);
                let repaired = remaining_hull - combatant.flagship_hull;
                if repaired > 0 {
                    self.emit(GameEvent::HullRepaired {
                        side,
                        target: TargetRef::Flagship,
                        amount: repaired,
                        remaining_hull,
                    });
                }
            }
            ShipAbility::Barrage { damage, .. } => {
                let enemy_side = side.opponent();
                let slots: Vec<usize> = self
                    .battle
                    .combatant(enemy_side)
                    .ships()
                    .map(|(slot, _)| slot)
                    .collect();
                for target_slot in slots {
                    self.apply_damage(enemy_side, TargetRef::Ship { slot: target_slot }, damage.max(1));
                    if self.is_finished() {
                        break;
                    }
                }
            }
            ShipAbility::Overcharge { energy, .. } => {
                let pool = self.battle.combatant(side).energy;
                let amount = energy.min(pool.maximum.saturating_sub(pool.current));
                if amount > 0 {
                    self.emit(GameEvent::EnergyGained { side, amount });
                }
            }
        }
        Ok(())
    }

    /// 伤害结算，之后立即检查胜负。
    fn apply_damage(&mut self, side: Side, target: TargetRef, amount: i32) {
        let combatant = self.battle.combatant(side);
        let current = match target {
            TargetRef::Flagship => combatant.flagship_hull,
            TargetRef::Ship { slot } => match combatant.ship(slot) {
                Some(ship) => ship.hull,
                None => return,
            },
        };
        let remaining_hull = current - amount;
        self.emit(GameEvent::DamageApplied {
            side,
            target,
            amount,
            remaining_hull,
        });

        if let TargetRef::Ship { slot } = target {
            if remaining_hull <= 0 {
                let card_id = self
                    .battle
                    .combatant(side)
                    .ship(slot)
                    .map(|ship| ship.card_id.clone())
                    .unwrap_or_default();
                self.emit(GameEvent::ShipDestroyed {
                    side,
                    slot,
                    card_id,
                });
            }
        }

        if let Some(outcome) = evaluate_victory(&self.battle) {
            self.finish(outcome);
        }
    }

    /// 新回合：回合数加一，恢复能量、刷新本方舰船、手牌未满时抽一张。
    pub fn start_turn(&mut self, side: Side) {
        if self.is_finished() {
            return;
        }
        let combatant = self.battle.combatant(side);
        let energy_regenerated = combatant.energy.pending_regeneration();
        let drawn_card = if combatant.hand.len() < MAX_HAND_SIZE {
            combatant.deck.first().cloned()
        } else {
            None
        };
        let turn_number = self.battle.turn_number + 1;
        self.emit(GameEvent::TurnStarted {
            side,
            turn_number,
            energy_regenerated,
            drawn_card,
        });
    }

    pub fn end_turn(&mut self, side: Side) -> Result<(), RuleError> {
        self.ensure_turn(side)?;
        self.emit(GameEvent::TurnEnded {
            side,
            turn_number: self.battle.turn_number,
        });
        if let Some(outcome) = evaluate_round_limit(&self.battle) {
            self.finish(outcome);
        }
        Ok(())
    }

    pub fn retreat(&mut self, side: Side) -> Result<(), RuleError> {
        if self.is_finished() {
            return Err(RuleError::BattleAlreadyResolved);
        }
        self.finish(TacticalOutcome {
            winner: Some(side.opponent()),
            victory_condition: VictoryCondition::Retreat,
        });
        Ok(())
    }

    fn finish(&mut self, outcome: TacticalOutcome) {
        log::debug!(
            "tactical battle {} ended: {:?} by {:?}",
            self.battle.battle_id,
            outcome.winner,
            outcome.victory_condition
        );
        self.emit(GameEvent::TacticalBattleEnded {
            battle_id: self.battle.battle_id.clone(),
            winner: outcome.winner,
            victory_condition: outcome.victory_condition,
            player_flagship_hull: self.battle.player.flagship_hull,
            opponent_flagship_hull: self.battle.opponent.flagship_hull,
        });
    }
}
