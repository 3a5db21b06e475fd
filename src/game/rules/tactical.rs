use super::{ensure_phase, phase_changed, RuleEngine, RuleError};
use crate::ai::opponent;
use crate::game::content::ContentCatalog;
use crate::game::events::GameEvent;
use crate::game::state::{GamePhase, GameState, Side, TargetRef};
use crate::game::tactical::TacticalSim;

fn simulation(state: &GameState) -> Result<TacticalSim, RuleError> {
    ensure_phase(state, &[GamePhase::TacticalBattle])?;
    let battle = state
        .current_tactical_battle
        .as_ref()
        .ok_or(RuleError::NoActiveBattle)?;
    if battle.is_finished() {
        return Err(RuleError::BattleAlreadyResolved);
    }
    Ok(TacticalSim::new(battle.clone()))
}

/// 在状态副本上执行一次玩家动作，收集事件；战斗结束时附带进入战后阶段。
fn play<F>(state: &GameState, action: F) -> Result<Vec<GameEvent>, RuleError>
where
    F: FnOnce(&mut TacticalSim) -> Result<(), RuleError>,
{
    let mut sim = simulation(state)?;
    action(&mut sim)?;
    let finished = sim.is_finished();
    let mut events = sim.into_events();
    if finished {
        events.push(phase_changed(state, GamePhase::PostBattle));
    }
    Ok(events)
}

impl<C: ContentCatalog> RuleEngine<C> {
    pub(super) fn deploy_ship(
        &self,
        state: &GameState,
        card_id: &str,
        slot: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        play(state, |sim| sim.deploy(Side::Player, card_id, slot))
    }

    pub(super) fn move_ship(
        &self,
        state: &GameState,
        from_slot: usize,
        to_slot: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        play(state, |sim| sim.move_ship(Side::Player, from_slot, to_slot))
    }

    pub(super) fn attack(
        &self,
        state: &GameState,
        attacker_slot: usize,
        target: TargetRef,
    ) -> Result<Vec<GameEvent>, RuleError> {
        play(state, |sim| sim.attack(Side::Player, attacker_slot, target))
    }

    pub(super) fn activate_ability(
        &self,
        state: &GameState,
        slot: usize,
        ability_index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        play(state, |sim| sim.activate_ability(Side::Player, slot, ability_index))
    }

    /// 结束玩家回合后，对手的整个回合在同一次决策里完成。
    pub(super) fn end_turn(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        play(state, opponent::end_player_turn)
    }

    pub(super) fn retreat(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        play(state, |sim| sim.retreat(Side::Player))
    }
}
