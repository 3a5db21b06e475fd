//! 玩家意图。命令不落盘，只有事件才会改变状态。

use serde::{Deserialize, Serialize};

use super::reputation::FactionId;
use super::state::{CardId, ChoiceId, DilemmaId, QuestId, TargetRef};

/// 无字段的命令也写成结构体变体，这样 `data` 里的多余字段会被忽略。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameCommand {
    StartGame {
        player_id: String,
    },
    AcceptQuest {
        quest_id: QuestId,
    },
    MakeChoice {
        choice_id: ChoiceId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dilemma_id: Option<DilemmaId>,
    },
    FormAlliance {
        faction_id: FactionId,
    },
    FinalizeAlliances {},
    DeclineAllAlliances {},
    LeanTowardFaction {
        faction_id: FactionId,
    },
    RefuseToLean {},
    AcceptCompromise {},
    SelectCard {
        card_id: CardId,
    },
    DeselectCard {
        card_id: CardId,
    },
    CommitFleet {
        card_ids: Vec<CardId>,
    },
    SetCardPosition {
        card_id: CardId,
        position: usize,
    },
    LockOrders {},
    DeployShip {
        card_id: CardId,
        slot: usize,
    },
    MoveShip {
        from_slot: usize,
        to_slot: usize,
    },
    Attack {
        attacker_slot: usize,
        target: TargetRef,
    },
    ActivateAbility {
        slot: usize,
        #[serde(default)]
        ability_index: usize,
    },
    EndTurn {},
    Retreat {},
    AcknowledgeOutcome {},
    AbandonQuest {},
    Continue {},
}

impl GameCommand {
    pub fn command_type(&self) -> &'static str {
        match self {
            GameCommand::StartGame { .. } => "START_GAME",
            GameCommand::AcceptQuest { .. } => "ACCEPT_QUEST",
            GameCommand::MakeChoice { .. } => "MAKE_CHOICE",
            GameCommand::FormAlliance { .. } => "FORM_ALLIANCE",
            GameCommand::FinalizeAlliances {} => "FINALIZE_ALLIANCES",
            GameCommand::DeclineAllAlliances {} => "DECLINE_ALL_ALLIANCES",
            GameCommand::LeanTowardFaction { .. } => "LEAN_TOWARD_FACTION",
            GameCommand::RefuseToLean {} => "REFUSE_TO_LEAN",
            GameCommand::AcceptCompromise {} => "ACCEPT_COMPROMISE",
            GameCommand::SelectCard { .. } => "SELECT_CARD",
            GameCommand::DeselectCard { .. } => "DESELECT_CARD",
            GameCommand::CommitFleet { .. } => "COMMIT_FLEET",
            GameCommand::SetCardPosition { .. } => "SET_CARD_POSITION",
            GameCommand::LockOrders {} => "LOCK_ORDERS",
            GameCommand::DeployShip { .. } => "DEPLOY_SHIP",
            GameCommand::MoveShip { .. } => "MOVE_SHIP",
            GameCommand::Attack { .. } => "ATTACK",
            GameCommand::ActivateAbility { .. } => "ACTIVATE_ABILITY",
            GameCommand::EndTurn {} => "END_TURN",
            GameCommand::Retreat {} => "RETREAT",
            GameCommand::AcknowledgeOutcome {} => "ACKNOWLEDGE_OUTCOME",
            GameCommand::AbandonQuest {} => "ABANDON_QUEST",
            GameCommand::Continue {} => "CONTINUE",
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_ui_payload() {
        let command = GameCommand::from_json(
            r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#,
        )
        .expect("command should parse");
        assert_eq!(
            command,
            GameCommand::AcceptQuest {
                quest_id: "quest_salvage_claim".into()
            }
        );
        assert_eq!(command.command_type(), "ACCEPT_QUEST");
    }

    #[test]
    fn extra_fields_on_empty_commands_are_ignored() {
        let command: GameCommand = serde_json::from_value(json!({
            "type": "LOCK_ORDERS",
            "data": { "battle_id": "ignored", "positions": [1, 2] }
        }))
        .expect("extra fields should be ignored");
        assert_eq!(command, GameCommand::LockOrders {});

        let command: GameCommand = serde_json::from_value(json!({
            "type": "ACKNOWLEDGE_OUTCOME",
            "data": { "outcome": "victory" }
        }))
        .expect("extra fields should be ignored");
        assert_eq!(command.command_type(), "ACKNOWLEDGE_OUTCOME");
    }

    #[test]
    fn optional_fields_default() {
        let command: GameCommand = serde_json::from_value(json!({
            "type": "MAKE_CHOICE",
            "data": { "choice_id": "choice_hail_first" }
        }))
        .expect("dilemma id is optional");
        assert_eq!(
            command,
            GameCommand::MakeChoice {
                choice_id: "choice_hail_first".into(),
                dilemma_id: None
            }
        );

        let command: GameCommand = serde_json::from_value(json!({
            "type": "ATTACK",
            "data": { "attacker_slot": 2, "target": { "kind": "flagship" } }
        }))
        .expect("attack should parse");
        assert_eq!(
            command,
            GameCommand::Attack {
                attacker_slot: 2,
                target: TargetRef::Flagship
            }
        );
    }
}
