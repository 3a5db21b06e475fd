//! 任务、抉择与卡牌内容的查询接口，以及内置内容表。
//!
//! 规则引擎只通过 [`ContentCatalog`] 读取内容；查不到时由调用方转换为命令拒绝。

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::reputation::FactionId;
use super::state::{CardId, CardSource, ChoiceId, DilemmaId, OwnedCard, QuestId, ShipAbility, TacticalCard};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<FactionId>,
    pub attack: i32,
    pub armor: i32,
    pub agility: i32,
    pub hull: i32,
    pub energy_cost: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<ShipAbility>,
}

impl CardDefinition {
    pub fn to_owned_card(&self, source: CardSource) -> OwnedCard {
        OwnedCard {
            id: self.id.clone(),
            name: self.name.clone(),
            attack: self.attack,
            armor: self.armor,
            agility: self.agility,
            hull: self.hull,
            energy_cost: self.energy_cost,
            abilities: self.abilities.clone(),
            source,
            is_locked: false,
        }
    }

    pub fn to_tactical_card(&self) -> TacticalCard {
        self.to_owned_card(CardSource::Unlock).to_tactical_card()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BattleMode {
    #[default]
    Classic,
    Tactical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReputationRequirement {
    pub faction_id: FactionId,
    pub minimum: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestDefinition {
    pub id: QuestId,
    pub title: String,
    pub faction_id: FactionId,
    pub initial_bounty: u32,
    #[serde(default)]
    pub initial_card_ids: Vec<CardId>,
    pub dilemma_ids: Vec<DilemmaId>,
    #[serde(default)]
    pub battle_mode: BattleMode,
    pub opponent_faction: FactionId,
    #[serde(default)]
    pub mediation_parties: Vec<FactionId>,
    pub victory_bounty: u32,
    pub defeat_penalty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_reputation: Option<ReputationRequirement>,
}

impl QuestDefinition {
    pub fn first_dilemma_id(&self) -> Option<&DilemmaId> {
        self.dilemma_ids.first()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReputationDelta {
    pub faction_id: FactionId,
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlagChange {
    pub flag: String,
    pub value: bool,
}

/// 抉择之后剧情如何推进。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChoiceTrigger {
    /// `None` 时按任务顺序取下一个抉择。
    NextDilemma {
        #[serde(default)]
        dilemma_id: Option<DilemmaId>,
    },
    Alliance,
    Mediation,
    CompleteQuest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceDefinition {
    pub id: ChoiceId,
    pub label: String,
    #[serde(default)]
    pub reputation: Vec<ReputationDelta>,
    #[serde(default)]
    pub cards_gained: Vec<CardId>,
    #[serde(default)]
    pub cards_lost: Vec<CardId>,
    #[serde(default)]
    pub bounty_modifier: i32,
    #[serde(default)]
    pub flags: Vec<FlagChange>,
    pub trigger: ChoiceTrigger,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DilemmaDefinition {
    pub id: DilemmaId,
    pub quest_id: QuestId,
    pub prompt: String,
    pub choices: Vec<ChoiceDefinition>,
}

impl DilemmaDefinition {
    pub fn choice(&self, choice_id: &str) -> Option<&ChoiceDefinition> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }
}

/// 内容查询接口：纯函数、同步，查不到返回 `None`。
pub trait ContentCatalog {
    fn get_quest_by_id(&self, quest_id: &str) -> Option<&QuestDefinition>;
    fn get_dilemma_by_id(&self, dilemma_id: &str) -> Option<&DilemmaDefinition>;
    fn get_card_by_id(&self, card_id: &str) -> Option<&CardDefinition>;
    fn get_alliance_card_ids(&self, faction_id: FactionId) -> Vec<CardId>;
    fn get_next_dilemma(&self, quest_id: &str, dilemma_id: &str) -> Option<&DilemmaDefinition>;
    fn quest_ids(&self) -> Vec<QuestId>;
    fn starter_card_ids(&self) -> Vec<CardId>;
    fn opponent_pool(&self, faction_id: FactionId) -> Vec<CardId>;
}

impl<T: ContentCatalog + ?Sized> ContentCatalog for &T {
    fn get_quest_by_id(&self, quest_id: &str) -> Option<&QuestDefinition> {
        (**self).get_quest_by_id(quest_id)
    }

    fn get_dilemma_by_id(&self, dilemma_id: &str) -> Option<&DilemmaDefinition> {
        (**self).get_dilemma_by_id(dilemma_id)
    }

    fn get_card_by_id(&self, card_id: &str) -> Option<&CardDefinition> {
        (**self).get_card_by_id(card_id)
    }

    fn get_alliance_card_ids(&self, faction_id: FactionId) -> Vec<CardId> {
        (**self).get_alliance_card_ids(faction_id)
    }

    fn get_next_dilemma(&self, quest_id: &str, dilemma_id: &str) -> Option<&DilemmaDefinition> {
        (**self).get_next_dilemma(quest_id, dilemma_id)
    }

    fn quest_ids(&self) -> Vec<QuestId> {
        (**self).quest_ids()
    }

    fn starter_card_ids(&self) -> Vec<CardId> {
        (**self).starter_card_ids()
    }

    fn opponent_pool(&self, faction_id: FactionId) -> Vec<CardId> {
        (**self).opponent_pool(faction_id)
    }
}

/// 可序列化的内容表，宿主可以用 JSON 提供自己的版本。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Catalog {
    pub quests: Vec<QuestDefinition>,
    pub dilemmas: Vec<DilemmaDefinition>,
    pub cards: Vec<CardDefinition>,
    pub starter_cards: Vec<CardId>,
    #[serde(default)]
    pub alliance_cards: BTreeMap<FactionId, Vec<CardId>>,
    #[serde(default)]
    pub opponent_pools: BTreeMap<FactionId, Vec<CardId>>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ContentCatalog for Catalog {
    fn get_quest_by_id(&self, quest_id: &str) -> Option<&QuestDefinition> {
        self.quests.iter().find(|quest| quest.id == quest_id)
    }

    fn get_dilemma_by_id(&self, dilemma_id: &str) -> Option<&DilemmaDefinition> {
        self.dilemmas
            .iter()
            .find(|dilemma| dilemma.id == dilemma_id)
    }

    fn get_card_by_id(&self, card_id: &str) -> Option<&CardDefinition> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    fn get_alliance_card_ids(&self, faction_id: FactionId) -> Vec<CardId> {
        self.alliance_cards
            .get(&faction_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get_next_dilemma(&self, quest_id: &str, dilemma_id: &str) -> Option<&DilemmaDefinition> {
        let quest = self.get_quest_by_id(quest_id)?;
        let index = quest.dilemma_ids.iter().position(|id| id == dilemma_id)?;
        let next_id = quest.dilemma_ids.get(index + 1)?;
        self.get_dilemma_by_id(next_id)
    }

    fn quest_ids(&self) -> Vec<QuestId> {
        self.quests.iter().map(|quest| quest.id.clone()).collect()
    }

    fn starter_card_ids(&self) -> Vec<CardId> {
        self.starter_cards.clone()
    }

    fn opponent_pool(&self, faction_id: FactionId) -> Vec<CardId> {
        self.opponent_pools
            .get(&faction_id)
            .cloned()
            .unwrap_or_default()
    }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(builtin_catalog);

/// 游戏自带的内容表。
pub fn builtin() -> &'static Catalog {
    &BUILTIN
}

fn card(
    id: &str,
    name: &str,
    faction_id: Option<FactionId>,
    stats: [i32; 4],
    energy_cost: u32,
    abilities: Vec<ShipAbility>,
) -> CardDefinition {
    let [attack, armor, agility, hull] = stats;
    CardDefinition {
        id: id.to_string(),
        name: name.to_string(),
        faction_id,
        attack,
        armor,
        agility,
        hull,
        energy_cost,
        abilities,
    }
}

fn rep(faction_id: FactionId, delta: i32) -> ReputationDelta {
    ReputationDelta { faction_id, delta }
}

fn flag(name: &str) -> FlagChange {
    FlagChange {
        flag: name.to_string(),
        value: true,
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn choice(id: &str, label: &str, trigger: ChoiceTrigger) -> ChoiceDefinition {
    ChoiceDefinition {
        id: id.to_string(),
        label: label.to_string(),
        reputation: Vec::new(),
        cards_gained: Vec::new(),
        cards_lost: Vec::new(),
        bounty_modifier: 0,
        flags: Vec::new(),
        trigger,
    }
}

fn next() -> ChoiceTrigger {
    ChoiceTrigger::NextDilemma { dilemma_id: None }
}

fn builtin_cards() -> Vec<CardDefinition> {
    use FactionId::*;
    let repair = |amount, energy_cost| ShipAbility::Repair {
        amount,
        energy_cost,
    };
    let barrage = |damage, energy_cost| ShipAbility::Barrage {
        damage,
        energy_cost,
    };
    let overcharge = |energy, energy_cost| ShipAbility::Overcharge {
        energy,
        energy_cost,
    };

    vec![
        // stats: attack, armor, agility, hull
        card("starter_scout", "Pathfinder Scout", None, [2, 1, 6, 4], 1, vec![]),
        card("starter_freighter", "Tramp Freighter", None, [1, 4, 2, 8], 2, vec![repair(3, 1)]),
        card("starter_corvette", "Dawn Corvette", None, [4, 2, 4, 6], 2, vec![]),
        card("salvage_tug", "Salvage Tug", None, [2, 3, 3, 7], 2, vec![]),
        card("derelict_lancer", "Derelict Lancer", None, [5, 1, 3, 5], 3, vec![]),
        card("sanctuary_escort", "Sanctuary Escort", Some(VoidWardens), [3, 3, 3, 6], 2, vec![]),
        card("tribunal_interceptor", "Tribunal Interceptor", Some(Ironveil), [4, 1, 7, 4], 2, vec![]),
        card("ironveil_bulwark", "Ironveil Bulwark", Some(Ironveil), [2, 6, 1, 12], 4, vec![repair(4, 2)]),
        card("ironveil_warden", "Ironveil Warden", Some(Ironveil), [3, 4, 3, 9], 3, vec![]),
        card("ironveil_enforcer", "Ironveil Enforcer", Some(Ironveil), [3, 4, 2, 9], 3, vec![]),
        card("ironveil_sentinel", "Ironveil Sentinel", Some(Ironveil), [2, 5, 2, 10], 3, vec![]),
        card("ironveil_picket", "Ironveil Picket", Some(Ironveil), [2, 3, 4, 6], 2, vec![]),
        card("ashfall_marauder", "Ashfall Marauder", Some(Ashfall), [5, 1, 6, 5], 2, vec![]),
        card("ashfall_firebrand", "Ashfall Firebrand", Some(Ashfall), [6, 2, 4, 6], 3, vec![barrage(2, 3)]),
        card("ashfall_raider", "Ashfall Raider", Some(Ashfall), [4, 1, 6, 5], 2, vec![]),
        card("ashfall_skiff", "Ashfall Skiff", Some(Ashfall), [3, 1, 7, 4], 1, vec![]),
        card("ashfall_brute", "Ashfall Brute", Some(Ashfall), [5, 3, 2, 8], 3, vec![]),
        card("meridian_lancer", "Meridian Lancer", Some(Meridian), [4, 3, 5, 7], 3, vec![]),
        card("meridian_courier", "Meridian Courier", Some(Meridian), [2, 2, 8, 5], 1, vec![overcharge(2, 0)]),
        card("meridian_patrol", "Meridian Patrol", Some(Meridian), [3, 3, 4, 7], 2, vec![]),
        card("meridian_cutter", "Meridian Cutter", Some(Meridian), [3, 2, 6, 5], 2, vec![]),
        card("meridian_frigate", "Meridian Frigate", Some(Meridian), [4, 4, 3, 9], 3, vec![]),
        card("void_wardens_specter", "Warden Specter", Some(VoidWardens), [4, 2, 8, 5], 3, vec![]),
        card("void_wardens_obelisk", "Warden Obelisk", Some(VoidWardens), [3, 5, 2, 10], 4, vec![barrage(3, 4)]),
        card("void_wardens_shade", "Warden Shade", Some(VoidWardens), [3, 2, 7, 5], 2, vec![]),
        card("void_wardens_watcher", "Warden Watcher", Some(VoidWardens), [2, 4, 4, 7], 2, vec![]),
        card("void_wardens_monolith", "Warden Monolith", Some(VoidWardens), [4, 5, 1, 11], 4, vec![]),
        card("sundered_oath_reaver", "Oathbreaker Reaver", Some(SunderedOath), [6, 1, 5, 6], 3, vec![]),
        card("sundered_oath_hulk", "Oathbreaker Hulk", Some(SunderedOath), [3, 5, 1, 11], 4, vec![repair(3, 2)]),
        card("sundered_oath_cutthroat", "Oathbreaker Cutthroat", Some(SunderedOath), [4, 1, 7, 4], 2, vec![]),
        card("sundered_oath_breaker", "Oathbreaker Breaker", Some(SunderedOath), [5, 2, 3, 7], 3, vec![]),
        card("sundered_oath_scrapper", "Oathbreaker Scrapper", Some(SunderedOath), [3, 3, 3, 6], 2, vec![]),
    ]
}

fn builtin_quests() -> Vec<QuestDefinition> {
    vec![
        QuestDefinition {
            id: "quest_salvage_claim".into(),
            title: "The Salvage Claim".into(),
            faction_id: FactionId::Meridian,
            initial_bounty: 500,
            initial_card_ids: Vec::new(),
            dilemma_ids: ids(&["dilemma_salvage_arrival", "dilemma_salvage_standoff"]),
            battle_mode: BattleMode::Classic,
            opponent_faction: FactionId::Ashfall,
            mediation_parties: vec![FactionId::Meridian, FactionId::Ashfall],
            victory_bounty: 750,
            defeat_penalty: 200,
            required_reputation: None,
        },
        QuestDefinition {
            id: "quest_sanctuary_run".into(),
            title: "Sanctuary Run".into(),
            faction_id: FactionId::VoidWardens,
            initial_bounty: 400,
            initial_card_ids: ids(&["sanctuary_escort"]),
            dilemma_ids: ids(&["dilemma_sanctuary_blockade"]),
            battle_mode: BattleMode::Tactical,
            opponent_faction: FactionId::SunderedOath,
            mediation_parties: vec![FactionId::VoidWardens, FactionId::SunderedOath],
            victory_bounty: 900,
            defeat_penalty: 250,
            required_reputation: None,
        },
        QuestDefinition {
            id: "quest_iron_tribunal".into(),
            title: "The Iron Tribunal".into(),
            faction_id: FactionId::Ironveil,
            initial_bounty: 650,
            initial_card_ids: ids(&["tribunal_interceptor"]),
            dilemma_ids: ids(&["dilemma_tribunal_summons", "dilemma_tribunal_verdict"]),
            battle_mode: BattleMode::Classic,
            opponent_faction: FactionId::Ironveil,
            mediation_parties: vec![FactionId::Ironveil, FactionId::Ashfall],
            victory_bounty: 1000,
            defeat_penalty: 300,
            required_reputation: Some(ReputationRequirement {
                faction_id: FactionId::Ironveil,
                minimum: -24,
            }),
        },
    ]
}

fn builtin_dilemmas() -> Vec<DilemmaDefinition> {
    use FactionId::*;

    let mut hail_first = choice("choice_hail_first", "Hail the claimants before boarding", next());
    hail_first.reputation = vec![rep(Meridian, 5)];

    let mut board_derelict = choice("choice_board_derelict", "Board the derelict at once", next());
    board_derelict.reputation = vec![rep(Meridian, -5), rep(Ashfall, 5)];
    board_derelict.cards_gained = ids(&["salvage_tug", "derelict_lancer"]);
    board_derelict.bounty_modifier = 100;
    board_derelict.flags = vec![flag("boarded_derelict")];

    let call_allies = choice("choice_call_allies", "Call for allies", ChoiceTrigger::Alliance);

    let mut propose_talks = choice("choice_propose_talks", "Propose talks", ChoiceTrigger::Mediation);
    propose_talks.reputation = vec![rep(Meridian, 5), rep(Ashfall, 5)];

    let mut cede_claim = choice("choice_cede_claim", "Cede the claim", ChoiceTrigger::CompleteQuest);
    cede_claim.reputation = vec![rep(Meridian, -10), rep(Ashfall, 10)];
    cede_claim.bounty_modifier = -250;
    cede_claim.flags = vec![flag("ceded_salvage")];

    let mut run_blockade = choice("choice_run_blockade", "Run the blockade", ChoiceTrigger::Alliance);
    run_blockade.reputation = vec![rep(VoidWardens, 10), rep(SunderedOath, -10)];

    let negotiate_passage = choice(
        "choice_negotiate_passage",
        "Negotiate passage",
        ChoiceTrigger::Mediation,
    );

    let mut turn_back = choice("choice_turn_back", "Turn back", ChoiceTrigger::CompleteQuest);
    turn_back.reputation = vec![rep(VoidWardens, -15)];

    let mut answer_summons = choice("choice_answer_summons", "Answer the summons", next());
    answer_summons.reputation = vec![rep(Ironveil, 10)];

    let mut surrender_ship = choice("choice_surrender_ship", "Surrender the freighter", next());
    surrender_ship.reputation = vec![rep(Ironveil, 15)];
    surrender_ship.cards_lost = ids(&["starter_freighter"]);
    surrender_ship.flags = vec![flag("surrendered_freighter")];

    let mut ignore_summons = choice("choice_ignore_summons", "Ignore the summons", ChoiceTrigger::Alliance);
    ignore_summons.reputation = vec![rep(Ironveil, -20), rep(SunderedOath, 5)];

    let mut accept_verdict = choice(
        "choice_accept_verdict",
        "Accept the verdict",
        ChoiceTrigger::CompleteQuest,
    );
    accept_verdict.reputation = vec![rep(Ironveil, 5)];
    accept_verdict.bounty_modifier = -150;

    let mut contest_verdict = choice("choice_contest_verdict", "Contest the verdict", ChoiceTrigger::Alliance);
    contest_verdict.reputation = vec![rep(Ironveil, -10)];

    let demand_arbitration = choice(
        "choice_demand_arbitration",
        "Demand arbitration",
        ChoiceTrigger::Mediation,
    );

    vec![
        DilemmaDefinition {
            id: "dilemma_salvage_arrival".into(),
            quest_id: "quest_salvage_claim".into(),
            prompt: "A drifting hauler, two claimants on comms.".into(),
            choices: vec![hail_first, board_derelict],
        },
        DilemmaDefinition {
            id: "dilemma_salvage_standoff".into(),
            quest_id: "quest_salvage_claim".into(),
            prompt: "Ashfall raiders arrive to contest the claim.".into(),
            choices: vec![call_allies, propose_talks, cede_claim],
        },
        DilemmaDefinition {
            id: "dilemma_sanctuary_blockade".into(),
            quest_id: "quest_sanctuary_run".into(),
            prompt: "An oathbreaker picket bars the sanctuary lane.".into(),
            choices: vec![run_blockade, negotiate_passage, turn_back],
        },
        DilemmaDefinition {
            id: "dilemma_tribunal_summons".into(),
            quest_id: "quest_iron_tribunal".into(),
            prompt: "The Ironveil tribunal summons you to answer for old debts.".into(),
            choices: vec![answer_summons, surrender_ship, ignore_summons],
        },
        DilemmaDefinition {
            id: "dilemma_tribunal_verdict".into(),
            quest_id: "quest_iron_tribunal".into(),
            prompt: "The tribunal hands down its verdict.".into(),
            choices: vec![accept_verdict, contest_verdict, demand_arbitration],
        },
    ]
}

fn builtin_catalog() -> Catalog {
    use FactionId::*;

    let alliance_cards = BTreeMap::from([
        (Ironveil, ids(&["ironveil_bulwark", "ironveil_warden"])),
        (Ashfall, ids(&["ashfall_marauder", "ashfall_firebrand"])),
        (Meridian, ids(&["meridian_lancer", "meridian_courier"])),
        (VoidWardens, ids(&["void_wardens_specter", "void_wardens_obelisk"])),
        (SunderedOath, ids(&["sundered_oath_reaver", "sundered_oath_hulk"])),
    ]);

    let opponent_pools = BTreeMap::from([
        (
            Ironveil,
            ids(&["ironveil_enforcer", "ironveil_sentinel", "ironveil_picket", "ironveil_bulwark", "ironveil_warden"]),
        ),
        (
            Ashfall,
            ids(&["ashfall_raider", "ashfall_skiff", "ashfall_brute", "ashfall_marauder", "ashfall_firebrand"]),
        ),
        (
            Meridian,
            ids(&["meridian_patrol", "meridian_cutter", "meridian_frigate", "meridian_lancer", "meridian_courier"]),
        ),
        (
            VoidWardens,
            ids(&[
                "void_wardens_shade",
                "void_wardens_watcher",
                "void_wardens_monolith",
                "void_wardens_specter",
                "void_wardens_obelisk",
            ]),
        ),
        (
            SunderedOath,
            ids(&[
                "sundered_oath_cutthroat",
                "sundered_oath_breaker",
                "sundered_oath_scrapper",
                "sundered_oath_reaver",
                "sundered_oath_hulk",
            ]),
        ),
    ]);

    Catalog {
        quests: builtin_quests(),
        dilemmas: builtin_dilemmas(),
        cards: builtin_cards(),
        starter_cards: ids(&["starter_scout", "starter_freighter", "starter_corvette"]),
        alliance_cards,
        opponent_pools,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_references_resolve() {
        let catalog = builtin();
        for quest in &catalog.quests {
            for dilemma_id in &quest.dilemma_ids {
                let dilemma = catalog
                    .get_dilemma_by_id(dilemma_id)
                    .expect("quest dilemma should exist");
                assert_eq!(dilemma.quest_id, quest.id);
                for choice in &dilemma.choices {
                    for card_id in choice.cards_gained.iter().chain(choice.cards_lost.iter()) {
                        assert!(catalog.get_card_by_id(card_id).is_some(), "{card_id}");
                    }
                }
            }
            for card_id in &quest.initial_card_ids {
                assert!(catalog.get_card_by_id(card_id).is_some(), "{card_id}");
            }
        }
        for card_id in catalog.starter_card_ids() {
            assert!(catalog.get_card_by_id(&card_id).is_some(), "{card_id}");
        }
    }

    #[test]
    fn every_faction_has_two_alliance_cards_and_a_full_pool() {
        let catalog = builtin();
        for faction in FactionId::ALL {
            let alliance = catalog.get_alliance_card_ids(faction);
            assert_eq!(alliance.len(), 2, "{faction}");
            let pool = catalog.opponent_pool(faction);
            assert!(pool.len() >= 5, "{faction}");
            for card_id in alliance.iter().chain(pool.iter()) {
                assert!(catalog.get_card_by_id(card_id).is_some(), "{card_id}");
            }
        }
    }

    #[test]
    fn next_dilemma_follows_quest_order() {
        let catalog = builtin();
        let next = catalog
            .get_next_dilemma("quest_salvage_claim", "dilemma_salvage_arrival")
            .expect("second dilemma should follow");
        assert_eq!(next.id, "dilemma_salvage_standoff");
        assert!(catalog
            .get_next_dilemma("quest_salvage_claim", "dilemma_salvage_standoff")
            .is_none());
        assert!(catalog.get_next_dilemma("quest_unknown", "x").is_none());
    }

    #[test]
    fn catalog_round_trips_through_json() {
        let json = serde_json::to_string(builtin()).expect("catalog should serialize");
        let parsed = Catalog::from_json(&json).expect("catalog should parse");
        assert_eq!(&parsed, builtin());
    }
}
