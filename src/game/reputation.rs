//! 阵营与声望等级。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const REPUTATION_MIN: i32 = -100;
pub const REPUTATION_MAX: i32 = 100;

const DEVOTED_THRESHOLD: i32 = 75;
const FRIENDLY_THRESHOLD: i32 = 25;
const UNFRIENDLY_THRESHOLD: i32 = -25;
const HOSTILE_THRESHOLD: i32 = -75;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FactionId {
    Ironveil,
    Ashfall,
    Meridian,
    VoidWardens,
    SunderedOath,
}

impl FactionId {
    pub const ALL: [FactionId; 5] = [
        FactionId::Ironveil,
        FactionId::Ashfall,
        FactionId::Meridian,
        FactionId::VoidWardens,
        FactionId::SunderedOath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FactionId::Ironveil => "ironveil",
            FactionId::Ashfall => "ashfall",
            FactionId::Meridian => "meridian",
            FactionId::VoidWardens => "void_wardens",
            FactionId::SunderedOath => "sundered_oath",
        }
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ironveil" => Ok(FactionId::Ironveil),
            "ashfall" => Ok(FactionId::Ashfall),
            "meridian" => Ok(FactionId::Meridian),
            "void_wardens" | "voidwardens" => Ok(FactionId::VoidWardens),
            "sundered_oath" | "sunderedoath" => Ok(FactionId::SunderedOath),
            _ => Err(()),
        }
    }
}

/// 声望数值对应的五档关系。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReputationStatus {
    Hostile,
    Unfriendly,
    Neutral,
    Friendly,
    Devoted,
}

impl ReputationStatus {
    pub fn from_value(value: i32) -> Self {
        match clamp_reputation(value) {
            v if v >= DEVOTED_THRESHOLD => ReputationStatus::Devoted,
            v if v >= FRIENDLY_THRESHOLD => ReputationStatus::Friendly,
            v if v > UNFRIENDLY_THRESHOLD => ReputationStatus::Neutral,
            v if v > HOSTILE_THRESHOLD => ReputationStatus::Unfriendly,
            _ => ReputationStatus::Hostile,
        }
    }

    /// 结盟时该阵营分走的赏金比例；敌对阵营不可结盟。
    pub fn bounty_share(self) -> Option<f64> {
        match self {
            ReputationStatus::Devoted => Some(0.15),
            ReputationStatus::Friendly => Some(0.25),
            ReputationStatus::Neutral => Some(0.30),
            ReputationStatus::Unfriendly => Some(0.40),
            ReputationStatus::Hostile => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReputationStatus::Hostile => "hostile",
            ReputationStatus::Unfriendly => "unfriendly",
            ReputationStatus::Neutral => "neutral",
            ReputationStatus::Friendly => "friendly",
            ReputationStatus::Devoted => "devoted",
        }
    }
}

impl fmt::Display for ReputationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn clamp_reputation(value: i32) -> i32 {
    value.clamp(REPUTATION_MIN, REPUTATION_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, ReputationStatus::Devoted)]
    #[case(75, ReputationStatus::Devoted)]
    #[case(74, ReputationStatus::Friendly)]
    #[case(30, ReputationStatus::Friendly)]
    #[case(25, ReputationStatus::Friendly)]
    #[case(24, ReputationStatus::Neutral)]
    #[case(0, ReputationStatus::Neutral)]
    #[case(-24, ReputationStatus::Neutral)]
    #[case(-25, ReputationStatus::Unfriendly)]
    #[case(-74, ReputationStatus::Unfriendly)]
    #[case(-75, ReputationStatus::Hostile)]
    #[case(-100, ReputationStatus::Hostile)]
    fn status_tiers_follow_thresholds(#[case] value: i32, #[case] expected: ReputationStatus) {
        assert_eq!(ReputationStatus::from_value(value), expected);
    }

    #[rstest]
    #[case(ReputationStatus::Neutral, Some(0.30))]
    #[case(ReputationStatus::Friendly, Some(0.25))]
    #[case(ReputationStatus::Devoted, Some(0.15))]
    #[case(ReputationStatus::Hostile, None)]
    fn bounty_share_by_status(#[case] status: ReputationStatus, #[case] expected: Option<f64>) {
        assert_eq!(status.bounty_share(), expected);
    }

    #[test]
    fn clamp_keeps_range() {
        assert_eq!(clamp_reputation(150), 100);
        assert_eq!(clamp_reputation(-180), -100);
        assert_eq!(clamp_reputation(12), 12);
    }

    #[test]
    fn faction_round_trips_through_str() {
        for faction in FactionId::ALL {
            assert_eq!(faction.as_str().parse::<FactionId>(), Ok(faction));
        }
        assert!("pirates".parse::<FactionId>().is_err());
    }
}
