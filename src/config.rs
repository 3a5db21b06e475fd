//! 引擎配置，宿主可以通过 JSON 覆盖任意字段。

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_SNAPSHOT_INTERVAL;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TacticalConfig {
    pub round_limit: u32,
    pub flagship_hull: i32,
    pub starting_energy: u32,
    pub max_energy: u32,
    pub energy_regeneration: u32,
    pub opening_hand: usize,
    pub move_cost: u32,
}

impl Default for TacticalConfig {
    fn default() -> Self {
        Self {
            round_limit: 5,
            flagship_hull: 30,
            starting_energy: 3,
            max_energy: 10,
            energy_regeneration: 2,
            opening_hand: 3,
            move_cost: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub tactical: TacticalConfig,
    /// 每追加多少个事件保存一次快照，0 表示不保存。
    pub snapshot_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tactical: TacticalConfig::default(),
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = EngineConfig::from_json(r#"{"tactical":{"round_limit":3}}"#)
            .expect("partial config should parse");
        assert_eq!(config.tactical.round_limit, 3);
        assert_eq!(config.tactical.flagship_hull, 30);
        assert_eq!(config.snapshot_interval, DEFAULT_SNAPSHOT_INTERVAL);

        let empty = EngineConfig::from_json("{}").expect("empty config should parse");
        assert_eq!(empty, EngineConfig::default());
    }
}
