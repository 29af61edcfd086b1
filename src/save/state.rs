//! The aggregate save document shared by both backends.

use crate::core::constants::SAVE_SCHEMA_VERSION;
use crate::core::error::{SaveError, SaveResult};
use crate::economy::{BacklashState, LuckScore, MeritState};
use crate::events::EventReport;
use crate::inventory::InventoryItem;
use crate::protection::ConcealmentState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterState {
    pub name: String,
    pub mood: f64,
    pub hp: f64,
    pub equipment_slots: u32,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            name: "Li Qingran".to_string(),
            mood: 1.0,
            hp: 1.0,
            equipment_slots: 4,
        }
    }
}

/// Player section. `reserve` and `overflow_buffer` mirror the merit pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    pub merit: MeritState,
    pub luck: LuckScore,
    pub backlash: BacklashState,
    pub reserve: f64,
    pub overflow_buffer: f64,
    pub gacha_pity: u32,
    pub legendary_pity: u32,
    pub character: CharacterState,
}

impl PlayerState {
    /// Copies the merit pools into the top-level mirror fields.
    pub fn sync_pools(&mut self) {
        self.reserve = self.merit.reserve;
        self.overflow_buffer = self.merit.overflow_buffer;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldState {
    pub last_s3_date: Option<DateTime<Utc>>,
    pub rescue_deadline: Option<DateTime<Utc>>,
    /// Named timers, e.g. the time of the last daily grant.
    pub event_cooldowns: BTreeMap<String, DateTime<Utc>>,
    pub concealment: ConcealmentState,
    /// Unspent defense charges.
    pub defense_charges: u32,
    pub reports: Vec<EventReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopState {
    pub coupons: f64,
    pub vip_rate: f64,
}

impl Default for ShopState {
    fn default() -> Self {
        Self {
            coupons: 0.0,
            vip_rate: crate::core::constants::DEFAULT_VIP_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub schema_version: u32,
    #[serde(default)]
    pub player: PlayerState,
    #[serde(default)]
    pub world: WorldState,
    #[serde(default)]
    pub shop: ShopState,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl Default for SaveState {
    fn default() -> Self {
        Self {
            schema_version: SAVE_SCHEMA_VERSION,
            player: PlayerState::default(),
            world: WorldState::default(),
            shop: ShopState::default(),
            inventory: Vec::new(),
        }
    }
}

impl SaveState {
    /// Pretty-printed JSON with keys sorted at every level.
    pub fn encode(&self) -> SaveResult<String> {
        let value = serde_json::to_value(self).map_err(|e| SaveError::EncodingFailed(e.to_string()))?;
        serde_json::to_string_pretty(&value).map_err(|e| SaveError::EncodingFailed(e.to_string()))
    }

    /// Parses a save, migrating older schema versions forward.
    pub fn decode(json: &str) -> SaveResult<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| SaveError::LoadFailed(e.to_string()))?;
        let value = migrate(value)?;
        serde_json::from_value(value).map_err(|e| SaveError::LoadFailed(e.to_string()))
    }
}

fn schema_version_of(value: &Value) -> u32 {
    value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| v.min(u32::MAX as u64) as u32)
        .unwrap_or(1)
}

/// Upgrades a raw save document to the current schema.
pub fn migrate(mut value: Value) -> SaveResult<Value> {
    let found = schema_version_of(&value);
    if found > SAVE_SCHEMA_VERSION {
        return Err(SaveError::NewerSchema {
            found,
            supported: SAVE_SCHEMA_VERSION,
        });
    }

    let root = value
        .as_object_mut()
        .ok_or_else(|| SaveError::LoadFailed("save document is not an object".to_string()))?;

    for version in (found + 1)..=SAVE_SCHEMA_VERSION {
        match version {
            2 => migrate_v1_to_v2(root),
            other => {
                return Err(SaveError::MigrationFailed(format!(
                    "no migration to schema version {other}"
                )))
            }
        }
        info!(version, "save migrated");
    }
    root.insert("schemaVersion".to_string(), Value::from(SAVE_SCHEMA_VERSION));
    Ok(value)
}

/// v1 used the legacy `gongde`/`daily`/`yBuffer` names and had no
/// inventory or named timers.
fn migrate_v1_to_v2(root: &mut Map<String, Value>) {
    if let Some(player) = root.get_mut("player").and_then(Value::as_object_mut) {
        rename_key(player, "yBuffer", "overflowBuffer");
        if let Some(merit) = player.get_mut("merit").and_then(Value::as_object_mut) {
            rename_key(merit, "gongde", "balance");
            rename_key(merit, "daily", "dailyGrant");
            rename_key(merit, "yBuffer", "overflowBuffer");
        }
    }
    if let Some(world) = root.get_mut("world").and_then(Value::as_object_mut) {
        world
            .entry("eventCooldowns")
            .or_insert_with(|| Value::Object(Map::new()));
    }
    root.entry("inventory").or_insert_with(|| Value::Array(Vec::new()));
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(v) = map.remove(from) {
        map.entry(to).or_insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Severity;
    use crate::gacha::Rarity;
    use chrono::TimeZone;

    fn sample() -> SaveState {
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 10, 30, 0).unwrap();
        let mut state = SaveState::default();
        state.player.merit = MeritState::new(500.0, 1000.0, 120.0).with_pools(100.0, 50.0);
        state.player.sync_pools();
        state.player.luck = LuckScore::clamped(45.0);
        state.player.backlash = BacklashState::new(2);
        state.player.gacha_pity = 5;
        state.player.legendary_pity = 30;
        state.world.last_s3_date = Some(at);
        state.world.rescue_deadline = Some(at + chrono::Duration::hours(1));
        state.world.event_cooldowns.insert("dailyGrant".to_string(), at);
        state.world.reports.push(EventReport {
            timestamp: at,
            original: Severity::S3,
            final_severity: Severity::S3,
            rescue_deadline: Some(at + chrono::Duration::hours(12)),
        });
        state.shop = ShopState {
            coupons: 200.0,
            vip_rate: 0.75,
        };
        state.world.defense_charges = 1;
        state.inventory.push(InventoryItem::new("jade", Rarity::Epic, 3));
        state
    }

    #[test]
    fn test_encode_is_byte_stable() {
        let first = sample().encode().unwrap();
        let second = SaveState::decode(&first).unwrap().encode().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let state = sample();
        let back = SaveState::decode(&state.encode().unwrap()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_keys_are_sorted() {
        let json = sample().encode().unwrap();
        let inventory = json.find("\"inventory\"").unwrap();
        let player = json.find("\"player\"").unwrap();
        let schema = json.find("\"schemaVersion\"").unwrap();
        let shop = json.find("\"shop\"").unwrap();
        assert!(inventory < player && player < schema && schema < shop);
    }

    #[test]
    fn test_v1_document_migrates() {
        let v1 = r#"{
            "schemaVersion": 1,
            "player": {
                "merit": { "gongde": 300, "cap": 1000, "daily": 120, "reserve": 10, "yBuffer": 5 },
                "luck": 12.5,
                "backlash": { "points": 3 },
                "reserve": 10,
                "yBuffer": 5,
                "gachaPity": 4,
                "legendaryPity": 40
            },
            "world": { "lastS3Date": null, "rescueDeadline": null, "reports": [] },
            "shop": { "coupons": 20, "vipRate": 0.8 }
        }"#;
        let state = SaveState::decode(v1).unwrap();
        assert_eq!(state.schema_version, SAVE_SCHEMA_VERSION);
        assert_eq!(state.player.merit.balance(), 300.0);
        assert_eq!(state.player.merit.daily_grant, 120.0);
        assert_eq!(state.player.merit.overflow_buffer, 5.0);
        assert_eq!(state.player.overflow_buffer, 5.0);
        assert_eq!(state.player.backlash.points(), 3);
        assert!(state.inventory.is_empty());
        assert!(state.world.event_cooldowns.is_empty());
        assert_eq!(state.player.character, CharacterState::default());
    }

    #[test]
    fn test_newer_schema_rejected() {
        let json = r#"{ "schemaVersion": 99 }"#;
        assert!(matches!(
            SaveState::decode(json),
            Err(SaveError::NewerSchema {
                found: 99,
                supported: SAVE_SCHEMA_VERSION
            })
        ));
    }

    #[test]
    fn test_zero_stack_limit_decodes() {
        let json = r#"{"schemaVersion":2,"inventory":[{"id":"jade","rarity":"epic","count":3,"stackLimit":0}]}"#;
        let state = SaveState::decode(json).unwrap();
        assert_eq!(state.inventory[0].stack_limit, 0);
        assert_eq!(state.world.defense_charges, 0);

        let inventory = crate::inventory::Inventory::restore(state.inventory);
        assert_eq!(inventory.count_of("jade"), 3);
        assert!(inventory.snapshot().iter().all(|s| s.stack_limit == 1 && s.count == 1));
    }

    #[test]
    fn test_garbage_is_load_failure() {
        assert!(matches!(SaveState::decode("not json"), Err(SaveError::LoadFailed(_))));
        assert!(matches!(SaveState::decode("[1, 2]"), Err(SaveError::LoadFailed(_))));
    }
}
