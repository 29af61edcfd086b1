use super::backend::SaveBackend;
use super::state::*;
use crate::core::constants::{DEFAULT_REPORT_CAPACITY, SAVE_SCHEMA_VERSION};
use crate::core::error::{SaveError, SaveResult};
use crate::economy::{BacklashState, LuckScore, MeritState};
use crate::events::{EventReport, Severity};
use crate::gacha::Rarity;
use crate::inventory::InventoryItem;
use crate::protection::ConcealmentState;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MIGRATION_1: &str = "
CREATE TABLE IF NOT EXISTS player_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    gongde REAL NOT NULL DEFAULT 0,
    cap REAL NOT NULL DEFAULT 1000,
    daily REAL NOT NULL DEFAULT 120,
    reserve REAL NOT NULL DEFAULT 0,
    y_buffer REAL NOT NULL DEFAULT 0,
    luck_value REAL NOT NULL DEFAULT 0,
    backlash_points INTEGER NOT NULL DEFAULT 0,
    gacha_pity INTEGER NOT NULL DEFAULT 0,
    legendary_pity INTEGER NOT NULL DEFAULT 0,
    character_name TEXT NOT NULL DEFAULT 'Li Qingran',
    character_mood REAL NOT NULL DEFAULT 1.0,
    character_hp REAL NOT NULL DEFAULT 1.0,
    equipment_slots INTEGER NOT NULL DEFAULT 4,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS world_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_s3_date TEXT,
    rescue_deadline TEXT,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS shop_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    coupons REAL NOT NULL DEFAULT 0,
    vip_rate REAL NOT NULL DEFAULT 0.8,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS event_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    original_severity TEXT NOT NULL,
    final_severity TEXT NOT NULL,
    rescue_deadline TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL,
    rarity TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 1,
    stack_limit INTEGER NOT NULL DEFAULT 99,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

const MIGRATION_2: &str = "
CREATE TABLE IF NOT EXISTS event_cooldowns (
    name TEXT PRIMARY KEY,
    expires_at TEXT NOT NULL
);
ALTER TABLE world_state ADD COLUMN concealment TEXT;
ALTER TABLE world_state ADD COLUMN defense_charges INTEGER NOT NULL DEFAULT 0;
CREATE INDEX IF NOT EXISTS idx_inventory_item_id ON inventory(item_id);
CREATE INDEX IF NOT EXISTS idx_event_reports_timestamp ON event_reports(timestamp);
";

/// Ordered migrations; entry `i` brings the database to version `i + 1`.
const MIGRATIONS: [&str; 2] = [MIGRATION_1, MIGRATION_2];

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(text: &str) -> SaveResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| SaveError::LoadFailed(format!("bad timestamp {text:?}: {e}")))
}

fn parse_opt_ts(text: Option<String>) -> SaveResult<Option<DateTime<Utc>>> {
    text.as_deref().map(parse_ts).transpose()
}

fn save_failed(e: rusqlite::Error) -> SaveError {
    SaveError::SaveFailed(e.to_string())
}

fn load_failed(e: rusqlite::Error) -> SaveError {
    SaveError::LoadFailed(e.to_string())
}

/// SQLite save slot in WAL mode with versioned migrations.
///
/// Each save runs in one transaction with a savepoint; any failed write rolls
/// the whole save back and the previously committed state stays intact.
pub struct SqliteBackend {
    conn: Connection,
    path: PathBuf,
}

impl SqliteBackend {
    pub fn open(path: impl Into<PathBuf>) -> SaveResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path).map_err(|e| SaveError::DatabaseOpenFailed(e.to_string()))?;

        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| SaveError::DatabaseOpenFailed(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| SaveError::DatabaseOpenFailed(e.to_string()))?;
        debug!(path = %path.display(), journal_mode = %mode, "save database open");

        let mut backend = Self { conn, path };
        backend.migrate()?;
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema_version(&self) -> SaveResult<u32> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SaveError::MigrationFailed(e.to_string()))?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    fn migrate(&mut self) -> SaveResult<()> {
        self.conn
            .execute_batch("CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);")
            .map_err(|e| SaveError::MigrationFailed(e.to_string()))?;

        let current = self.schema_version()?;
        if current > SAVE_SCHEMA_VERSION {
            return Err(SaveError::NewerSchema {
                found: current,
                supported: SAVE_SCHEMA_VERSION,
            });
        }

        for version in (current + 1)..=SAVE_SCHEMA_VERSION {
            let sql = MIGRATIONS
                .get(version as usize - 1)
                .ok_or_else(|| SaveError::MigrationFailed(format!("no migration for version {version}")))?;
            let migration_failed = |e: rusqlite::Error| SaveError::MigrationFailed(format!("v{version}: {e}"));

            let tx = self.conn.transaction().map_err(migration_failed)?;
            tx.execute_batch(sql).map_err(migration_failed)?;
            tx.execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
                params![version.to_string()],
            )
            .map_err(migration_failed)?;
            tx.commit().map_err(migration_failed)?;
            info!(version, "save database migrated");
        }
        Ok(())
    }

    fn write_tables(conn: &Connection, state: &SaveState) -> SaveResult<()> {
        let player = &state.player;
        let merit = &player.merit;
        conn.execute(
            "INSERT OR REPLACE INTO player_state (
                id, gongde, cap, daily, reserve, y_buffer, luck_value,
                backlash_points, gacha_pity, legendary_pity,
                character_name, character_mood, character_hp, equipment_slots, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, datetime('now'))",
            params![
                merit.balance(),
                merit.cap,
                merit.daily_grant,
                merit.reserve,
                merit.overflow_buffer,
                player.luck.value(),
                player.backlash.points(),
                player.gacha_pity,
                player.legendary_pity,
                player.character.name,
                player.character.mood,
                player.character.hp,
                player.character.equipment_slots,
            ],
        )
        .map_err(save_failed)?;

        let world = &state.world;
        let concealment = serde_json::to_string(&world.concealment)
            .map_err(|e| SaveError::EncodingFailed(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO world_state
                 (id, last_s3_date, rescue_deadline, concealment, defense_charges, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, datetime('now'))",
            params![
                world.last_s3_date.map(ts),
                world.rescue_deadline.map(ts),
                concealment,
                world.defense_charges
            ],
        )
        .map_err(save_failed)?;

        conn.execute(
            "INSERT OR REPLACE INTO shop_state (id, coupons, vip_rate, updated_at)
             VALUES (1, ?1, ?2, datetime('now'))",
            params![state.shop.coupons, state.shop.vip_rate],
        )
        .map_err(save_failed)?;

        conn.execute("DELETE FROM event_cooldowns", []).map_err(save_failed)?;
        for (name, at) in &world.event_cooldowns {
            conn.execute(
                "INSERT INTO event_cooldowns (name, expires_at) VALUES (?1, ?2)",
                params![name, ts(*at)],
            )
            .map_err(save_failed)?;
        }

        Self::write_reports(conn, &world.reports)?;

        conn.execute("DELETE FROM inventory", []).map_err(save_failed)?;
        for item in &state.inventory {
            conn.execute(
                "INSERT INTO inventory (item_id, rarity, count, stack_limit) VALUES (?1, ?2, ?3, ?4)",
                params![item.id, item.rarity.tag(), item.count, item.stack_limit],
            )
            .map_err(save_failed)?;
        }
        Ok(())
    }

    /// Prunes to the newest reports, then appends only reports newer than
    /// what is already stored.
    fn write_reports(conn: &Connection, reports: &[EventReport]) -> SaveResult<()> {
        conn.execute(
            "DELETE FROM event_reports WHERE id NOT IN (
                SELECT id FROM event_reports ORDER BY timestamp DESC, id DESC LIMIT ?1
            )",
            params![DEFAULT_REPORT_CAPACITY as i64],
        )
        .map_err(save_failed)?;

        let tail: Option<String> = conn
            .query_row("SELECT MAX(timestamp) FROM event_reports", [], |row| row.get(0))
            .map_err(save_failed)?;

        let start = reports.len().saturating_sub(DEFAULT_REPORT_CAPACITY);
        let mut inserted = 0;
        for report in &reports[start..] {
            let stamp = ts(report.timestamp);
            if tail.as_deref().is_some_and(|t| stamp.as_str() <= t) {
                continue;
            }
            conn.execute(
                "INSERT INTO event_reports (timestamp, original_severity, final_severity, rescue_deadline)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    stamp,
                    report.original.tag(),
                    report.final_severity.tag(),
                    report.rescue_deadline.map(ts)
                ],
            )
            .map_err(save_failed)?;
            inserted += 1;
        }
        debug!(inserted, "event reports appended");
        Ok(())
    }

    fn read_player(&self) -> SaveResult<PlayerState> {
        let player = self
            .conn
            .query_row("SELECT * FROM player_state WHERE id = 1", [], player_from_row)
            .optional()
            .map_err(load_failed)?;
        Ok(player.unwrap_or_default())
    }

    fn read_world(&self) -> SaveResult<WorldState> {
        let row: Option<(Option<String>, Option<String>, Option<String>, u32)> = self
            .conn
            .query_row(
                "SELECT last_s3_date, rescue_deadline, concealment, defense_charges
                 FROM world_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(load_failed)?;

        let mut world = WorldState::default();
        if let Some((last_s3, rescue, concealment, defense_charges)) = row {
            world.last_s3_date = parse_opt_ts(last_s3)?;
            world.rescue_deadline = parse_opt_ts(rescue)?;
            world.defense_charges = defense_charges;
            world.concealment = match concealment {
                Some(json) => serde_json::from_str::<ConcealmentState>(&json)
                    .map_err(|e| SaveError::LoadFailed(e.to_string()))?,
                None => ConcealmentState::default(),
            };
        }
        world.event_cooldowns = self.read_cooldowns()?;
        world.reports = self.read_reports()?;
        Ok(world)
    }

    fn read_cooldowns(&self) -> SaveResult<BTreeMap<String, DateTime<Utc>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, expires_at FROM event_cooldowns")
            .map_err(load_failed)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(load_failed)?;

        let mut cooldowns = BTreeMap::new();
        for row in rows {
            let (name, at) = row.map_err(load_failed)?;
            cooldowns.insert(name, parse_ts(&at)?);
        }
        Ok(cooldowns)
    }

    fn read_reports(&self) -> SaveResult<Vec<EventReport>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT timestamp, original_severity, final_severity, rescue_deadline
                 FROM event_reports ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )
            .map_err(load_failed)?;
        let rows = stmt
            .query_map(params![DEFAULT_REPORT_CAPACITY as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(load_failed)?;

        let mut reports = Vec::new();
        for row in rows {
            let (timestamp, original, final_severity, rescue) = row.map_err(load_failed)?;
            let (Some(original), Some(final_severity)) =
                (Severity::from_tag(&original), Severity::from_tag(&final_severity))
            else {
                warn!(%timestamp, "skipping report with unknown severity");
                continue;
            };
            reports.push(EventReport {
                timestamp: parse_ts(&timestamp)?,
                original,
                final_severity,
                rescue_deadline: parse_opt_ts(rescue)?,
            });
        }
        reports.reverse();
        Ok(reports)
    }

    fn read_shop(&self) -> SaveResult<ShopState> {
        let shop = self
            .conn
            .query_row("SELECT coupons, vip_rate FROM shop_state WHERE id = 1", [], |row| {
                Ok(ShopState {
                    coupons: row.get(0)?,
                    vip_rate: row.get(1)?,
                })
            })
            .optional()
            .map_err(load_failed)?;
        Ok(shop.unwrap_or_default())
    }

    fn read_inventory(&self) -> SaveResult<Vec<InventoryItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT item_id, rarity, count, stack_limit FROM inventory ORDER BY id")
            .map_err(load_failed)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, u32>(3)?,
                ))
            })
            .map_err(load_failed)?;

        let mut items = Vec::new();
        for row in rows {
            let (id, rarity, count, stack_limit) = row.map_err(load_failed)?;
            match Rarity::from_tag(&rarity) {
                Some(rarity) => items.push(InventoryItem::with_stack_limit(id, rarity, count, stack_limit)),
                None => warn!(%id, %rarity, "skipping item with unknown rarity"),
            }
        }
        Ok(items)
    }
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerState> {
    let merit = MeritState::new(row.get("gongde")?, row.get("cap")?, row.get("daily")?)
        .with_pools(row.get("reserve")?, row.get("y_buffer")?);
    let mut player = PlayerState {
        merit,
        luck: LuckScore::clamped(row.get("luck_value")?),
        backlash: BacklashState::new(row.get("backlash_points")?),
        reserve: 0.0,
        overflow_buffer: 0.0,
        gacha_pity: row.get("gacha_pity")?,
        legendary_pity: row.get("legendary_pity")?,
        character: CharacterState {
            name: row.get("character_name")?,
            mood: row.get("character_mood")?,
            hp: row.get("character_hp")?,
            equipment_slots: row.get("equipment_slots")?,
        },
    };
    player.sync_pools();
    Ok(player)
}

impl SaveBackend for SqliteBackend {
    fn save(&mut self, state: &SaveState) -> SaveResult<()> {
        let mut tx = self.conn.transaction().map_err(save_failed)?;

        let written = {
            let mut savepoint = tx.savepoint_with_name("save_checkpoint").map_err(save_failed)?;
            match Self::write_tables(&savepoint, state) {
                Ok(()) => savepoint.commit().map_err(save_failed),
                Err(err) => {
                    savepoint
                        .rollback()
                        .map_err(|e| SaveError::RollbackFailed(e.to_string()))?;
                    Err(err)
                }
            }
        };

        match written {
            Ok(()) => {
                tx.commit().map_err(save_failed)?;
                debug!(path = %self.path.display(), "save committed");
                Ok(())
            }
            Err(err) => {
                tx.rollback()
                    .map_err(|e| SaveError::RollbackFailed(e.to_string()))?;
                warn!(error = %err, "save rolled back");
                Err(err)
            }
        }
    }

    fn load(&mut self) -> SaveResult<SaveState> {
        Ok(SaveState {
            schema_version: self.schema_version()?,
            player: self.read_player()?,
            world: self.read_world()?,
            shop: self.read_shop()?,
            inventory: self.read_inventory()?,
        })
    }

    fn backup(&mut self, dest: &Path) -> SaveResult<()> {
        self.conn
            .backup(DatabaseName::Main, dest, None)
            .map_err(save_failed)?;
        info!(dest = %dest.display(), "database backed up");
        Ok(())
    }
}
