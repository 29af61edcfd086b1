// Save format
pub const SAVE_SCHEMA_VERSION: u32 = 2;
pub const SAVE_FILE_NAME: &str = "save.json";
pub const SAVE_DB_NAME: &str = "save.sqlite3";

// Merit economy
pub const DEFAULT_MERIT_CAP: f64 = 1000.0;
pub const DEFAULT_DAILY_GRANT: f64 = 120.0;
/// Round-off allowed when a spend lands on the debt limit.
pub const MERIT_EPSILON: f64 = 1e-9;

// Luck
pub const LUCK_MIN: f64 = -100.0;
pub const LUCK_MAX: f64 = 100.0;
pub const LUCK_MULTIPLIER_HALVING: f64 = 50.0;
pub const BACKLASH_PENALTY_PER_POINT: f64 = 5.0;
pub const BACKLASH_PENALTY_CAP: f64 = 30.0;

// Augury ladder
pub const AUGURY_BASE_COST: f64 = 50.0;
pub const AUGURY_COST_INCREMENT: f64 = 25.0;
pub const AUGURY_BACKLASH_PER_PAID_USE: u32 = 1;

// Gacha
pub const TEN_PULL_SIZE: usize = 10;
pub const SINGLE_PULL_COST: f64 = 10.0;
pub const TEN_PULL_COST: f64 = 90.0;
pub const DEFAULT_EPIC_PITY: u32 = 10;
pub const DEFAULT_LEGENDARY_PITY: u32 = 90;
pub const DEFAULT_SOFT_PITY_START: u32 = 75;
pub const DEFAULT_SOFT_PITY_SLOPE: f64 = 0.25;

// Event risk
pub const DEFAULT_S3_COOLDOWN_HOURS: i64 = 24;
pub const DEFAULT_RESCUE_HOURS: i64 = 12;
pub const MAX_EVENT_WINDOW_HOURS: i64 = 24 * 365;
pub const S3_RESERVE_COST: f64 = 120.0;
pub const S3_BUFFER_COST: f64 = 80.0;
pub const S2_RESERVE_COST: f64 = 60.0;
pub const S2_BUFFER_COST: f64 = 40.0;
pub const DEFAULT_REPORT_CAPACITY: usize = 100;
pub const MIN_REPORT_CAPACITY: usize = 10;

// Concealment
pub const DEFAULT_CONCEALMENT_MULTIPLIER: f64 = 0.5;
pub const DEFAULT_CONCEALMENT_SECONDS: i64 = 3600;

// Named timers kept in the save
pub const DAILY_GRANT_TIMER_KEY: &str = "dailyGrant";

// Shop
pub const DEFAULT_VIP_RATE: f64 = 0.8;
pub const DEFAULT_LEDGER_PENALTY_RATE: f64 = 0.02;

// Inventory
pub const DEFAULT_STACK_LIMIT: u32 = 99;
