//! SQLite-backed store of characters the user already knows.

mod characters;

use std::collections::HashSet;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::XueziError;

/// Set busy_timeout on every connection handed out by the pool.
/// Prevents SQLITE_BUSY when two requests write at once.
#[derive(Debug)]
struct BusyTimeoutCustomizer;
impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error> for BusyTimeoutCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(())
    }
}

type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

const MAX_CHARACTER_LEN: usize = 32;
const MAX_FIELD_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: i64,
    pub character: String,
    pub pinyin: Option<String>,
    pub jyutping: Option<String>,
    pub definition: Option<String>,
    pub example: Option<String>,
    pub stroke_order: Option<String>,
    pub frequency: Option<f64>,
    pub familiarity: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterInput {
    pub character: String,
    #[serde(default)]
    pub pinyin: Option<String>,
    /// Cantonese romanization.
    #[serde(default)]
    pub jyutping: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub stroke_order: Option<String>,
    #[serde(default)]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub familiarity: Option<i64>,
}

impl CharacterInput {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            ..Default::default()
        }
    }

    pub fn pinyin(mut self, p: impl Into<String>) -> Self {
        self.pinyin = Some(p.into());
        self
    }

    pub fn jyutping(mut self, j: impl Into<String>) -> Self {
        self.jyutping = Some(j.into());
        self
    }

    pub fn definition(mut self, d: impl Into<String>) -> Self {
        self.definition = Some(d.into());
        self
    }

    pub fn example(mut self, e: impl Into<String>) -> Self {
        self.example = Some(e.into());
        self
    }

    pub fn stroke_order(mut self, s: impl Into<String>) -> Self {
        self.stroke_order = Some(s.into());
        self
    }

    pub fn frequency(mut self, f: f64) -> Self {
        self.frequency = Some(f);
        self
    }

    pub fn familiarity(mut self, f: i64) -> Self {
        self.familiarity = Some(f);
        self
    }
}

/// Persistence operations the API and suggester rely on.
///
/// Lookups that find nothing return `Ok(None)`; only real failures are errors.
pub trait CharacterStore: Send + Sync {
    fn get_by_character(&self, character: &str) -> Result<Option<CharacterRecord>, XueziError>;

    fn get(&self, id: i64) -> Result<Option<CharacterRecord>, XueziError>;

    /// Records in insertion order.
    fn list_all(&self, offset: usize, limit: usize) -> Result<Vec<CharacterRecord>, XueziError>;

    /// Fails with `Duplicate` if the character is already stored.
    fn add(&self, input: CharacterInput) -> Result<CharacterRecord, XueziError>;

    fn delete_by_id(&self, id: i64) -> Result<Option<CharacterRecord>, XueziError>;

    /// Case-sensitive substring match on character, pinyin or definition.
    fn search(&self, needle: &str) -> Result<Vec<CharacterRecord>, XueziError>;

    fn known_characters(&self) -> Result<HashSet<String>, XueziError>;

    fn count(&self) -> Result<usize, XueziError>;

    /// Fill an empty store with every catalog word. No-op when anything is stored.
    fn seed_from_catalog(&self, catalog: &Catalog) -> Result<usize, XueziError>;
}

fn check_len(name: &str, value: Option<&str>) -> Result<(), XueziError> {
    if let Some(v) = value {
        if v.chars().count() > MAX_FIELD_LEN {
            return Err(XueziError::Validation(format!(
                "{name} too long (max {MAX_FIELD_LEN})"
            )));
        }
    }
    Ok(())
}

fn validate_input(input: &CharacterInput) -> Result<(), XueziError> {
    let character = input.character.trim();
    if character.is_empty() {
        return Err(XueziError::Validation("character must not be empty".into()));
    }
    if character.chars().count() > MAX_CHARACTER_LEN {
        return Err(XueziError::Validation(format!(
            "character too long (max {MAX_CHARACTER_LEN})"
        )));
    }
    check_len("pinyin", input.pinyin.as_deref())?;
    check_len("jyutping", input.jyutping.as_deref())?;
    check_len("definition", input.definition.as_deref())?;
    check_len("example", input.example.as_deref())?;
    check_len("stroke_order", input.stroke_order.as_deref())?;
    if let Some(f) = input.familiarity {
        if f < 0 {
            return Err(XueziError::Validation("familiarity must not be negative".into()));
        }
    }
    if let Some(f) = input.frequency {
        if !f.is_finite() {
            return Err(XueziError::Validation("frequency must be a finite number".into()));
        }
    }
    Ok(())
}

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    character TEXT NOT NULL UNIQUE,
    pinyin TEXT,
    jyutping TEXT,
    definition TEXT,
    example TEXT,
    stroke_order TEXT,
    frequency REAL,
    familiarity INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);
"#;

const COLS: &str = "id, character, pinyin, jyutping, definition, example, \
    stroke_order, frequency, familiarity, created_at";

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CharacterRecord> {
    Ok(CharacterRecord {
        id: row.get("id")?,
        character: row.get("character")?,
        pinyin: row.get("pinyin")?,
        jyutping: row.get("jyutping")?,
        definition: row.get("definition")?,
        example: row.get("example")?,
        stroke_order: row.get("stroke_order")?,
        frequency: row.get("frequency")?,
        familiarity: row.get("familiarity")?,
        created_at: row.get("created_at")?,
    })
}

/// True when `e` is the UNIQUE constraint on `characters.character` firing.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    fn conn(&self) -> Result<PooledConn, XueziError> {
        self.pool.get().map_err(|e| XueziError::Internal(format!("pool: {e}")))
    }

    pub fn open(path: &str) -> Result<Self, XueziError> {
        let pool_size = if path == ":memory:" { 2 } else { 8 };
        let manager = if path == ":memory:" {
            // Shared cache so all pool connections see the same in-memory DB.
            // Each open gets a unique name so tests don't see each other.
            let name = uuid::Uuid::new_v4().to_string();
            SqliteConnectionManager::file(format!("file:{name}?mode=memory&cache=shared"))
        } else {
            SqliteConnectionManager::file(path)
        };
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(BusyTimeoutCustomizer))
            .build(manager)
            .map_err(|e| XueziError::Internal(format!("pool: {e}")))?;

        let conn = pool.get().map_err(|e| XueziError::Internal(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        drop(conn);

        tracing::debug!(path, "store opened");
        Ok(Self { pool })
    }
}
