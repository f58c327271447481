//! Character CRUD against SQLite.

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::*;

impl SqliteStore {
    fn query_records(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<CharacterRecord>, XueziError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(args, row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl CharacterStore for SqliteStore {
    fn get_by_character(&self, character: &str) -> Result<Option<CharacterRecord>, XueziError> {
        let conn = self.conn()?;
        let rec = conn
            .query_row(
                &format!("SELECT {COLS} FROM characters WHERE character = ?1"),
                params![character],
                row_to_record,
            )
            .optional()?;
        Ok(rec)
    }

    fn get(&self, id: i64) -> Result<Option<CharacterRecord>, XueziError> {
        let conn = self.conn()?;
        let rec = conn
            .query_row(
                &format!("SELECT {COLS} FROM characters WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(rec)
    }

    fn list_all(&self, offset: usize, limit: usize) -> Result<Vec<CharacterRecord>, XueziError> {
        self.query_records(
            &format!("SELECT {COLS} FROM characters ORDER BY id ASC LIMIT ?1 OFFSET ?2"),
            params![
                i64::try_from(limit).unwrap_or(i64::MAX),
                i64::try_from(offset).unwrap_or(i64::MAX)
            ],
        )
    }

    fn add(&self, input: CharacterInput) -> Result<CharacterRecord, XueziError> {
        validate_input(&input)?;
        let character = input.character.trim().to_string();

        if self.get_by_character(&character)?.is_some() {
            tracing::debug!(character = %character, "add rejected, already known");
            return Err(XueziError::Duplicate(character));
        }

        let now = now_ms();
        let familiarity = input.familiarity.unwrap_or(0);
        let conn = self.conn()?;
        // The pre-check above can lose a race; the UNIQUE constraint settles it.
        let inserted = conn.execute(
            "INSERT INTO characters \
             (character, pinyin, jyutping, definition, example, stroke_order, \
              frequency, familiarity, created_at) \
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                character,
                input.pinyin,
                input.jyutping,
                input.definition,
                input.example,
                input.stroke_order,
                input.frequency,
                familiarity,
                now,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(character = %character, "add lost insert race");
                return Err(XueziError::Duplicate(character));
            }
            Err(e) => return Err(e.into()),
        }
        let id = conn.last_insert_rowid();
        tracing::debug!(id, character = %character, "character added");

        Ok(CharacterRecord {
            id,
            character,
            pinyin: input.pinyin,
            jyutping: input.jyutping,
            definition: input.definition,
            example: input.example,
            stroke_order: input.stroke_order,
            frequency: input.frequency,
            familiarity,
            created_at: now,
        })
    }

    fn delete_by_id(&self, id: i64) -> Result<Option<CharacterRecord>, XueziError> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front. A deferred read-then-write
        // upgrade fails with SQLITE_BUSY under WAL without waiting.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rec = tx
            .query_row(
                &format!("SELECT {COLS} FROM characters WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()?;
        if rec.is_some() {
            tx.execute("DELETE FROM characters WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        if let Some(ref r) = rec {
            tracing::debug!(id, character = %r.character, "character deleted");
        }
        Ok(rec)
    }

    fn search(&self, needle: &str) -> Result<Vec<CharacterRecord>, XueziError> {
        // instr() rather than LIKE: LIKE folds ASCII case.
        self.query_records(
            &format!(
                "SELECT {COLS} FROM characters \
                 WHERE instr(character, ?1) > 0 \
                    OR instr(COALESCE(pinyin, ''), ?1) > 0 \
                    OR instr(COALESCE(definition, ''), ?1) > 0 \
                 ORDER BY id ASC"
            ),
            params![needle],
        )
    }

    fn known_characters(&self) -> Result<HashSet<String>, XueziError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT character FROM characters")?;
        let set = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(set)
    }

    fn count(&self) -> Result<usize, XueziError> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM characters", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    fn seed_from_catalog(&self, catalog: &Catalog) -> Result<usize, XueziError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM characters", [], |r| r.get(0))?;
        if existing > 0 {
            tracing::info!(existing, "store already populated, skipping seed");
            return Ok(0);
        }

        let now = now_ms();
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO characters (character, pinyin, definition, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for e in catalog {
                inserted += stmt.execute(params![e.character, e.pinyin, e.definition, now])?;
            }
        }
        tx.commit()?;
        tracing::info!(inserted, "store seeded from catalog");
        Ok(inserted)
    }
}

#[cfg(test)]
#[path = "characters_tests.rs"]
mod tests;
