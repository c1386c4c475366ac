use crate::catalog::{Catalog, Category};
use crate::error::PersistError;
use crate::store::{Board, ScoreEntry};
use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const SCHEMA: &str = include_str!("schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// SQLite-backed leaderboard record: one row per score entry.
pub struct Db {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        // Opening is lazy; a file that is not a database only fails on first query.
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Db {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Ok(Db {
            path: None,
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, rusqlite::Error>
    where
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }

    pub fn init_schema(&self) -> Result<(), rusqlite::Error> {
        self.with_conn(|conn| conn.execute_batch(SCHEMA))
    }

    /// `true` when the scores table already existed before this process.
    pub fn has_scores_table(&self) -> Result<bool, rusqlite::Error> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='scores'",
                [],
                |row| row.get(0),
            )?;
            Ok(count == 1)
        })
    }

    /// Reads every row in insertion order. Rows naming an unknown category
    /// are counted as dropped along with the ones the catalog rejects.
    pub fn load(&self, catalog: &Catalog) -> Result<(Board, usize), rusqlite::Error> {
        let (rows, unknown) = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT category, course, variant, submitter, score
                 FROM scores ORDER BY rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?;

            let mut entries = Vec::new();
            let mut unknown = 0;
            for row in rows {
                let (category, course, variant, submitter, score) = row?;
                match category.parse::<Category>() {
                    Ok(category) => entries.push(ScoreEntry {
                        category,
                        course,
                        variant,
                        submitter,
                        score,
                    }),
                    Err(_) => unknown += 1,
                }
            }
            Ok((entries, unknown))
        })?;

        let (board, dropped) = Board::from_entries(catalog, rows);
        Ok((board, dropped + unknown))
    }

    /// Replaces the table contents with `board` in one transaction.
    pub fn save(&self, board: &Board) -> Result<(), rusqlite::Error> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM scores", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO scores (category, course, variant, submitter, score)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for e in board.entries() {
                    stmt.execute(params![
                        e.category.as_ref(),
                        e.course,
                        e.variant,
                        e.submitter,
                        e.score
                    ])?;
                }
            }
            tx.commit()
        })
    }

    /// Throws away the current file and starts over with an empty schema.
    pub fn recreate(&self) -> Result<(), PersistError> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        // Release the handle on the old file before removing it.
        *conn = Connection::open_in_memory()?;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            *conn = Connection::open(path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
        }
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Errors meaning the file is not a usable database, as opposed to
/// transient failures like a locked or unwritable file.
pub fn is_corruption(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
        }
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::InvalidColumnName(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ScoreKey, ScoreStore};
    use std::sync::Arc;

    #[test]
    fn test_schema_creates_scores_table() {
        let db = Db::open_in_memory().unwrap();
        assert!(!db.has_scores_table().unwrap());
        db.init_schema().unwrap();
        assert!(db.has_scores_table().unwrap());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let catalog = Arc::new(Catalog::builtin());
        let store = ScoreStore::new(catalog.clone());
        for (name, score) in [("zed", 5), ("amy", 50), ("bob", 20)] {
            store.upsert_if_better(
                &ScoreKey {
                    category: Category::Awd,
                    course: "Fujimi Kaido".into(),
                    variant: "Fujimi Circuit".into(),
                    submitter: name.into(),
                },
                score,
            );
        }

        let db = Db::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db.save(&store.contents()).unwrap();
        let (board, dropped) = db.load(&catalog).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(board, store.contents());
        let order: Vec<_> = board.entries().map(|e| e.submitter).collect();
        assert_eq!(order, vec!["zed", "amy", "bob"]);
    }

    #[test]
    fn test_load_counts_unknown_rows() {
        let catalog = Catalog::builtin();
        let db = Db::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO scores VALUES ('XWD', 'Hakone', 'Club Circuit', 'bob', 3)",
                [],
            )?;
            conn.execute(
                "INSERT INTO scores VALUES ('RWD', 'Hakone', 'Club Circuit', 'bob', 3)",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        let (board, dropped) = db.load(&catalog).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(board.len(), 1);
    }
}
