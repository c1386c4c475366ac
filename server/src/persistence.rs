//! Durable copy of the score table.
//!
//! The in-memory store is authoritative. Every accepted mutation is followed
//! by a full flush; a failed flush is reported but never rolls the store back.

use crate::catalog::Catalog;
use crate::db::{self, Db};
use crate::error::PersistError;
use crate::store::{Board, ScoreStore};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Json,
    Sqlite,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { board: Board, dropped: usize },
    Empty,
    Corrupted(String),
}

enum Backend {
    Json(PathBuf),
    Sqlite(Db),
}

pub struct Persistence {
    backend: Backend,
    /// Serializes flushes so a stale copy never lands after a newer one.
    flush_lock: Mutex<()>,
}

impl Persistence {
    pub fn open(kind: StorageKind, path: &Path) -> Result<Self, PersistError> {
        let backend = match kind {
            StorageKind::Json => Backend::Json(path.to_path_buf()),
            StorageKind::Sqlite => {
                create_parent_dir(path)?;
                Backend::Sqlite(Db::open(path)?)
            }
        };
        Ok(Persistence {
            backend,
            flush_lock: Mutex::new(()),
        })
    }

    pub fn json(path: impl Into<PathBuf>) -> Self {
        Persistence {
            backend: Backend::Json(path.into()),
            flush_lock: Mutex::new(()),
        }
    }

    pub fn describe(&self) -> String {
        match &self.backend {
            Backend::Json(path) => format!("json:{}", path.display()),
            Backend::Sqlite(db) => match db.path() {
                Some(path) => format!("sqlite:{}", path.display()),
                None => "sqlite::memory:".to_string(),
            },
        }
    }

    /// Writes the store's current contents. The copy is taken under the
    /// flush lock, so whichever flush runs last writes the newest state.
    pub fn flush(&self, store: &ScoreStore) -> Result<(), PersistError> {
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_board(&store.contents())
    }

    fn write_board(&self, board: &Board) -> Result<(), PersistError> {
        match &self.backend {
            Backend::Json(path) => write_json(path, board),
            Backend::Sqlite(db) => {
                db.init_schema()?;
                db.save(board)?;
                Ok(())
            }
        }
    }

    /// Reads the durable record without repairing anything.
    pub fn load(&self, catalog: &Catalog) -> Result<LoadOutcome, PersistError> {
        match &self.backend {
            Backend::Json(path) => {
                let raw = match fs::read_to_string(path) {
                    Ok(raw) => raw,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Empty),
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        return Ok(LoadOutcome::Corrupted(e.to_string()))
                    }
                    Err(e) => return Err(e.into()),
                };
                match serde_json::from_str::<Board>(&raw) {
                    Ok(board) => {
                        let (board, dropped) = board.sanitized(catalog);
                        Ok(LoadOutcome::Loaded { board, dropped })
                    }
                    Err(e) => Ok(LoadOutcome::Corrupted(e.to_string())),
                }
            }
            Backend::Sqlite(db) => {
                let loaded = db
                    .has_scores_table()
                    .and_then(|exists| exists.then(|| db.load(catalog)).transpose());
                match loaded {
                    Ok(Some((board, dropped))) => Ok(LoadOutcome::Loaded { board, dropped }),
                    Ok(None) => Ok(LoadOutcome::Empty),
                    Err(e) if db::is_corruption(&e) => Ok(LoadOutcome::Corrupted(e.to_string())),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Startup load. Missing records are created, corrupted ones are
    /// overwritten with the empty table, and entries the catalog rejects are
    /// dropped and the cleaned record written back. A record that cannot be
    /// read at all is left untouched and the process serves an empty table.
    /// Failing to write a repair is logged.
    pub fn restore(&self, catalog: &Catalog) -> Board {
        let outcome = match self.load(catalog) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, storage = %self.describe(), "leaderboard record unreadable, serving an empty table");
                return Board::empty();
            }
        };
        match outcome {
            LoadOutcome::Loaded { board, dropped } => {
                if dropped > 0 {
                    tracing::warn!(dropped, "dropped invalid leaderboard entries");
                    self.rewrite(&board, false);
                }
                tracing::info!(entries = board.len(), storage = %self.describe(), "leaderboard loaded");
                board
            }
            LoadOutcome::Empty => {
                tracing::info!(storage = %self.describe(), "no leaderboard record, creating one");
                let board = Board::empty();
                self.rewrite(&board, false);
                board
            }
            LoadOutcome::Corrupted(reason) => {
                tracing::warn!(%reason, storage = %self.describe(), "corrupt leaderboard record, resetting");
                let board = Board::empty();
                self.rewrite(&board, true);
                board
            }
        }
    }

    fn rewrite(&self, board: &Board, discard: bool) {
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match &self.backend {
            Backend::Sqlite(db) if discard => db.recreate().and_then(|_| self.write_board(board)),
            _ => self.write_board(board),
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to write leaderboard record");
        }
    }
}

fn create_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Writes to a sibling temp file and renames it into place.
fn write_json(path: &Path, board: &Board) -> Result<(), PersistError> {
    let body = serde_json::to_string_pretty(board)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    create_parent_dir(path)?;
    let mut file = File::create(&tmp)?;
    file.write_all(body.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
