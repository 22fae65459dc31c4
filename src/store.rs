/// Durable user and subscription storage.
///
/// Backs the subscribe/unsubscribe commands and the daily broadcast with an
/// embedded SQLite database. Connections are short-lived: every operation
/// opens one, runs inside it, and closes it — no transaction ever spans two
/// operations, and each operation is atomic with respect to the file.
///
/// Referential integrity: a subscription row never references a missing
/// user. `ON DELETE CASCADE` removes a user's subscriptions with the user,
/// and `PRAGMA foreign_keys` is enabled on every connection (SQLite leaves
/// it off by default).

use crate::model::PersistenceError;
use rusqlite::{Connection, params};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id    INTEGER PRIMARY KEY,
        first_name TEXT,
        username   TEXT,
        chat_id    INTEGER
    );

    CREATE TABLE IF NOT EXISTS subscriptions (
        user_id INTEGER NOT NULL,
        station TEXT NOT NULL,
        PRIMARY KEY (user_id, station),
        FOREIGN KEY (user_id) REFERENCES users (user_id) ON DELETE CASCADE
    );
";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A messaging-platform user known to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Platform-assigned id; unique and stable across sessions.
    pub user_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    /// Destination the broadcast sends to. Latest write wins when a user
    /// re-initiates under a new chat.
    pub chat_id: i64,
}

/// One entry of the broadcast snapshot: a user together with every station
/// they are subscribed to.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub first_name: String,
    pub username: Option<String>,
    pub chat_id: i64,
    pub stations: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct SubscriptionStore {
    db_path: PathBuf,
}

impl SubscriptionStore {
    /// Open the store at `path`, creating the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let store = SubscriptionStore {
            db_path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, PersistenceError> {
        let conn = Connection::open(&self.db_path)
            .map_err(|e| PersistenceError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| PersistenceError::Connection(e.to_string()))?;
        Ok(conn)
    }

    // -- users --------------------------------------------------------------

    /// Insert or replace a user record, keyed by `user_id`. Idempotent;
    /// repeating with a new `chat_id` keeps one row carrying the new value.
    ///
    /// This must be a true upsert, not `INSERT OR REPLACE`: REPLACE deletes
    /// the conflicting row first, which would fire the subscription cascade
    /// every time a known user re-initiates.
    pub fn upsert_user(&self, user: &User) -> Result<(), PersistenceError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (user_id, first_name, username, chat_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id) DO UPDATE SET
                 first_name = excluded.first_name,
                 username = excluded.username,
                 chat_id = excluded.chat_id",
            params![user.user_id, user.first_name, user.username, user.chat_id],
        )
        .map_err(|e| PersistenceError::Query(e.to_string()))?;
        Ok(())
    }

    /// Fetch one user, or `None` if unknown.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>, PersistenceError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT user_id, first_name, username, chat_id FROM users WHERE user_id = ?1")
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        let mut rows = stmt
            .query_map(params![user_id], |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    first_name: row.get(1)?,
                    username: row.get(2)?,
                    chat_id: row.get(3)?,
                })
            })
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        match rows.next() {
            Some(row) => row
                .map(Some)
                .map_err(|e| PersistenceError::Query(e.to_string())),
            None => Ok(None),
        }
    }

    /// All known users, keyed by id, whether subscribed or not.
    pub fn get_all_users(&self) -> Result<BTreeMap<i64, User>, PersistenceError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT user_id, first_name, username, chat_id FROM users")
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    first_name: row.get(1)?,
                    username: row.get(2)?,
                    chat_id: row.get(3)?,
                })
            })
            .map_err(|e| PersistenceError::Query(e.to_string()))?;

        let mut users = BTreeMap::new();
        for row in rows {
            let user = row.map_err(|e| PersistenceError::Query(e.to_string()))?;
            users.insert(user.user_id, user);
        }
        Ok(users)
    }

    /// Delete a user; their subscriptions cascade away with them.
    pub fn delete_user(&self, user_id: i64) -> Result<(), PersistenceError> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        Ok(())
    }

    /// Point an existing user at a new chat destination.
    pub fn update_chat_id(&self, user_id: i64, new_chat_id: i64) -> Result<(), PersistenceError> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE users SET chat_id = ?1 WHERE user_id = ?2",
            params![new_chat_id, user_id],
        )
        .map_err(|e| PersistenceError::Query(e.to_string()))?;
        Ok(())
    }

    // -- subscriptions ------------------------------------------------------

    /// Subscribe a user to a station. Subscribing twice is a no-op.
    pub fn subscribe(&self, user_id: i64, station: &str) -> Result<(), PersistenceError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR IGNORE INTO subscriptions (user_id, station) VALUES (?1, ?2)",
            params![user_id, station],
        )
        .map_err(|e| PersistenceError::Query(e.to_string()))?;
        Ok(())
    }

    /// Unsubscribe a user from a station. Unsubscribing when not subscribed
    /// is a no-op, not an error.
    pub fn unsubscribe(&self, user_id: i64, station: &str) -> Result<(), PersistenceError> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM subscriptions WHERE user_id = ?1 AND station = ?2",
            params![user_id, station],
        )
        .map_err(|e| PersistenceError::Query(e.to_string()))?;
        Ok(())
    }

    pub fn is_subscribed(&self, user_id: i64, station: &str) -> Result<bool, PersistenceError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT 1 FROM subscriptions WHERE user_id = ?1 AND station = ?2")
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        stmt.exists(params![user_id, station])
            .map_err(|e| PersistenceError::Query(e.to_string()))
    }

    /// The stations a user is subscribed to, in name order.
    pub fn list_stations_for_user(&self, user_id: i64) -> Result<BTreeSet<String>, PersistenceError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT station FROM subscriptions WHERE user_id = ?1")
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(|e| PersistenceError::Query(e.to_string()))?;

        let mut stations = BTreeSet::new();
        for row in rows {
            stations.insert(row.map_err(|e| PersistenceError::Query(e.to_string()))?);
        }
        Ok(stations)
    }

    /// Snapshot of every subscribed user with their complete station set.
    ///
    /// Runs as a single JOIN on one connection, so the result is consistent:
    /// no user appears with a partial station set. Users without any
    /// subscription do not appear at all. Iteration order is deterministic
    /// (ids ascending, stations in name order) so a broadcast run visits
    /// pairs in a stable order.
    pub fn list_all_subscriptions(&self) -> Result<BTreeMap<i64, Subscriber>, PersistenceError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT u.user_id, u.first_name, u.username, u.chat_id, s.station
                 FROM users u
                 JOIN subscriptions s ON u.user_id = s.user_id",
            )
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| PersistenceError::Query(e.to_string()))?;

        let mut subscribers: BTreeMap<i64, Subscriber> = BTreeMap::new();
        for row in rows {
            let (user_id, first_name, username, chat_id, station) =
                row.map_err(|e| PersistenceError::Query(e.to_string()))?;
            subscribers
                .entry(user_id)
                .or_insert_with(|| Subscriber {
                    first_name,
                    username,
                    chat_id,
                    stations: BTreeSet::new(),
                })
                .stations
                .insert(station);
        }
        Ok(subscribers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
//
// Full store behavior (idempotency, cascade, snapshot consistency) lives in
// tests/subscription_store.rs on throwaway database files.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_schema_and_is_reopenable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("subs.db");

        let store = SubscriptionStore::open(&path).expect("first open");
        store
            .upsert_user(&User {
                user_id: 1,
                first_name: "Dara".to_string(),
                username: None,
                chat_id: 100,
            })
            .expect("upsert");
        drop(store);

        // Second open must see the same file, not recreate an empty one.
        let reopened = SubscriptionStore::open(&path).expect("second open");
        let user = reopened.get_user(1).expect("query").expect("user persisted");
        assert_eq!(user.chat_id, 100);
    }
}
