use netmeter_core::BUCKET_SIZE_MS;
use rusqlite::{Connection, OptionalExtension, params};

use crate::Db;
use crate::error::{DbError, Result};
use crate::settings::BUCKET_SIZE_KEY;

const MIGRATION_0001: &str = include_str!("../migrations/0001_init.sql");

const MIGRATIONS: &[(&str, &str)] = &[("0001_init", MIGRATION_0001)];

impl Db {
    /// Applies the schema and pins the bucket size the stored windows were cut with.
    pub fn migrate(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (_name, sql) in MIGRATIONS {
            tx.execute_batch(sql)?;
        }
        ensure_bucket_size(&tx, BUCKET_SIZE_MS)?;
        tx.commit()?;
        Ok(())
    }
}

fn ensure_bucket_size(conn: &Connection, expected: i64) -> Result<()> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM app_setting WHERE key = ?1",
            params![BUCKET_SIZE_KEY],
            |row| row.get(0),
        )
        .optional()?;
    match stored {
        None => {
            conn.execute(
                "INSERT INTO app_setting (key, value) VALUES (?1, ?2)",
                params![BUCKET_SIZE_KEY, expected.to_string()],
            )?;
            Ok(())
        }
        Some(value) => {
            let stored = value.trim().parse::<i64>().unwrap_or(-1);
            if stored == expected {
                Ok(())
            } else {
                Err(DbError::BucketSizeMismatch { stored, expected })
            }
        }
    }
}
