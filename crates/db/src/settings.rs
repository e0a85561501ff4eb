use netmeter_core::Transport;
use rusqlite::params;

use crate::Db;
use crate::error::Result;

pub(crate) const BUCKET_SIZE_KEY: &str = "bucket_size_ms";

fn bootstrap_key(transport: Transport) -> String {
    format!("bootstrap_initialized.{}", transport.as_str())
}

impl Db {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_setting WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get::<_, String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_setting (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM app_setting WHERE key = ?1", [key])?;
        Ok(())
    }

    pub fn is_bootstrapped(&self, transport: Transport) -> Result<bool> {
        let value = self.get_setting(&bootstrap_key(transport))?;
        Ok(matches!(value.as_deref(), Some("true")))
    }

    pub fn set_bootstrapped(&self, transport: Transport, done: bool) -> Result<()> {
        let key = bootstrap_key(transport);
        if done {
            self.set_setting(&key, "true")
        } else {
            self.delete_setting(&key)
        }
    }

    pub fn stored_bucket_size(&self) -> Result<Option<i64>> {
        Ok(self
            .get_setting(BUCKET_SIZE_KEY)?
            .and_then(|value| value.parse::<i64>().ok()))
    }
}
