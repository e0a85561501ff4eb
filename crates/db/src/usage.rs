use netmeter_core::{Entity, Transport, UsageKey, UsageRecord};
use rusqlite::{OptionalExtension, params};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{RECORD_COLUMNS, bytes_to_sql, row_to_usage_record};

impl Db {
    pub fn find_usage(&self, key: &UsageKey) -> Result<Option<UsageRecord>> {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM network_usage
            WHERE transport = ?1
              AND uid = ?2
              AND window_start = ?3
              AND window_end = ?4
            LIMIT 1
            "#
        );
        self.conn
            .query_row(
                &sql,
                params![
                    key.transport.as_str(),
                    key.entity.uid(),
                    key.window.start,
                    key.window.end
                ],
                row_to_usage_record,
            )
            .optional()
            .map_err(DbError::from)
    }

    /// Inserts the record, replacing the values of an existing row with the same key.
    pub fn upsert_usage(&self, record: &UsageRecord) -> Result<()> {
        let rx_bytes = bytes_to_sql(record.rx_bytes)?;
        let tx_bytes = bytes_to_sql(record.tx_bytes)?;
        self.conn.execute(
            r#"
            INSERT INTO network_usage (
              transport, uid, app_name, window_start, window_end, rx_bytes, tx_bytes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(transport, uid, window_start, window_end) DO UPDATE SET
              app_name = excluded.app_name,
              rx_bytes = excluded.rx_bytes,
              tx_bytes = excluded.tx_bytes
            "#,
            params![
                record.transport.as_str(),
                record.entity.uid(),
                record.display_name,
                record.window.start,
                record.window.end,
                rx_bytes,
                tx_bytes,
            ],
        )?;
        Ok(())
    }

    pub fn list_usage(&self) -> Result<Vec<UsageRecord>> {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM network_usage
            ORDER BY window_start DESC, transport ASC, uid ASC
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_usage_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_usage_for(
        &self,
        transport: Transport,
        entity: Entity,
    ) -> Result<Vec<UsageRecord>> {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM network_usage
            WHERE transport = ?1 AND uid = ?2
            ORDER BY window_start DESC
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![transport.as_str(), entity.uid()], row_to_usage_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_usage(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM network_usage", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn clear_usage(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM network_usage", [])?)
    }
}
