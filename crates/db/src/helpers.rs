use netmeter_core::{BucketWindow, Entity, Transport, UsageRecord};
use rusqlite::Row;
use rusqlite::types::Type;

use crate::error::{DbError, Result};

pub(crate) const RECORD_COLUMNS: &str =
    "transport, uid, app_name, window_start, window_end, rx_bytes, tx_bytes";

pub(crate) fn row_to_usage_record(
    row: &Row<'_>,
) -> std::result::Result<UsageRecord, rusqlite::Error> {
    let transport: String = row.get(0)?;
    let transport = transport
        .parse::<Transport>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
    let uid: i64 = row.get(1)?;
    let entity =
        Entity::from_uid(uid).ok_or(rusqlite::Error::IntegralValueOutOfRange(1, uid))?;
    Ok(UsageRecord {
        transport,
        entity,
        display_name: row.get(2)?,
        window: BucketWindow {
            start: row.get(3)?,
            end: row.get(4)?,
        },
        rx_bytes: column_bytes(row, 5)?,
        tx_bytes: column_bytes(row, 6)?,
    })
}

fn column_bytes(row: &Row<'_>, idx: usize) -> std::result::Result<u64, rusqlite::Error> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

pub(crate) fn bytes_to_sql(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| DbError::ByteCountOverflow(value))
}
