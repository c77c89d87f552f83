use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Row, Transaction};

use crate::db::{
    helpers::{conversion_error, format_timestamp, parse_datetime, to_u64},
    migrations::recreate_readings_table,
    models::{Reading, SLOT_COUNT},
    Database,
};

const READING_COLUMNS: &str = "entry_id, ts_utc, slot_1, slot_2, slot_3, slot_4, slot_5, slot_6, slot_7, slot_8, occupied";

// Stays well under SQLITE_MAX_VARIABLE_NUMBER on older builds.
const EXISTING_ID_CHUNK: usize = 500;

fn row_to_reading(row: &Row) -> Result<Reading, rusqlite::Error> {
    let ts_str: String = row.get("ts_utc")?;

    let mut slot_states = [0_i64; SLOT_COUNT];
    for (index, slot) in slot_states.iter_mut().enumerate() {
        let column = format!("slot_{}", index + 1);
        *slot = row.get(column.as_str())?;
    }

    Ok(Reading {
        entry_id: row.get("entry_id")?,
        timestamp: parse_datetime(&ts_str, "ts_utc").map_err(conversion_error)?,
        slot_states,
        occupied: row.get("occupied")?,
    })
}

/// Inserts inside the caller's transaction. Rows whose `entry_id` already exists
/// are skipped by the primary key, so the return value counts only new rows.
fn insert_rows(tx: &Transaction<'_>, readings: &[Reading]) -> Result<usize> {
    let mut stmt = tx.prepare_cached(&format!(
        "INSERT OR IGNORE INTO readings ({READING_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ))?;

    let mut inserted = 0;
    for reading in readings {
        let s = &reading.slot_states;
        inserted += stmt
            .execute(params![
                reading.entry_id,
                format_timestamp(&reading.timestamp),
                s[0],
                s[1],
                s[2],
                s[3],
                s[4],
                s[5],
                s[6],
                s[7],
                reading.occupied,
            ])
            .with_context(|| format!("failed to insert reading {}", reading.entry_id))?;
    }

    Ok(inserted)
}

impl Database {
    /// Appends readings in one transaction and returns how many were new.
    pub async fn insert_many(&self, readings: &[Reading]) -> Result<usize> {
        if readings.is_empty() {
            return Ok(0);
        }

        let readings = readings.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let inserted = insert_rows(&tx, &readings)?;
            tx.commit().context("failed to commit readings batch")?;
            Ok(inserted)
        })
        .await
    }

    /// Readings with `ts_utc >= since`, oldest first.
    pub async fn select_since(&self, since: DateTime<Utc>) -> Result<Vec<Reading>> {
        let since = format_timestamp(&since);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {READING_COLUMNS}
                 FROM readings
                 WHERE ts_utc >= ?1
                 ORDER BY ts_utc ASC, entry_id ASC"
            ))?;

            let readings = stmt
                .query_map(params![since], row_to_reading)?
                .collect::<Result<Vec<_>, _>>()
                .context("failed to load readings window")?;

            Ok(readings)
        })
        .await
    }

    /// The subset of `candidate_ids` already stored.
    pub async fn select_existing_ids(&self, candidate_ids: &[i64]) -> Result<HashSet<i64>> {
        if candidate_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let candidate_ids = candidate_ids.to_vec();
        self.execute(move |conn| {
            let mut existing = HashSet::new();

            for chunk in candidate_ids.chunks(EXISTING_ID_CHUNK) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let mut stmt = conn.prepare(&format!(
                    "SELECT entry_id FROM readings WHERE entry_id IN ({placeholders})"
                ))?;

                let ids = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    row.get::<_, i64>(0)
                })?;
                for id in ids {
                    existing.insert(id?);
                }
            }

            Ok(existing)
        })
        .await
    }

    pub async fn latest_reading(&self) -> Result<Option<Reading>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {READING_COLUMNS}
                 FROM readings
                 ORDER BY ts_utc DESC, entry_id DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_reading(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn count_readings(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
            to_u64(count, "readings count")
        })
        .await
    }

    /// Drops and recreates the table, then loads `readings`, all in one
    /// transaction. Any failure rolls back and leaves the previous contents.
    pub async fn replace_all(&self, readings: Vec<Reading>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open reset transaction")?;
            recreate_readings_table(&tx)?;
            let inserted = insert_rows(&tx, &readings)?;
            tx.commit().context("failed to commit reset")?;
            Ok(inserted)
        })
        .await
    }
}
