// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable persistence plus the cache-aside read/write path for the message
//! aggregate.
//!
//! Reads check the cache first and fall back to SQLite, repopulating on miss.
//! Every mutation writes to SQLite first and then refreshes the cache
//! best-effort: a refresh failure never fails the operation (the cache is a
//! read accelerator, not the source of truth) but is logged and counted so
//! silent divergence stays detectable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use courier_core::{
    CourierError, KvCache, Message, MessageFilter, MetricsSink, ProviderName, Target,
    timestamp_sentinel,
};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::{Database, map_tr_err};

/// Fixed cache TTL for the message aggregate.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CACHE_REFRESH_FAILED: &str = "courier_cache_refresh_failed_total";

const SELECT_COLUMNS: &str = "id, customer_id, type, source, targets, provider_name, \
     provider_reference_id, text, medias, direction, tm_create, tm_update, tm_delete";

/// Partial field set for [`MessageStore::update`]. Unset fields are left
/// untouched; an entirely empty update is a safe no-write.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    pub provider_name: Option<ProviderName>,
    pub provider_reference_id: Option<String>,
    pub targets: Option<Vec<Target>>,
}

impl MessageUpdate {
    pub fn is_empty(&self) -> bool {
        self.provider_name.is_none()
            && self.provider_reference_id.is_none()
            && self.targets.is_none()
    }
}

/// Durable store for the message aggregate with a cache-aside contract.
pub struct MessageStore {
    db: Database,
    cache: Arc<dyn KvCache>,
    metrics: Arc<dyn MetricsSink>,
}

impl MessageStore {
    pub fn new(db: Database, cache: Arc<dyn KvCache>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { db, cache, metrics }
    }

    /// Insert a new message. Stamps `tm_create` to now and the update/delete
    /// timestamps to the "not set" sentinel, then refreshes the cache
    /// best-effort. Returns the persisted record.
    pub async fn create(&self, mut msg: Message) -> Result<Message, CourierError> {
        msg.tm_create = Utc::now();
        msg.tm_update = timestamp_sentinel();
        msg.tm_delete = timestamp_sentinel();

        let row = MessageRow::try_from(&msg)?;
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages (id, customer_id, type, source, targets, \
                     provider_name, provider_reference_id, text, medias, direction, \
                     tm_create, tm_update, tm_delete) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    rusqlite::params![
                        row.id,
                        row.customer_id,
                        row.message_type,
                        row.source,
                        row.targets,
                        row.provider_name,
                        row.provider_reference_id,
                        row.text,
                        row.medias,
                        row.direction,
                        row.tm_create,
                        row.tm_update,
                        row.tm_delete,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.cache_refresh(&msg).await;
        Ok(msg)
    }

    /// Cache-first read. A cache miss or cache error falls back to SQLite
    /// and repopulates the cache best-effort.
    pub async fn get(&self, id: Uuid) -> Result<Message, CourierError> {
        let key = cache_key(id);
        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Message>(&bytes) {
                Ok(msg) => return Ok(msg),
                Err(e) => {
                    warn!(%id, error = %e, "cached message failed to deserialize, treating as miss");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(%id, error = %e, "cache read failed, falling back to store");
            }
        }

        let msg = self.db_get(id).await?;
        self.cache_refresh(&msg).await;
        Ok(msg)
    }

    /// List messages with creation time strictly before `token` (defaults to
    /// now), newest first, bounded by `limit` and constrained by exact-match
    /// filters.
    pub async fn list(
        &self,
        token: Option<DateTime<Utc>>,
        limit: u64,
        filters: &[MessageFilter],
    ) -> Result<Vec<Message>, CourierError> {
        let token = fmt_ts(token.unwrap_or_else(Utc::now));

        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM messages WHERE tm_create < ?1"
        );
        let mut params: Vec<Value> = vec![Value::Text(token)];
        for filter in filters {
            let idx = params.len() + 1;
            match filter {
                MessageFilter::CustomerId(id) => {
                    sql.push_str(&format!(" AND customer_id = ?{idx}"));
                    params.push(Value::Text(id.to_string()));
                }
                MessageFilter::Deleted(true) => {
                    sql.push_str(&format!(" AND tm_delete != ?{idx}"));
                    params.push(Value::Text(fmt_ts(timestamp_sentinel())));
                }
                MessageFilter::Deleted(false) => {
                    sql.push_str(&format!(" AND tm_delete = ?{idx}"));
                    params.push(Value::Text(fmt_ts(timestamp_sentinel())));
                }
                MessageFilter::Direction(d) => {
                    sql.push_str(&format!(" AND direction = ?{idx}"));
                    params.push(Value::Text(d.to_string()));
                }
                MessageFilter::ProviderName(p) => {
                    sql.push_str(&format!(" AND provider_name = ?{idx}"));
                    params.push(Value::Text(p.to_string()));
                }
            }
        }
        let idx = params.len() + 1;
        sql.push_str(&format!(" ORDER BY tm_create DESC LIMIT ?{idx}"));
        params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let rows: Vec<MessageRow> = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let mapped = stmt.query_map(params_from_iter(params), MessageRow::from_row)?;
                let mut rows = Vec::new();
                for row in mapped {
                    rows.push(row?);
                }
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        rows.iter().map(Message::try_from).collect()
    }

    /// Merge a partial field set onto the row, auto-stamping `tm_update`,
    /// then refresh the cache. An empty update writes nothing.
    pub async fn update(&self, id: Uuid, update: MessageUpdate) -> Result<(), CourierError> {
        if update.is_empty() {
            debug!(%id, "empty update, skipping write");
            return Ok(());
        }

        let mut sets = vec!["tm_update = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(fmt_ts(Utc::now()))];
        if let Some(provider) = update.provider_name {
            params.push(Value::Text(provider.to_string()));
            sets.push(format!("provider_name = ?{}", params.len()));
        }
        if let Some(reference) = update.provider_reference_id {
            params.push(Value::Text(reference));
            sets.push(format!("provider_reference_id = ?{}", params.len()));
        }
        if let Some(targets) = &update.targets {
            let json = serde_json::to_string(targets)
                .map_err(|e| CourierError::Internal(format!("serialize targets: {e}")))?;
            params.push(Value::Text(json));
            sets.push(format!("targets = ?{}", params.len()));
        }
        params.push(Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE messages SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );

        let changed = self
            .db
            .connection()
            .call(move |conn| Ok(conn.execute(&sql, params_from_iter(params))?))
            .await
            .map_err(map_tr_err)?;
        if changed == 0 {
            return Err(CourierError::NotFound(id));
        }

        let msg = self.db_get(id).await?;
        self.cache_refresh(&msg).await;
        Ok(())
    }

    /// Soft delete: stamp `tm_update` and `tm_delete` to now. Idempotent in
    /// effect; re-invoking advances the timestamps but the deleted predicate
    /// stays true. Returns the stamped record.
    pub async fn delete(&self, id: Uuid) -> Result<Message, CourierError> {
        let now = fmt_ts(Utc::now());
        let changed = self
            .db
            .connection()
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE messages SET tm_update = ?1, tm_delete = ?1 WHERE id = ?2",
                    rusqlite::params![now, id.to_string()],
                )?)
            })
            .await
            .map_err(map_tr_err)?;
        if changed == 0 {
            return Err(CourierError::NotFound(id));
        }

        let msg = self.db_get(id).await?;
        self.cache_refresh(&msg).await;
        Ok(msg)
    }

    async fn db_get(&self, id: Uuid) -> Result<Message, CourierError> {
        let row: Option<MessageRow> = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM messages WHERE id = ?1"
                ))?;
                let mut rows =
                    stmt.query_map([id.to_string()], MessageRow::from_row)?;
                match rows.next() {
                    Some(row) => Ok(Some(row?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(map_tr_err)?;

        match row {
            Some(row) => Message::try_from(&row),
            None => Err(CourierError::NotFound(id)),
        }
    }

    /// Best-effort cache write. Failures are logged and counted, never
    /// surfaced: a stale or missing cache entry self-heals on the next read.
    async fn cache_refresh(&self, msg: &Message) {
        let bytes = match serde_json::to_vec(msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(id = %msg.id, error = %e, "message failed to serialize for cache");
                self.metrics
                    .incr_counter(CACHE_REFRESH_FAILED, &[("op", "serialize".into())]);
                return;
            }
        };
        if let Err(e) = self.cache.set(&cache_key(msg.id), bytes, CACHE_TTL).await {
            warn!(id = %msg.id, error = %e, "cache refresh failed, entry may be stale");
            self.metrics
                .incr_counter(CACHE_REFRESH_FAILED, &[("op", "set".into())]);
        }
    }
}

fn cache_key(id: Uuid) -> String {
    format!("message:{id}")
}

/// Fixed-width timestamp encoding; lexicographic order matches chronological
/// order, which the creation-time pagination token relies on.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, CourierError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CourierError::Internal(format!("invalid stored timestamp {raw:?}: {e}")))
}

/// Raw column values for one row of the `messages` table.
struct MessageRow {
    id: String,
    customer_id: String,
    message_type: String,
    source: String,
    targets: String,
    provider_name: Option<String>,
    provider_reference_id: Option<String>,
    text: String,
    medias: String,
    direction: String,
    tm_create: String,
    tm_update: String,
    tm_delete: String,
}

impl MessageRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            message_type: row.get(2)?,
            source: row.get(3)?,
            targets: row.get(4)?,
            provider_name: row.get(5)?,
            provider_reference_id: row.get(6)?,
            text: row.get(7)?,
            medias: row.get(8)?,
            direction: row.get(9)?,
            tm_create: row.get(10)?,
            tm_update: row.get(11)?,
            tm_delete: row.get(12)?,
        })
    }
}

impl TryFrom<&Message> for MessageRow {
    type Error = CourierError;

    fn try_from(msg: &Message) -> Result<Self, CourierError> {
        let err = |e: serde_json::Error| CourierError::Internal(format!("serialize message: {e}"));
        Ok(Self {
            id: msg.id.to_string(),
            customer_id: msg.customer_id.to_string(),
            message_type: msg.message_type.to_string(),
            source: serde_json::to_string(&msg.source).map_err(err)?,
            targets: serde_json::to_string(&msg.targets).map_err(err)?,
            provider_name: msg.provider_name.map(|p| p.to_string()),
            provider_reference_id: msg.provider_reference_id.clone(),
            text: msg.text.clone(),
            medias: serde_json::to_string(&msg.medias).map_err(err)?,
            direction: msg.direction.to_string(),
            tm_create: fmt_ts(msg.tm_create),
            tm_update: fmt_ts(msg.tm_update),
            tm_delete: fmt_ts(msg.tm_delete),
        })
    }
}

impl TryFrom<&MessageRow> for Message {
    type Error = CourierError;

    fn try_from(row: &MessageRow) -> Result<Self, CourierError> {
        use std::str::FromStr;

        let parse_err =
            |field: &str, e: &dyn std::fmt::Display| CourierError::Internal(format!("invalid stored {field}: {e}"));
        Ok(Self {
            id: Uuid::parse_str(&row.id).map_err(|e| parse_err("id", &e))?,
            customer_id: Uuid::parse_str(&row.customer_id)
                .map_err(|e| parse_err("customer_id", &e))?,
            message_type: FromStr::from_str(&row.message_type)
                .map_err(|e: strum::ParseError| parse_err("type", &e))?,
            source: serde_json::from_str(&row.source).map_err(|e| parse_err("source", &e))?,
            targets: serde_json::from_str(&row.targets).map_err(|e| parse_err("targets", &e))?,
            provider_name: row
                .provider_name
                .as_deref()
                .map(FromStr::from_str)
                .transpose()
                .map_err(|e: strum::ParseError| parse_err("provider_name", &e))?,
            provider_reference_id: row.provider_reference_id.clone(),
            text: row.text.clone(),
            medias: serde_json::from_str(&row.medias).map_err(|e| parse_err("medias", &e))?,
            direction: FromStr::from_str(&row.direction)
                .map_err(|e: strum::ParseError| parse_err("direction", &e))?,
            tm_create: parse_ts(&row.tm_create)?,
            tm_update: parse_ts(&row.tm_update)?,
            tm_delete: parse_ts(&row.tm_delete)?,
        })
    }
}
