//! Stored response CRUD operations.
//!
//! Responses are written into a bucket under a request-derived key and can be
//! matched within one bucket or across every bucket.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response held in a cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Request URL the entry is stored under.
    pub url: String,
    pub status_code: u16,
    /// Response type as exposed to pages: `basic`, `cors` or `opaque`.
    pub response_type: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

const SELECT_COLUMNS: &str = "e.url, e.status_code, e.response_type, e.headers_json, e.body, e.stored_at";

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CachedResponse, String)> {
    let status: i64 = row.get(1)?;
    let headers_json: String = row.get(3)?;
    Ok((
        CachedResponse {
            url: row.get(0)?,
            status_code: u16::try_from(status).unwrap_or_default(),
            response_type: row.get(2)?,
            headers: Vec::new(),
            body: row.get(4)?,
            stored_at: row.get(5)?,
        },
        headers_json,
    ))
}

fn decode(found: Option<(CachedResponse, String)>) -> Result<Option<CachedResponse>, Error> {
    match found {
        Some((mut response, headers_json)) => {
            response.headers =
                serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{}: {e}", response.url)))?;
            Ok(Some(response))
        }
        None => Ok(None),
    }
}

impl CacheDb {
    /// Store a response in a bucket, replacing any previous entry for the same request.
    ///
    /// Opens the bucket if it does not exist yet.
    pub async fn put_entry(&self, bucket: &str, method: &str, response: &CachedResponse) -> Result<(), Error> {
        self.put_entries(bucket, method, std::slice::from_ref(response)).await
    }

    /// Store several responses in one transaction: either all are written or none are.
    pub async fn put_entries(&self, bucket: &str, method: &str, responses: &[CachedResponse]) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let rows = responses
            .iter()
            .map(|response| {
                let headers_json = serde_json::to_string(&response.headers)
                    .map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;
                Ok((compute_cache_key(method, &response.url), headers_json, response.clone()))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, now],
                )?;
                for (key, headers_json, response) in &rows {
                    tx.execute(
                        "INSERT INTO cache_entries (
                            bucket, key, url, status_code, response_type, headers_json, body, stored_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        ON CONFLICT(bucket, key) DO UPDATE SET
                            url = excluded.url,
                            status_code = excluded.status_code,
                            response_type = excluded.response_type,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                        params![
                            &bucket,
                            key,
                            &response.url,
                            response.status_code as i64,
                            &response.response_type,
                            headers_json,
                            &response.body,
                            &response.stored_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a response in one bucket.
    pub async fn match_entry(&self, bucket: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let bucket = bucket.to_string();
        let key = compute_cache_key(method, url);
        let found = self
            .conn
            .call(move |conn| -> Result<Option<(CachedResponse, String)>, Error> {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM cache_entries e WHERE e.bucket = ?1 AND e.key = ?2");
                let result = conn.query_row(&sql, params![bucket, key], row_to_response);
                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;
        decode(found)
    }

    /// Look up a response across all buckets, oldest bucket first.
    pub async fn match_any(&self, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let key = compute_cache_key(method, url);
        let found = self
            .conn
            .call(move |conn| -> Result<Option<(CachedResponse, String)>, Error> {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM cache_entries e
                     JOIN cache_buckets b ON b.name = e.bucket
                     WHERE e.key = ?1
                     ORDER BY b.rowid ASC
                     LIMIT 1"
                );
                let result = conn.query_row(&sql, params![key], row_to_response);
                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;
        decode(found)
    }

    /// Number of entries stored in a bucket.
    pub async fn count_entries(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
