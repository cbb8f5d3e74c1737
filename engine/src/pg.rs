//! PostgreSQL full-text search backend.

use crate::config::Credentials;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::query::SearchQuery;
use crate::search::SearchEngine;
use crate::Document;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column, Connection, Row};
use tokio::runtime::Runtime;

/// Blocking handle on one engine connection.
///
/// The connection lives for one run. Every `fetch` opens its own read-only
/// transaction which is rolled back before returning; an early return drops
/// the transaction guard, which rolls back as well.
pub struct PgEngine {
    runtime: Runtime,
    conn: Option<PgConnection>,
    dbname: String,
}

impl PgEngine {
    pub fn connect(ctx: &Context, creds: &Credentials) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&creds.host)
            .port(creds.port)
            .username(&creds.user)
            .password(&creds.password)
            .database(&creds.dbname);
        Self::connect_with(ctx, &options)
    }

    /// Connect from a `postgres://` URL.
    pub fn connect_url(ctx: &Context, url: &str) -> Result<Self> {
        let options: PgConnectOptions = url.parse().map_err(|e| Error::Config(format!("invalid database url: {e}")))?;
        Self::connect_with(ctx, &options)
    }

    pub fn connect_with(ctx: &Context, options: &PgConnectOptions) -> Result<Self> {
        let _guard = ctx.span().enter();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let dbname = options.get_database().unwrap_or_default().to_string();

        let conn = runtime.block_on(PgConnection::connect_with(options)).map_err(|source| {
            tracing::error!(%dbname, "failed to connect");
            Error::Connection { dbname: dbname.clone(), source }
        })?;
        tracing::info!(%dbname, "established connection with database");
        Ok(Self { runtime, conn: Some(conn), dbname })
    }

    pub fn close(mut self, ctx: &Context) -> Result<()> {
        let _guard = ctx.span().enter();
        if let Some(conn) = self.conn.take() {
            self.runtime.block_on(conn.close())?;
            tracing::info!(dbname = %self.dbname, "connection to database closed");
        }
        Ok(())
    }
}

impl SearchEngine for PgEngine {
    fn fetch(&mut self, query: &SearchQuery, limit: usize) -> Result<Vec<Document>> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Error::Precondition("connection already closed".into()))?;
        let sql = query.to_sql();
        tracing::debug!(%sql, limit, "executing search");

        self.runtime.block_on(async {
            let mut tx = conn.begin().await?;
            sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await?;

            let mut docs = Vec::with_capacity(limit);
            {
                let mut rows = sqlx::query(&sql).bind(&query.text).bind(limit as i64).fetch(&mut *tx);
                while docs.len() < limit {
                    match rows.try_next().await? {
                        Some(row) => docs.push(document_from_row(&row)?),
                        None => break,
                    }
                }
            }
            tx.rollback().await?;
            Ok::<_, Error>(docs)
        })
    }
}

/// Columns left out of the query and NULLs decode as empty strings. A selected
/// column of the wrong type is a query failure, as is a missing `rank`.
fn document_from_row(row: &PgRow) -> Result<Document> {
    let text = |name: &str| -> Result<String> {
        if !row.columns().iter().any(|c| c.name() == name) {
            return Ok(String::new());
        }
        Ok(row.try_get::<Option<String>, _>(name)?.unwrap_or_default())
    };
    let rank: f64 = row.try_get("rank")?;
    Ok(Document { title: text("title")?, filepath: text("filepath")?, rank })
}
