use std::{error::Error, fmt::Debug};

use diesel::{r2d2::ConnectionManager, PgConnection};
use r2d2::{Pool, PooledConnection};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::telemetry::spawn_blocking_with_tracing;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn error_fmt_chain(f: &mut std::fmt::Formatter<'_>, source: &Option<impl Error>) -> std::fmt::Result{
    if let Some(error) = source{
        write!(f, "\n\tCaused By:\n\t")?;
        write!(f, "{:?}", &error)?;
        error_fmt_chain(f, &error.source())
    } else {
        Ok(())
    }
}

pub async fn get_pooled_connection(
    pool: &DbPool
) -> Result<DbConnection, PoolGetError>{
    let pool_clone = pool.clone();

    let res = spawn_blocking_with_tracing(move || {
        pool_clone.get()
    })
    .await??;

    Ok(res)
}

#[derive(Error)]
pub enum PoolGetError{
    #[error("Failed due to threadpool error")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to get connection from pool")]
    DbPoolError(#[from] r2d2::Error),
}

impl Debug for PoolGetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

// Query parameters shared by every paginated listing
#[derive(Deserialize, Debug, Validate, Clone, Copy)]
pub struct PageQuery{
    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: i64
}

fn default_page() -> i64 { 1 }
fn default_limit() -> i64 { 20 }

impl PageQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}
