use log::trace;
use sqlx::{
    query,
    sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow},
    ConnectOptions, Error as SqlError, Row,
};
use std::str::FromStr;

mod drafts;
mod kv;
mod migrations;
mod seen;
mod topics_cache;
pub(crate) use self::drafts::*;
pub(crate) use self::kv::*;
pub(crate) use self::migrations::is_db_up_to_date;
use self::migrations::*;
pub(crate) use self::seen::*;
pub use self::seen::SeenEntry;
pub(crate) use self::topics_cache::*;

pub async fn create_connection(path: &str) -> Result<SqliteConnection, SqlError> {
    SqliteConnectOptions::from_str(path)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .connect()
        .await
}

pub async fn setup_new_db(connection: &mut SqliteConnection) -> Result<(), SqlError> {
    drop_tables(connection).await?;
    create_tables(connection).await?;
    create_indices(connection).await?;

    set_db_version(connection).await?;

    Ok(())
}

pub async fn setup_db(connection: &mut SqliteConnection) -> Result<(), SqlError> {
    set_pragmas(connection).await?;

    Ok(())
}

pub async fn check_db_integrity(connection: &mut SqliteConnection) -> Result<bool, SqlError> {
    let res: String = query("PRAGMA integrity_check")
        .map(|row: SqliteRow| -> String { row.get(0) })
        .fetch_one(connection)
        .await?;

    if res == "ok" {
        Ok(true)
    } else {
        Ok(false)
    }
}

async fn set_pragmas(connection: &mut SqliteConnection) -> Result<(), SqlError> {
    query("PRAGMA synchronous = NORMAL")
        .execute(&mut *connection)
        .await?;
    query("PRAGMA page_size = 4096")
        .execute(&mut *connection)
        .await?;
    Ok(())
}

async fn drop_tables(connection: &mut SqliteConnection) -> Result<(), SqlError> {
    trace!("Dropping stale tables");

    for table in ["migrations", "kv", "seen", "drafts", "topics_cache"] {
        query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *connection)
            .await?;
    }

    Ok(())
}

async fn create_tables(connection: &mut SqliteConnection) -> Result<(), SqlError> {
    create_migrations_tables(connection).await?;
    create_kv_tables(connection).await?;
    create_seen_tables(connection).await?;
    create_drafts_tables(connection).await?;
    create_topics_cache_tables(connection).await?;

    Ok(())
}

async fn create_indices(connection: &mut SqliteConnection) -> Result<(), SqlError> {
    create_drafts_indices(connection).await?;
    Ok(())
}
