use log::trace;
use sqlx::{query, sqlite::SqliteRow, Error, Row, SqliteConnection};

pub const TOKEN_KEY: &str = "token";
pub const NOTIFIER_TIMESTAMP_KEY: &str = "notifier_timestamp";

pub async fn create_kv_tables(connection: &mut SqliteConnection) -> Result<(), Error> {
    trace!("Creating kv tables");

    query(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        ",
    )
    .execute(connection)
    .await?;

    Ok(())
}

pub async fn select_kv(
    connection: &mut SqliteConnection,
    key: &str,
) -> Result<Option<String>, Error> {
    query("SELECT value FROM kv WHERE key = ?")
        .bind(key)
        .map(|row: SqliteRow| row.get(0))
        .fetch_optional(connection)
        .await
}

pub async fn insert_or_update_kv(
    connection: &mut SqliteConnection,
    key: &str,
    value: &str,
) -> Result<(), Error> {
    let row: Option<String> = select_kv(&mut *connection, key).await?;

    if row.is_some() {
        query("UPDATE kv SET value = ? WHERE key = ?")
            .bind(value)
            .bind(key)
            .execute(connection)
            .await?;
    } else {
        query("INSERT INTO kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(connection)
            .await?;
    }

    Ok(())
}

pub async fn delete_kv(connection: &mut SqliteConnection, key: &str) -> Result<(), Error> {
    query("DELETE FROM kv WHERE key = ?")
        .bind(key)
        .execute(connection)
        .await?;

    Ok(())
}
