use log::trace;
use sqlx::{query, sqlite::SqliteRow, Error, Row, SqliteConnection};

pub async fn create_topics_cache_tables(connection: &mut SqliteConnection) -> Result<(), Error> {
    trace!("Creating topics cache tables");

    query(
        "
        CREATE TABLE IF NOT EXISTS topics_cache (
            id INTEGER PRIMARY KEY,
            fetched_at INTEGER NOT NULL,
            content TEXT NOT NULL
        )
        ",
    )
    .execute(connection)
    .await?;

    Ok(())
}

pub async fn select_topics_cache(
    connection: &mut SqliteConnection,
) -> Result<Option<(i64, String)>, Error> {
    query("SELECT fetched_at, content FROM topics_cache WHERE id = 0")
        .map(|row: SqliteRow| (row.get(0), row.get(1)))
        .fetch_optional(connection)
        .await
}

pub async fn replace_topics_cache(
    connection: &mut SqliteConnection,
    fetched_at: i64,
    content: &str,
) -> Result<(), Error> {
    query("INSERT OR REPLACE INTO topics_cache (id, fetched_at, content) VALUES (0, ?, ?)")
        .bind(fetched_at)
        .bind(content)
        .execute(connection)
        .await?;

    Ok(())
}
