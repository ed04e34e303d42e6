use log::trace;
use serde_derive::{Deserialize, Serialize};
use sqlx::{query, sqlite::SqliteRow, Error, Row, SqliteConnection};

/// When a shout was last opened on this client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeenEntry {
    pub slug: String,
    pub seen_at: i64,
}

pub async fn create_seen_tables(connection: &mut SqliteConnection) -> Result<(), Error> {
    trace!("Creating seen tables");

    query(
        "
        CREATE TABLE IF NOT EXISTS seen (
            slug TEXT PRIMARY KEY,
            seen_at INTEGER NOT NULL
        )
        ",
    )
    .execute(connection)
    .await?;

    Ok(())
}

pub async fn insert_or_update_seen(
    connection: &mut SqliteConnection,
    slug: &str,
    seen_at: i64,
) -> Result<(), Error> {
    let row: Option<i64> = select_seen_at(&mut *connection, slug).await?;

    if let Some(previous) = row {
        if previous < seen_at {
            query("UPDATE seen SET seen_at = ? WHERE slug = ?")
                .bind(seen_at)
                .bind(slug)
                .execute(connection)
                .await?;
        }
    } else {
        query("INSERT INTO seen (slug, seen_at) VALUES (?, ?)")
            .bind(slug)
            .bind(seen_at)
            .execute(connection)
            .await?;
    }

    Ok(())
}

pub async fn select_seen_at(
    connection: &mut SqliteConnection,
    slug: &str,
) -> Result<Option<i64>, Error> {
    query("SELECT seen_at FROM seen WHERE slug = ?")
        .bind(slug)
        .map(|row: SqliteRow| row.get(0))
        .fetch_optional(connection)
        .await
}

pub async fn select_all_seen(connection: &mut SqliteConnection) -> Result<Vec<SeenEntry>, Error> {
    query("SELECT slug, seen_at FROM seen ORDER BY seen_at DESC")
        .map(|row: SqliteRow| SeenEntry {
            slug: row.get(0),
            seen_at: row.get(1),
        })
        .fetch_all(connection)
        .await
}
