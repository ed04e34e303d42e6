use log::trace;
use sqlx::{query, sqlite::SqliteRow, Error, Row, SqliteConnection};

pub async fn create_drafts_tables(connection: &mut SqliteConnection) -> Result<(), Error> {
    trace!("Creating drafts tables");

    query(
        "
        CREATE TABLE IF NOT EXISTS drafts (
            id INTEGER PRIMARY KEY,
            updated_at INTEGER NOT NULL,
            content TEXT NOT NULL
        )
        ",
    )
    .execute(connection)
    .await?;

    Ok(())
}

pub async fn create_drafts_indices(connection: &mut SqliteConnection) -> Result<(), Error> {
    trace!("Creating drafts indices");

    query("CREATE INDEX IF NOT EXISTS drafts_updated_at_index on drafts (updated_at)")
        .execute(connection)
        .await?;

    Ok(())
}

/// Inserts a new draft row, or replaces `id` when it exists. Returns the row id.
pub async fn insert_or_replace_draft(
    connection: &mut SqliteConnection,
    id: Option<i64>,
    updated_at: i64,
    content: &str,
) -> Result<i64, Error> {
    if let Some(id) = id {
        let updated = query("UPDATE drafts SET updated_at = ?, content = ? WHERE id = ?")
            .bind(updated_at)
            .bind(content)
            .bind(id)
            .execute(&mut *connection)
            .await?;
        if updated.rows_affected() > 0 {
            return Ok(id);
        }
    }

    let inserted = query("INSERT INTO drafts (updated_at, content) VALUES (?, ?)")
        .bind(updated_at)
        .bind(content)
        .execute(connection)
        .await?;

    Ok(inserted.last_insert_rowid())
}

pub async fn select_all_drafts(
    connection: &mut SqliteConnection,
) -> Result<Vec<(i64, String)>, Error> {
    query("SELECT id, content FROM drafts ORDER BY updated_at DESC, id DESC")
        .map(|row: SqliteRow| (row.get(0), row.get(1)))
        .fetch_all(connection)
        .await
}

pub async fn delete_draft(connection: &mut SqliteConnection, id: i64) -> Result<bool, Error> {
    let deleted = query("DELETE FROM drafts WHERE id = ?")
        .bind(id)
        .execute(connection)
        .await?;

    Ok(deleted.rows_affected() > 0)
}
