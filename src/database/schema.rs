use rusqlite::Connection;

/// Create the watches table if it does not exist. The composite
/// primary key de-duplicates (chat, address) pairs on insert.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS watches (
            chat_id TEXT NOT NULL,
            address TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (chat_id, address)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_watches_chat_id ON watches (chat_id)",
        [],
    )?;

    Ok(())
}
