use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            name          TEXT NOT NULL,
            role          TEXT NOT NULL,
            password_hash TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS feedback_forms (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL,
            created_by  TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            is_active   INTEGER NOT NULL,
            fields      TEXT NOT NULL -- JSON array of field definitions
        );

        CREATE TABLE IF NOT EXISTS feedbacks (
            id         TEXT PRIMARY KEY,
            form_id    TEXT NOT NULL REFERENCES feedback_forms(id),
            name       TEXT NOT NULL,
            email      TEXT NOT NULL,
            message    TEXT NOT NULL,
            rating     INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            responses  TEXT NOT NULL -- JSON object keyed by field id
        );

        CREATE INDEX IF NOT EXISTS idx_feedbacks_form
            ON feedbacks(form_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
