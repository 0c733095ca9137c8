use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{StoreError, TodoStore};
use crate::models::TodoItem;

/// Attempts made by `add` before giving up on a sequence-number collision
const ADD_ATTEMPTS: usize = 3;

const SELECT_COLUMNS: &str = "SELECT owner, seq, content, completed, created_at FROM todos";

#[derive(Clone)]
pub struct SqliteTodoStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTodoStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            seq INTEGER NOT NULL,
            content TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            UNIQUE (owner, seq)
        );

        CREATE INDEX IF NOT EXISTS idx_todos_owner_completed ON todos(owner, completed);

        -- High-water mark per owner so a deleted sequence number is never handed out again
        CREATE TABLE IF NOT EXISTS todo_sequences (
            owner TEXT PRIMARY KEY,
            last_seq INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<TodoItem> {
    let created_at: i64 = row.get(4)?;
    Ok(TodoItem {
        owner: row.get(0)?,
        seq: row.get(1)?,
        content: row.get(2)?,
        completed: row.get(3)?,
        created_at: created_at.max(0) as u64,
    })
}

fn next_seq(conn: &Connection, owner: &str) -> Result<u32, StoreError> {
    let current: u32 = conn.query_row(
        r#"
        SELECT MAX(
            COALESCE((SELECT MAX(seq) FROM todos WHERE owner = ?1), 0),
            COALESCE((SELECT last_seq FROM todo_sequences WHERE owner = ?1), 0)
        )
        "#,
        params![owner],
        |row| row.get(0),
    )?;
    Ok(current + 1)
}

fn insert_item(conn: &Connection, item: &TodoItem) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO todos (owner, seq, content, completed, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.owner,
            item.seq,
            item.content,
            item.completed,
            item.created_at as i64
        ],
    )?;
    conn.execute(
        r#"
        INSERT INTO todo_sequences (owner, last_seq) VALUES (?1, ?2)
        ON CONFLICT(owner) DO UPDATE SET last_seq = MAX(last_seq, excluded.last_seq)
        "#,
        params![item.owner, item.seq],
    )?;
    Ok(())
}

fn query_items(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<TodoItem>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let items = stmt
        .query_map(params, row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

fn is_unique_violation(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation
    )
}

impl TodoStore for SqliteTodoStore {
    fn next_sequence_number(&self, owner: &str) -> Result<u32, StoreError> {
        let conn = self.conn.lock();
        next_seq(&conn, owner)
    }

    fn insert(&self, item: &TodoItem) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        insert_item(&tx, item)?;
        tx.commit()?;
        Ok(())
    }

    fn add(&self, owner: &str, content: &str, created_at: u64) -> Result<u32, StoreError> {
        let mut conn = self.conn.lock();
        for attempt in 1..=ADD_ATTEMPTS {
            // IMMEDIATE takes the write lock up front, so the read of the current
            // maximum and the insert see the same snapshot across processes too.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let seq = next_seq(&tx, owner)?;
            let item = TodoItem::new(owner, seq, content, created_at);
            match insert_item(&tx, &item) {
                Ok(()) => {
                    tx.commit()?;
                    return Ok(seq);
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(owner, seq, attempt, "sequence number collision, retrying");
                    drop(tx);
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::SequenceConflict(owner.to_string()))
    }

    fn delete_by(&self, owner: &str, seq: u32) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM todos WHERE owner = ?1 AND seq = ?2",
            params![owner, seq],
        )?;
        Ok(removed)
    }

    fn complete_by(&self, owner: &str, seq: u32) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE todos SET completed = 1 WHERE owner = ?1 AND seq = ?2 AND completed = 0",
            params![owner, seq],
        )?;
        Ok(changed)
    }

    fn list_incomplete(&self, owner: &str) -> Result<Vec<TodoItem>, StoreError> {
        let conn = self.conn.lock();
        query_items(
            &conn,
            &format!("{SELECT_COLUMNS} WHERE owner = ?1 AND completed = 0 ORDER BY created_at ASC, seq ASC"),
            params![owner],
        )
    }

    fn search_incomplete(&self, owner: &str, keyword: &str) -> Result<Vec<TodoItem>, StoreError> {
        let conn = self.conn.lock();
        // instr() is a byte-wise match, unlike LIKE which folds ASCII case
        query_items(
            &conn,
            &format!(
                "{SELECT_COLUMNS} WHERE owner = ?1 AND completed = 0 AND instr(content, ?2) > 0 \
                 ORDER BY created_at ASC, seq ASC"
            ),
            params![owner, keyword],
        )
    }

    fn get_by_id_any(&self, owner: &str, seq: u32) -> Result<Option<TodoItem>, StoreError> {
        let conn = self.conn.lock();
        let item = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE owner = ?1 AND seq = ?2"),
                params![owner, seq],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn list_all(&self, owner: &str) -> Result<Vec<TodoItem>, StoreError> {
        let conn = self.conn.lock();
        query_items(
            &conn,
            &format!("{SELECT_COLUMNS} WHERE owner = ?1 ORDER BY completed ASC, created_at ASC, seq ASC"),
            params![owner],
        )
    }
}
