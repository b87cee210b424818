//! Document store with two collections: goals and tasks.
//!
//! Goals and tasks are linked by reference (`TaskDocument::goal_id`); stores do
//! not enforce the link. Writers insert a goal before its tasks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use tracing::debug;
use uuid::Uuid;

use crate::io::config::{StoreBackend, StoreConfig};

/// A stored goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDocument {
    pub id: String,
    pub goal_text: String,
    pub created_at: DateTime<Utc>,
}

/// A stored task. `dependencies` is already in storage form; `None` is a null column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDocument {
    pub goal_id: String,
    pub task_description: String,
    pub dependencies: Option<String>,
    pub deadline: String,
}

/// Goal fields supplied by the caller; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub goal_text: String,
    pub created_at: DateTime<Utc>,
}

/// Task fields supplied by the caller; the store fills in `goal_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub task_description: String,
    pub dependencies: Option<String>,
    pub deadline: String,
}

impl NewTask {
    fn into_document(self, goal_id: &str) -> TaskDocument {
        TaskDocument {
            goal_id: goal_id.to_string(),
            task_description: self.task_description,
            dependencies: self.dependencies,
            deadline: self.deadline,
        }
    }
}

/// Abstraction over goal/task persistence backends.
pub trait DocumentStore: Send + Sync {
    /// Insert a goal and return it with its generated id.
    fn insert_goal(&self, goal: NewGoal) -> Result<GoalDocument>;

    fn insert_task(&self, task: TaskDocument) -> Result<()>;

    /// Insert a goal followed by its tasks.
    ///
    /// The default runs one goal insert and then one insert per task with no
    /// transaction; a failure part-way leaves the goal with a prefix of its
    /// tasks. Backends with transactions override this.
    fn insert_plan(&self, goal: NewGoal, tasks: Vec<NewTask>) -> Result<GoalDocument> {
        let goal = self.insert_goal(goal)?;
        for task in tasks {
            self.insert_task(task.into_document(&goal.id))?;
        }
        Ok(goal)
    }

    /// All goals, newest `created_at` first. Ties keep the most recent insert first.
    fn goals_newest_first(&self) -> Result<Vec<GoalDocument>>;

    /// Tasks referencing `goal_id`, in insertion order.
    fn tasks_for_goal(&self, goal_id: &str) -> Result<Vec<TaskDocument>>;
}

/// Open the store selected by config.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.path)?)),
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(Debug, Default)]
struct Collections {
    goals: Vec<GoalDocument>,
    tasks: Vec<TaskDocument>,
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))
    }
}

impl DocumentStore for MemoryStore {
    fn insert_goal(&self, goal: NewGoal) -> Result<GoalDocument> {
        let doc = GoalDocument {
            id: new_id(),
            goal_text: goal.goal_text,
            created_at: goal.created_at,
        };
        self.lock()?.goals.push(doc.clone());
        Ok(doc)
    }

    fn insert_task(&self, task: TaskDocument) -> Result<()> {
        self.lock()?.tasks.push(task);
        Ok(())
    }

    fn goals_newest_first(&self) -> Result<Vec<GoalDocument>> {
        let collections = self.lock()?;
        let mut goals: Vec<GoalDocument> = collections.goals.iter().rev().cloned().collect();
        // Stable sort: equal timestamps keep reverse insertion order.
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    fn tasks_for_goal(&self, goal_id: &str) -> Result<Vec<TaskDocument>> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .filter(|task| task.goal_id == goal_id)
            .cloned()
            .collect())
    }
}

const SCHEMA: &str = "BEGIN;
CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    goal_text TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_goals_created_at ON goals(created_at);
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    goal_id TEXT NOT NULL,
    task_description TEXT NOT NULL,
    dependencies TEXT,
    deadline TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_goal_id ON tasks(goal_id);
COMMIT;";

/// Store backed by a SQLite database file.
///
/// `created_at` is stored as microseconds since the epoch.
/// [`DocumentStore::insert_plan`] runs inside one transaction.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open store {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .with_context(|| format!("initialize store schema {}", path.display()))?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("connection lock poisoned"))
    }
}

fn insert_goal_row(conn: &Connection, goal: NewGoal) -> rusqlite::Result<GoalDocument> {
    let doc = GoalDocument {
        id: new_id(),
        goal_text: goal.goal_text,
        created_at: goal.created_at,
    };
    conn.execute(
        "INSERT INTO goals (id, goal_text, created_at) VALUES (?1, ?2, ?3)",
        params![doc.id, doc.goal_text, doc.created_at.timestamp_micros()],
    )?;
    Ok(doc)
}

fn insert_task_row(conn: &Connection, task: &TaskDocument) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tasks (goal_id, task_description, dependencies, deadline)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            task.goal_id,
            task.task_description,
            task.dependencies,
            task.deadline
        ],
    )?;
    Ok(())
}

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<GoalDocument> {
    let micros: i64 = row.get(2)?;
    let created_at = DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, micros))?;
    Ok(GoalDocument {
        id: row.get(0)?,
        goal_text: row.get(1)?,
        created_at,
    })
}

impl DocumentStore for SqliteStore {
    fn insert_goal(&self, goal: NewGoal) -> Result<GoalDocument> {
        let conn = self.lock()?;
        insert_goal_row(&conn, goal).context("insert goal")
    }

    fn insert_task(&self, task: TaskDocument) -> Result<()> {
        let conn = self.lock()?;
        insert_task_row(&conn, &task).context("insert task")
    }

    fn insert_plan(&self, goal: NewGoal, tasks: Vec<NewTask>) -> Result<GoalDocument> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().context("begin plan transaction")?;
        let goal = insert_goal_row(&tx, goal).context("insert goal")?;
        for task in tasks {
            insert_task_row(&tx, &task.into_document(&goal.id)).context("insert task")?;
        }
        tx.commit().context("commit plan transaction")?;
        Ok(goal)
    }

    fn goals_newest_first(&self) -> Result<Vec<GoalDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, goal_text, created_at FROM goals
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let goals = stmt
            .query_map([], goal_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("list goals")?;
        Ok(goals)
    }

    fn tasks_for_goal(&self, goal_id: &str) -> Result<Vec<TaskDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT goal_id, task_description, dependencies, deadline FROM tasks
             WHERE goal_id = ?1 ORDER BY id",
        )?;
        let tasks = stmt
            .query_map(params![goal_id], |row| {
                Ok(TaskDocument {
                    goal_id: row.get(0)?,
                    task_description: row.get(1)?,
                    dependencies: row.get(2)?,
                    deadline: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("list tasks for goal {goal_id}"))?;
        Ok(tasks)
    }
}
