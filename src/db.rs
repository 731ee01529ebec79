use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{AppError, Result};
use crate::task::{
    parse_due_date, NewTask, Priority, Status, Task, TaskFilter, TaskUpdate, DUE_DATE_FORMAT,
};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn init(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                description TEXT,
                status      TEXT NOT NULL DEFAULT 'TODO',
                priority    TEXT NOT NULL DEFAULT 'MEDIUM',
                due_date    TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_date);
            ",
        )?;

        Ok(Self { conn })
    }

    /// List tasks matching every supplied filter, most recent first.
    pub fn get_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = non_empty(&filter.status) {
            let status = Status::parse_tag(status)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {status}")))?;
            clauses.push("status = ?");
            values.push(status.as_str().to_string());
        }

        if let Some(priority) = non_empty(&filter.priority) {
            let priority = Priority::parse_tag(priority)
                .ok_or_else(|| AppError::Validation(format!("Unknown priority: {priority}")))?;
            clauses.push("priority = ?");
            values.push(priority.as_str().to_string());
        }

        if let Some(day) = non_empty(&filter.due_date) {
            // Any time on that calendar day.
            let day = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|_| AppError::Validation(format!("Invalid due date filter: {day}")))?;
            clauses.push("substr(due_date, 1, 10) = ?");
            values.push(day.format("%Y-%m-%d").to_string());
        }

        if let Some(search) = non_empty(&filter.search) {
            clauses.push(r"(title LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')");
            let pattern = format!("%{}%", escape_like(search));
            values.push(pattern.clone());
            values.push(pattern);
        }

        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_from_iter(values.iter()), task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                task_from_row,
            )
            .optional()?
            .ok_or(AppError::NotFound(id))
    }

    pub fn create_task(&self, new: &NewTask) -> Result<Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
        let due_date = match new.due_date.as_deref() {
            Some(raw) => parse_due_date(raw)?,
            None => None,
        };
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO tasks (title, description, status, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                title,
                new.description,
                new.status.unwrap_or_default().as_str(),
                new.priority.unwrap_or_default().as_str(),
                due_date.map(format_due_date),
                now,
            ],
        )?;

        self.get_task(self.conn.last_insert_rowid())
    }

    /// Apply the fields present in `update`. Unknown ids are an error.
    pub fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<Task> {
        let mut task = self.get_task(id)?;

        if let Some(title) = &update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::Validation("Title cannot be empty".into()));
            }
            task.title = title.to_string();
        }
        if let Some(description) = &update.description {
            task.description = description.clone();
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due_date) = &update.due_date {
            task.due_date = match due_date.as_deref() {
                Some(raw) => parse_due_date(raw)?,
                None => None,
            };
        }

        self.conn.execute(
            "UPDATE tasks SET title = ?2, description = ?3, status = ?4, priority = ?5,
                 due_date = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date.map(format_due_date),
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.get_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(AppError::NotFound(id));
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Make `%`, `_` and `\` match literally under `ESCAPE '\'`.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_due_date(dt: NaiveDateTime) -> String {
    dt.format(DUE_DATE_FORMAT).to_string()
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let due_date: Option<String> = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: Status::from_str_tag(&row.get::<_, String>(3)?),
        priority: Priority::from_str_tag(&row.get::<_, String>(4)?),
        due_date: due_date.and_then(|s| NaiveDateTime::parse_from_str(&s, DUE_DATE_FORMAT).ok()),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn filter() -> TaskFilter {
        TaskFilter::default()
    }

    #[test]
    fn test_create_applies_defaults() {
        let db = Database::init(":memory:").unwrap();
        let task = db.create_task(&new_task("  Water plants ")).unwrap();

        assert_eq!(task.title, "Water plants");
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, None);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_create_rejects_blank_title_and_bad_date() {
        let db = Database::init(":memory:").unwrap();
        assert!(matches!(db.create_task(&new_task("  ")), Err(AppError::Validation(_))));

        let bad = NewTask {
            due_date: Some("someday".into()),
            ..new_task("Dream")
        };
        assert!(matches!(db.create_task(&bad), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_with_due_date_keeps_time() {
        let db = Database::init(":memory:").unwrap();
        let task = db
            .create_task(&NewTask {
                due_date: Some("2025-01-11T18:00:00".into()),
                priority: Some(Priority::High),
                ..new_task("Review PR")
            })
            .unwrap();

        let expected = NaiveDate::from_ymd_opt(2025, 1, 11)
            .unwrap()
            .and_hms_opt(18, 0, 0);
        assert_eq!(task.due_date, expected);
        assert_eq!(db.get_task(task.id).unwrap(), task);
    }

    #[test]
    fn test_filters_combine() {
        let db = Database::init(":memory:").unwrap();
        db.create_task(&NewTask {
            priority: Some(Priority::High),
            due_date: Some("2025-01-11T18:00:00".into()),
            description: Some("auth module".into()),
            ..new_task("Review PR")
        })
        .unwrap();
        db.create_task(&NewTask {
            priority: Some(Priority::High),
            status: Some(Status::Done),
            due_date: Some("2025-01-11".into()),
            ..new_task("Deploy")
        })
        .unwrap();
        db.create_task(&new_task("Call John")).unwrap();

        assert_eq!(db.get_tasks(&filter()).unwrap().len(), 3);

        let high = TaskFilter {
            priority: Some("HIGH".into()),
            ..filter()
        };
        assert_eq!(db.get_tasks(&high).unwrap().len(), 2);

        let high_done = TaskFilter {
            status: Some("DONE".into()),
            ..high.clone()
        };
        let tasks = db.get_tasks(&high_done).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Deploy");

        let on_day = TaskFilter {
            due_date: Some("2025-01-11".into()),
            ..filter()
        };
        assert_eq!(db.get_tasks(&on_day).unwrap().len(), 2);

        let by_description = TaskFilter {
            search: Some("auth".into()),
            ..filter()
        };
        let tasks = db.get_tasks(&by_description).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Review PR");
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let db = Database::init(":memory:").unwrap();
        db.create_task(&new_task("Buy milk")).unwrap();
        db.create_task(&new_task("Raise to 50% now")).unwrap();
        db.create_task(&new_task(r"Fix C:\temp path")).unwrap();

        let search = |q: &str| {
            db.get_tasks(&TaskFilter {
                search: Some(q.into()),
                ..filter()
            })
            .unwrap()
        };

        assert!(search("_").is_empty());

        let percent = search("%");
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].title, "Raise to 50% now");

        let backslash = search(r"\");
        assert_eq!(backslash.len(), 1);
        assert_eq!(backslash[0].title, r"Fix C:\temp path");

        // Still a case-insensitive substring match
        assert_eq!(search("MILK").len(), 1);
    }

    #[test]
    fn test_newest_first() {
        let db = Database::init(":memory:").unwrap();
        db.create_task(&new_task("first")).unwrap();
        db.create_task(&new_task("second")).unwrap();

        let tasks = db.get_tasks(&filter()).unwrap();
        assert_eq!(tasks[0].title, "second");
        assert_eq!(tasks[1].title, "first");
    }

    #[test]
    fn test_bad_filter_values() {
        let db = Database::init(":memory:").unwrap();
        let bad_status = TaskFilter {
            status: Some("SOMEDAY".into()),
            ..filter()
        };
        assert!(matches!(db.get_tasks(&bad_status), Err(AppError::Validation(_))));

        let bad_day = TaskFilter {
            due_date: Some("11/01/2025".into()),
            ..filter()
        };
        assert!(matches!(db.get_tasks(&bad_day), Err(AppError::Validation(_))));

        // Blank values are ignored
        let blank = TaskFilter {
            status: Some("".into()),
            ..filter()
        };
        assert!(db.get_tasks(&blank).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_clear_due_date() {
        let db = Database::init(":memory:").unwrap();
        let task = db
            .create_task(&NewTask {
                due_date: Some("2025-01-11T18:00:00".into()),
                ..new_task("Review PR")
            })
            .unwrap();

        let moved = db
            .update_task(
                task.id,
                &TaskUpdate {
                    status: Some(Status::InProgress),
                    due_date: Some(Some("2025-01-12T10:30:00".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.status, Status::InProgress);
        assert_eq!(moved.title, "Review PR");
        assert_eq!(
            moved.due_date,
            NaiveDate::from_ymd_opt(2025, 1, 12).unwrap().and_hms_opt(10, 30, 0)
        );

        let cleared = db
            .update_task(
                task.id,
                &TaskUpdate {
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.due_date, None);
        assert_eq!(cleared.status, Status::InProgress);
    }

    #[test]
    fn test_missing_ids() {
        let db = Database::init(":memory:").unwrap();
        assert!(matches!(db.get_task(42), Err(AppError::NotFound(42))));
        assert!(matches!(
            db.update_task(42, &TaskUpdate::default()),
            Err(AppError::NotFound(42))
        ));
        assert!(matches!(db.delete_task(42), Err(AppError::NotFound(42))));
    }

    #[test]
    fn test_delete() {
        let db = Database::init(":memory:").unwrap();
        let task = db.create_task(&new_task("Temp")).unwrap();
        db.delete_task(task.id).unwrap();
        assert!(db.get_tasks(&filter()).unwrap().is_empty());
    }
}
