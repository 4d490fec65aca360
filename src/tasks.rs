use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::task::{Priority, Status, Task},
    session::AuthError,
};

const TASK_COLUMNS: &str = "id, text, status, priority, owner_id";

/// Owner-scoped access to the `tasks` table. Every query filters on
/// `owner_id`, so another user's task behaves as if it did not exist.
#[derive(Clone)]
pub struct TaskRepository {
    db: SqlitePool,
}

impl TaskRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ? ORDER BY rowid"
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    pub async fn create(
        &self,
        owner_id: &str,
        text: &str,
        status: Option<Status>,
        priority: Option<Priority>,
    ) -> Result<Task, AppError> {
        if text.is_empty() {
            return Err(AppError::Validation("Task text is required".to_string()));
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, owner_id, text, status, priority) VALUES (?, ?, ?, ?, ?) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(owner_id)
        .bind(text)
        .bind(status.unwrap_or_default())
        .bind(priority.unwrap_or_default())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            // Tokens are not checked against `users`, so a signed id may name
            // no account; that caller cannot own tasks.
            let unknown_owner = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_foreign_key_violation());
            if unknown_owner {
                tracing::warn!(user_id = %owner_id, "task create for unknown user");
                AppError::Auth(AuthError::InvalidToken)
            } else {
                AppError::Sqlx(e)
            }
        })?;

        tracing::debug!(task_id = %task.id, user_id = %owner_id, "task created");
        Ok(task)
    }

    pub async fn update(
        &self,
        owner_id: &str,
        task_id: &str,
        status: Option<Status>,
        priority: Option<Priority>,
    ) -> Result<Task, AppError> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET status = COALESCE(?, status), priority = COALESCE(?, priority) \
             WHERE id = ? AND owner_id = ? RETURNING {TASK_COLUMNS}"
        ))
        .bind(status)
        .bind(priority)
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    /// Deleting a task that does not exist, or belongs to someone else, is a no-op.
    pub async fn delete(&self, owner_id: &str, task_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(task_id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;

        tracing::debug!(
            task_id = %task_id,
            user_id = %owner_id,
            removed = result.rows_affected(),
            "task delete"
        );
        Ok(())
    }
}
