use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::RepoError,
    tasks::repo_types::{NewTask, Task, TaskPatch},
};

/// Task persistence. Every lookup and mutation is keyed by owner as well as id,
/// so a record belonging to someone else behaves exactly like a missing one.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn insert(&self, owner: Uuid, task: &NewTask) -> Result<Task, RepoError>;
    /// Oldest first.
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, RepoError>;
    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, RepoError>;
    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, RepoError>;
    /// Returns whether a row was removed.
    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn insert(&self, owner: Uuid, task: &NewTask) -> Result<Task, RepoError> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, user_id, title, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&task.title)
        .bind(&task.status)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, RepoError> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, status, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, RepoError> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, status, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, RepoError> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET title = COALESCE($3, title),
                   status = COALESCE($4, status),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.title.as_deref())
        .bind(patch.status.as_deref())
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM tasks WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
