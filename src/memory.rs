//! In-process repositories used by the unit and router tests.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{repo::UserRepo, repo_types::User},
    db::RepoError,
    tasks::{
        repo::TaskRepo,
        repo_types::{NewTask, Task, TaskPatch},
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(RepoError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}

/// Keeps insertion order, which is the listing order.
#[derive(Default)]
pub struct MemoryTaskRepo {
    tasks: RwLock<Vec<Task>>,
}

#[async_trait]
impl TaskRepo for MemoryTaskRepo {
    async fn insert(&self, owner: Uuid, task: &NewTask) -> Result<Task, RepoError> {
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: task.title.clone(),
            status: task.status.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, RepoError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect())
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, RepoError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .find(|t| t.id == id && t.user_id == owner)
            .cloned())
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, RepoError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(status) = &patch.status {
            task.status = status.clone();
        }
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == owner));
        Ok(tasks.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_emails_are_unique_and_case_sensitive() {
        let repo = MemoryUserRepo::default();
        repo.create("a@x.com", "h1").await.unwrap();
        assert!(matches!(
            repo.create("a@x.com", "h2").await,
            Err(RepoError::Conflict)
        ));
        repo.create("A@x.com", "h3").await.unwrap();
        assert_eq!(repo.find_by_email("a@x.com").await.unwrap().unwrap().password_hash, "h1");
    }
}
