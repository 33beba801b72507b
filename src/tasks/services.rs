use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    tasks::{
        dto::{CreateTaskRequest, UpdateTaskRequest},
        repo::TaskRepo,
        repo_types::{NewTask, Task, TaskPatch},
    },
};

pub const DEFAULT_STATUS: &str = "todo";
pub const MAX_STATUS_LEN: usize = 32;

const TASK_NOT_FOUND: &str = "task not found";

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    Ok(title.to_string())
}

fn validate_status(status: &str) -> Result<String, AppError> {
    let status = status.trim();
    if status.chars().count() > MAX_STATUS_LEN {
        return Err(AppError::Validation(format!(
            "status must be at most {MAX_STATUS_LEN} characters"
        )));
    }
    if status.is_empty() {
        return Ok(DEFAULT_STATUS.to_string());
    }
    Ok(status.to_string())
}

/// Stores a task owned by `owner`. The request has no way to name another owner.
pub async fn create_task(
    repo: &dyn TaskRepo,
    owner: AuthUser,
    req: CreateTaskRequest,
) -> Result<Task, AppError> {
    let new = NewTask {
        title: validate_title(&req.title)?,
        status: validate_status(req.status.as_deref().unwrap_or(DEFAULT_STATUS))?,
    };
    let task = repo.insert(owner.id(), &new).await?;
    info!(user_id = %owner.id(), task_id = %task.id, "task created");
    Ok(task)
}

pub async fn list_tasks(repo: &dyn TaskRepo, owner: AuthUser) -> Result<Vec<Task>, AppError> {
    let tasks = repo.list_by_owner(owner.id()).await?;
    debug!(user_id = %owner.id(), count = tasks.len(), "tasks listed");
    Ok(tasks)
}

pub async fn get_task(repo: &dyn TaskRepo, owner: AuthUser, id: Uuid) -> Result<Task, AppError> {
    repo.find_owned(owner.id(), id)
        .await?
        .ok_or(AppError::NotFound(TASK_NOT_FOUND))
}

pub async fn update_task(
    repo: &dyn TaskRepo,
    owner: AuthUser,
    id: Uuid,
    req: UpdateTaskRequest,
) -> Result<Task, AppError> {
    let patch = TaskPatch {
        title: req.title.as_deref().map(validate_title).transpose()?,
        status: req.status.as_deref().map(validate_status).transpose()?,
    };
    let task = repo
        .update_owned(owner.id(), id, &patch)
        .await?
        .ok_or(AppError::NotFound(TASK_NOT_FOUND))?;
    info!(user_id = %owner.id(), task_id = %id, "task updated");
    Ok(task)
}

/// Missing and foreign tasks both come back as NotFound.
pub async fn delete_task(repo: &dyn TaskRepo, owner: AuthUser, id: Uuid) -> Result<(), AppError> {
    if !repo.delete_owned(owner.id(), id).await? {
        debug!(user_id = %owner.id(), task_id = %id, "delete missed");
        return Err(AppError::NotFound(TASK_NOT_FOUND));
    }
    info!(user_id = %owner.id(), task_id = %id, "task deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTaskRepo;

    fn create(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.into(),
            status: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_caller_as_owner() {
        let repo = MemoryTaskRepo::default();
        let alice = AuthUser(Uuid::new_v4());
        let task = create_task(&repo, alice, create("  buy milk ")).await.unwrap();
        assert_eq!(task.user_id, alice.id());
        assert_eq!(task.title, "buy milk");
        assert_eq!(task.status, DEFAULT_STATUS);
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_long_status() {
        let repo = MemoryTaskRepo::default();
        let alice = AuthUser(Uuid::new_v4());
        let err = create_task(&repo, alice, create("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let req = CreateTaskRequest {
            title: "ok".into(),
            status: Some("x".repeat(MAX_STATUS_LEN + 1)),
        };
        let err = create_task(&repo, alice, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_tasks(&repo, alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listings_are_disjoint_and_in_insertion_order() {
        let repo = MemoryTaskRepo::default();
        let alice = AuthUser(Uuid::new_v4());
        let bob = AuthUser(Uuid::new_v4());

        let a1 = create_task(&repo, alice, create("a1")).await.unwrap();
        let b1 = create_task(&repo, bob, create("b1")).await.unwrap();
        let a2 = create_task(&repo, alice, create("a2")).await.unwrap();

        let mine = list_tasks(&repo, alice).await.unwrap();
        assert_eq!(mine.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a1.id, a2.id]);

        let theirs = list_tasks(&repo, bob).await.unwrap();
        assert_eq!(theirs, vec![b1]);
    }

    #[tokio::test]
    async fn foreign_task_is_not_found_for_every_operation() {
        let repo = MemoryTaskRepo::default();
        let alice = AuthUser(Uuid::new_v4());
        let bob = AuthUser(Uuid::new_v4());
        let bobs = create_task(&repo, bob, create("private")).await.unwrap();

        let err = get_task(&repo, alice, bobs.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let patch = UpdateTaskRequest {
            title: Some("hijacked".into()),
            status: None,
        };
        let err = update_task(&repo, alice, bobs.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let foreign = delete_task(&repo, alice, bobs.id).await.unwrap_err();
        let missing = delete_task(&repo, alice, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
        assert_eq!(foreign.status(), missing.status());

        // bob's task is untouched
        assert_eq!(get_task(&repo, bob, bobs.id).await.unwrap(), bobs);
    }

    #[tokio::test]
    async fn owner_can_update_and_delete() {
        let repo = MemoryTaskRepo::default();
        let alice = AuthUser(Uuid::new_v4());
        let task = create_task(&repo, alice, create("write report")).await.unwrap();

        let patch = UpdateTaskRequest {
            title: None,
            status: Some("done".into()),
        };
        let updated = update_task(&repo, alice, task.id, patch).await.unwrap();
        assert_eq!(updated.title, "write report");
        assert_eq!(updated.status, "done");
        assert!(updated.updated_at >= task.updated_at);

        let err = update_task(
            &repo,
            alice,
            task.id,
            UpdateTaskRequest {
                title: Some(" ".into()),
                status: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        delete_task(&repo, alice, task.id).await.unwrap();
        assert!(list_tasks(&repo, alice).await.unwrap().is_empty());
        let err = delete_task(&repo, alice, task.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
