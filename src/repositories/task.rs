//! Task repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::task;
use crate::utils::datetime;

/// Repository for task-related database operations.
pub struct TaskRepository;

impl TaskRepository {
    /// Get all tasks ordered by completion status and position.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .order_by_asc(task::Column::IsCompleted)
            .order_by_asc(task::Column::Position)
            .all(conn)
            .await?)
    }

    /// Get a single task by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find().filter(task::Column::Id.eq(*id)).one(conn).await?)
    }

    /// Get all tasks in a list, or all unfiled tasks when `list_id` is None.
    pub async fn get_for_list<C>(conn: &C, list_id: Option<&Uuid>) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        let filter = match list_id {
            Some(id) => task::Column::ListId.eq(*id),
            None => task::Column::ListId.is_null(),
        };
        Ok(task::Entity::find()
            .filter(filter)
            .order_by_asc(task::Column::Position)
            .all(conn)
            .await?)
    }

    /// Get all tasks flagged important.
    pub async fn get_important<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsImportant.eq(true))
            .order_by_asc(task::Column::IsCompleted)
            .order_by_asc(task::Column::Position)
            .all(conn)
            .await?)
    }

    /// Get all tasks in the "My Day" view.
    pub async fn get_my_day<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::InMyDay.eq(true))
            .order_by_asc(task::Column::IsCompleted)
            .order_by_asc(task::Column::Position)
            .all(conn)
            .await?)
    }

    /// Search tasks by title or description.
    pub async fn search<C>(conn: &C, query: &str) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::Expr;
        Ok(task::Entity::find()
            .filter(
                Expr::col(task::Column::Title)
                    .like(format!("%{}%", query))
                    .or(Expr::col(task::Column::Description).like(format!("%{}%", query))),
            )
            .order_by_asc(task::Column::IsCompleted)
            .order_by_asc(task::Column::Position)
            .all(conn)
            .await?)
    }

    /// Create a new task appended at the end of its list's ordering.
    pub async fn create<C>(conn: &C, title: &str, list_id: Option<Uuid>) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let now = datetime::now_millis();
        let position = Self::next_position(conn, list_id.as_ref()).await?;
        let model = task::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            title: ActiveValue::Set(title.to_string()),
            description: ActiveValue::Set(None),
            is_completed: ActiveValue::Set(false),
            is_important: ActiveValue::Set(false),
            in_my_day: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            modified_at: ActiveValue::Set(now),
            due_date: ActiveValue::Set(None),
            reminder_at: ActiveValue::Set(None),
            position: ActiveValue::Set(position),
            list_id: ActiveValue::Set(list_id),
        };
        Ok(model.insert(conn).await?)
    }

    /// Insert a fully-formed task row (used by restore).
    pub async fn insert<C>(conn: &C, model: task::ActiveModel) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        Ok(model.insert(conn).await?)
    }

    /// Update a task in the database, stamping `modified_at`.
    pub async fn update<C>(conn: &C, mut task: task::ActiveModel) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        task.modified_at = ActiveValue::Set(datetime::now_millis());
        Ok(task.update(conn).await?)
    }

    /// Delete a task; steps and attachments cascade.
    pub async fn delete<C>(conn: &C, task: task::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task.delete(conn).await?;
        Ok(())
    }

    /// Toggle or set the completion flag.
    pub async fn set_completed<C>(conn: &C, id: &Uuid, completed: bool) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let mut active = Self::active_by_id(conn, id).await?;
        active.is_completed = ActiveValue::Set(completed);
        Self::update(conn, active).await
    }

    /// Set the important flag.
    pub async fn set_important<C>(conn: &C, id: &Uuid, important: bool) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let mut active = Self::active_by_id(conn, id).await?;
        active.is_important = ActiveValue::Set(important);
        Self::update(conn, active).await
    }

    /// Add the task to, or remove it from, the "My Day" view.
    pub async fn set_in_my_day<C>(conn: &C, id: &Uuid, in_my_day: bool) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let mut active = Self::active_by_id(conn, id).await?;
        active.in_my_day = ActiveValue::Set(in_my_day);
        Self::update(conn, active).await
    }

    /// Set or clear the due date (epoch millis).
    pub async fn set_due_date<C>(conn: &C, id: &Uuid, due_date: Option<i64>) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let mut active = Self::active_by_id(conn, id).await?;
        active.due_date = ActiveValue::Set(due_date);
        Self::update(conn, active).await
    }

    /// Set or clear the reminder time (epoch millis). Cancelling the pending
    /// notification job is the caller's responsibility.
    pub async fn set_reminder<C>(conn: &C, id: &Uuid, reminder_at: Option<i64>) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let mut active = Self::active_by_id(conn, id).await?;
        active.reminder_at = ActiveValue::Set(reminder_at);
        Self::update(conn, active).await
    }

    /// Move a task to another list (or to unfiled), appending it at the end.
    pub async fn move_to_list<C>(conn: &C, id: &Uuid, list_id: Option<Uuid>) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        let position = Self::next_position(conn, list_id.as_ref()).await?;
        let mut active = Self::active_by_id(conn, id).await?;
        active.list_id = ActiveValue::Set(list_id);
        active.position = ActiveValue::Set(position);
        Self::update(conn, active).await
    }

    /// Next free position within a list (or the unfiled group).
    pub async fn next_position<C>(conn: &C, list_id: Option<&Uuid>) -> Result<i32>
    where
        C: ConnectionTrait,
    {
        let filter = match list_id {
            Some(id) => task::Column::ListId.eq(*id),
            None => task::Column::ListId.is_null(),
        };
        let last = task::Entity::find()
            .filter(filter)
            .order_by_desc(task::Column::Position)
            .one(conn)
            .await?;
        Ok(last.map(|t| t.position + 1).unwrap_or(0))
    }

    /// Move a task to a new position within its list and renumber the list so
    /// positions stay a dense permutation of 0..N-1.
    pub async fn move_to_position<C>(conn: &C, id: &Uuid, new_position: usize) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let moved = Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

        let mut siblings = Self::get_for_list(conn, moved.list_id.as_ref()).await?;
        let Some(current) = siblings.iter().position(|t| t.id == *id) else {
            anyhow::bail!("Task not found in its list: {}", id);
        };
        let moved = siblings.remove(current);
        let target = new_position.min(siblings.len());
        siblings.insert(target, moved);

        for (index, model) in siblings.into_iter().enumerate() {
            if model.position != index as i32 {
                let mut active: task::ActiveModel = model.into();
                active.position = ActiveValue::Set(index as i32);
                active.update(conn).await?;
            }
        }
        Ok(())
    }

    async fn active_by_id<C>(conn: &C, id: &Uuid) -> Result<task::ActiveModel>
    where
        C: ConnectionTrait,
    {
        let model = Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;
        Ok(model.into())
    }
}
