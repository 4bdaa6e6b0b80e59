//! Step repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::step;

/// Repository for step (sub-task) database operations.
pub struct StepRepository;

impl StepRepository {
    /// Get all steps of a task ordered by position.
    pub async fn get_for_task<C>(conn: &C, task_id: &Uuid) -> Result<Vec<step::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(step::Entity::find()
            .filter(step::Column::TaskId.eq(*task_id))
            .order_by_asc(step::Column::Position)
            .all(conn)
            .await?)
    }

    /// Get a single step by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<step::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(step::Entity::find().filter(step::Column::Id.eq(*id)).one(conn).await?)
    }

    /// Create a new step appended at the end of its task's ordering.
    pub async fn create<C>(conn: &C, task_id: &Uuid, title: &str) -> Result<step::Model>
    where
        C: ConnectionTrait,
    {
        let position = Self::next_position(conn, task_id).await?;
        let model = step::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            task_id: ActiveValue::Set(*task_id),
            title: ActiveValue::Set(title.to_string()),
            is_completed: ActiveValue::Set(false),
            position: ActiveValue::Set(position),
        };
        Ok(model.insert(conn).await?)
    }

    /// Insert a fully-formed step row (used by restore).
    pub async fn insert<C>(conn: &C, model: step::ActiveModel) -> Result<step::Model>
    where
        C: ConnectionTrait,
    {
        Ok(model.insert(conn).await?)
    }

    /// Set the completion flag.
    pub async fn set_completed<C>(conn: &C, id: &Uuid, completed: bool) -> Result<step::Model>
    where
        C: ConnectionTrait,
    {
        let model = Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Step not found: {}", id))?;
        let mut active: step::ActiveModel = model.into();
        active.is_completed = ActiveValue::Set(completed);
        Ok(active.update(conn).await?)
    }

    /// Delete a step.
    pub async fn delete<C>(conn: &C, step: step::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        step.delete(conn).await?;
        Ok(())
    }

    /// Next free position within a task's step ordering.
    pub async fn next_position<C>(conn: &C, task_id: &Uuid) -> Result<i32>
    where
        C: ConnectionTrait,
    {
        let last = step::Entity::find()
            .filter(step::Column::TaskId.eq(*task_id))
            .order_by_desc(step::Column::Position)
            .one(conn)
            .await?;
        Ok(last.map(|s| s.position + 1).unwrap_or(0))
    }

    /// Move a step to a new position within its task and renumber so
    /// positions stay a dense permutation of 0..N-1.
    pub async fn move_to_position<C>(conn: &C, id: &Uuid, new_position: usize) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let moved = Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Step not found: {}", id))?;

        let mut siblings = Self::get_for_task(conn, &moved.task_id).await?;
        let Some(current) = siblings.iter().position(|s| s.id == *id) else {
            anyhow::bail!("Step not found in its task: {}", id);
        };
        let moved = siblings.remove(current);
        let target = new_position.min(siblings.len());
        siblings.insert(target, moved);

        for (index, model) in siblings.into_iter().enumerate() {
            if model.position != index as i32 {
                let mut active: step::ActiveModel = model.into();
                active.position = ActiveValue::Set(index as i32);
                active.update(conn).await?;
            }
        }
        Ok(())
    }
}
