//! List repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::constants::DUPLICATE_NAME_SUFFIX;
use crate::entities::{list, step, task};
use crate::utils::datetime;

/// Repository for list-related database operations.
pub struct ListRepository;

impl ListRepository {
    /// Get all lists ordered by position.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(list::Entity::find()
            .order_by_asc(list::Column::Position)
            .all(conn)
            .await?)
    }

    /// Get a single list by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(list::Entity::find().filter(list::Column::Id.eq(*id)).one(conn).await?)
    }

    /// Create a new list appended at the end of the ordering.
    pub async fn create<C>(conn: &C, name: &str, color: i32, emoji: Option<String>) -> Result<list::Model>
    where
        C: ConnectionTrait,
    {
        let position = Self::next_position(conn).await?;
        let model = list::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name.to_string()),
            color: ActiveValue::Set(color),
            emoji: ActiveValue::Set(emoji),
            created_at: ActiveValue::Set(datetime::now_millis()),
            position: ActiveValue::Set(position),
        };
        Ok(model.insert(conn).await?)
    }

    /// Insert a fully-formed list row (used by restore).
    pub async fn insert<C>(conn: &C, model: list::ActiveModel) -> Result<list::Model>
    where
        C: ConnectionTrait,
    {
        Ok(model.insert(conn).await?)
    }

    /// Update a list in the database.
    pub async fn update<C>(conn: &C, list: list::ActiveModel) -> Result<list::Model>
    where
        C: ConnectionTrait,
    {
        Ok(list.update(conn).await?)
    }

    /// Rename a list.
    pub async fn rename<C>(conn: &C, id: &Uuid, name: &str) -> Result<list::Model>
    where
        C: ConnectionTrait,
    {
        let model = Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("List not found: {}", id))?;
        let mut active: list::ActiveModel = model.into();
        active.name = ActiveValue::Set(name.to_string());
        Ok(active.update(conn).await?)
    }

    /// Delete a list; tasks, steps and attachments under it go with it via
    /// foreign-key cascade.
    pub async fn delete<C>(conn: &C, list: list::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        list.delete(conn).await?;
        Ok(())
    }

    /// Delete every list (restore clears local data through this).
    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let res = list::Entity::delete_many().exec(conn).await?;
        Ok(res.rows_affected)
    }

    /// Next free position at the end of the ordering.
    pub async fn next_position<C>(conn: &C) -> Result<i32>
    where
        C: ConnectionTrait,
    {
        let last = list::Entity::find()
            .order_by_desc(list::Column::Position)
            .one(conn)
            .await?;
        Ok(last.map(|l| l.position + 1).unwrap_or(0))
    }

    /// Move a list to a new position and renumber so positions stay a dense
    /// permutation of 0..N-1.
    pub async fn move_to_position<C>(conn: &C, id: &Uuid, new_position: usize) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let mut lists = Self::get_all(conn).await?;
        let Some(current) = lists.iter().position(|l| l.id == *id) else {
            anyhow::bail!("List not found: {}", id);
        };
        let moved = lists.remove(current);
        let target = new_position.min(lists.len());
        lists.insert(target, moved);

        for (index, model) in lists.into_iter().enumerate() {
            if model.position != index as i32 {
                let mut active: list::ActiveModel = model.into();
                active.position = ActiveValue::Set(index as i32);
                active.update(conn).await?;
            }
        }
        Ok(())
    }

    /// Duplicate a list together with its tasks and their steps.
    ///
    /// Inserts are sequential and not wrapped in a transaction: each row write
    /// is atomic on its own, but a failure partway leaves a partial copy.
    /// Attachments are not duplicated (their content URIs reference external
    /// storage owned by the original).
    pub async fn duplicate<C>(conn: &C, id: &Uuid) -> Result<list::Model>
    where
        C: ConnectionTrait,
    {
        let source = Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("List not found: {}", id))?;

        let now = datetime::now_millis();
        let copy = list::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(format!("{}{}", source.name, DUPLICATE_NAME_SUFFIX)),
            color: ActiveValue::Set(source.color),
            emoji: ActiveValue::Set(source.emoji.clone()),
            created_at: ActiveValue::Set(now),
            position: ActiveValue::Set(Self::next_position(conn).await?),
        };
        let copy = copy.insert(conn).await?;

        let tasks = task::Entity::find()
            .filter(task::Column::ListId.eq(*id))
            .order_by_asc(task::Column::Position)
            .all(conn)
            .await?;

        for source_task in tasks {
            let task_copy = task::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                title: ActiveValue::Set(source_task.title.clone()),
                description: ActiveValue::Set(source_task.description.clone()),
                is_completed: ActiveValue::Set(source_task.is_completed),
                is_important: ActiveValue::Set(source_task.is_important),
                in_my_day: ActiveValue::Set(false),
                created_at: ActiveValue::Set(now),
                modified_at: ActiveValue::Set(now),
                due_date: ActiveValue::Set(source_task.due_date),
                reminder_at: ActiveValue::Set(None),
                position: ActiveValue::Set(source_task.position),
                list_id: ActiveValue::Set(Some(copy.id)),
            };
            let task_copy = task_copy.insert(conn).await?;

            let steps = step::Entity::find()
                .filter(step::Column::TaskId.eq(source_task.id))
                .order_by_asc(step::Column::Position)
                .all(conn)
                .await?;
            for source_step in steps {
                let step_copy = step::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    task_id: ActiveValue::Set(task_copy.id),
                    title: ActiveValue::Set(source_step.title.clone()),
                    is_completed: ActiveValue::Set(source_step.is_completed),
                    position: ActiveValue::Set(source_step.position),
                };
                step_copy.insert(conn).await?;
            }
        }

        Ok(copy)
    }
}
