//! Attachment repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::attachment;
use crate::utils::datetime;

/// Repository for attachment database operations.
pub struct AttachmentRepository;

impl AttachmentRepository {
    /// Get all attachments of a task, newest first.
    pub async fn get_for_task<C>(conn: &C, task_id: &Uuid) -> Result<Vec<attachment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(attachment::Entity::find()
            .filter(attachment::Column::TaskId.eq(*task_id))
            .order_by_desc(attachment::Column::CreatedAt)
            .all(conn)
            .await?)
    }

    /// Get a single attachment by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<attachment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(attachment::Entity::find()
            .filter(attachment::Column::Id.eq(*id))
            .one(conn)
            .await?)
    }

    /// Record an attachment for a task.
    pub async fn create<C>(
        conn: &C,
        task_id: &Uuid,
        uri: &str,
        display_name: &str,
        mime_type: &str,
        size_bytes: i64,
    ) -> Result<attachment::Model>
    where
        C: ConnectionTrait,
    {
        let model = attachment::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            task_id: ActiveValue::Set(*task_id),
            uri: ActiveValue::Set(uri.to_string()),
            display_name: ActiveValue::Set(display_name.to_string()),
            mime_type: ActiveValue::Set(mime_type.to_string()),
            size_bytes: ActiveValue::Set(size_bytes),
            created_at: ActiveValue::Set(datetime::now_millis()),
        };
        Ok(model.insert(conn).await?)
    }

    /// Delete an attachment record. The referenced content is external and is
    /// not touched.
    pub async fn delete<C>(conn: &C, attachment: attachment::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        attachment.delete(conn).await?;
        Ok(())
    }
}
