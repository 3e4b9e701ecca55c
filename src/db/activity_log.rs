//! Database queries for the activity log.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::activity_log::{self as activity, ActiveModel, Entity as ActivityLog};
use crate::error::{AppError, AppResult};
use crate::models::{ActivityEntity, ActivityEvent};

use super::ExecutionStore;

impl<C: ConnectionTrait> ExecutionStore<'_, C> {
    /// Insert an activity log row.
    pub async fn insert_activity(&self, event: &ActivityEvent) -> AppResult<activity::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            actor_id: Set(event.actor_id),
            project_id: Set(event.project_id),
            entity_type: Set(event.entity.as_str().to_string()),
            entity_id: Set(event.entity_id),
            action: Set(event.action.as_str().to_string()),
            description: Set(event.description.clone()),
            created_at: Set(event.at),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert activity: {}", e)))
    }

    /// Activity recorded for one entity, oldest first.
    pub async fn list_activity_for_entity(
        &self,
        entity: ActivityEntity,
        entity_id: Uuid,
    ) -> AppResult<Vec<activity::Model>> {
        ActivityLog::find()
            .filter(activity::Column::EntityType.eq(entity.as_str()))
            .filter(activity::Column::EntityId.eq(entity_id))
            .order_by_asc(activity::Column::CreatedAt)
            .order_by_asc(activity::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list activity: {}", e)))
    }
}
