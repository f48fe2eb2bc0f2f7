use crate::entities::notification_entity as notifications;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct NotificationService {
    pool: DatabaseConnection,
}

impl NotificationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        title: impl Into<String>,
        body: Option<String>,
    ) -> AppResult<()> {
        notifications::ActiveModel {
            user_id: Set(user_id),
            kind: Set(kind.as_str().to_string()),
            title: Set(title.into()),
            body: Set(body),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(())
    }

    /// 通知失败不影响主流程
    pub async fn notify_best_effort(
        &self,
        user_id: i64,
        kind: NotificationKind,
        title: impl Into<String>,
        body: Option<String>,
    ) {
        if let Err(e) = self.notify(user_id, kind, title, body).await {
            log::warn!(
                "Failed to create {} notification for user {user_id}: {e:?}",
                kind.as_str()
            );
        }
    }

    pub async fn list(
        &self,
        user_id: i64,
        query: &NotificationQuery,
    ) -> AppResult<PaginatedResponse<NotificationResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id));
        if query.unread_only.unwrap_or(false) {
            select = select.filter(notifications::Column::ReadAt.is_null());
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(NotificationResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> AppResult<()> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notifications::Column::Id.eq(notification_id))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            // 已读或不属于该用户
            let exists = notifications::Entity::find_by_id(notification_id)
                .filter(notifications::Column::UserId.eq(user_id))
                .one(&self.pool)
                .await?
                .is_some();
            if !exists {
                return Err(AppError::NotFound("Notification not found".to_string()));
            }
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i64) -> AppResult<AffectedRows> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.pool)
            .await?;
        Ok(AffectedRows {
            affected: result.rows_affected,
        })
    }
}
