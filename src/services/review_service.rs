use crate::entities::{
    purchase_entity as purchases, review_entity as reviews, store_entity as stores,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{NotificationService, StoreService};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

const MAX_COMMENT_CHARS: usize = 1000;

pub fn validate_review(req: &CreateReviewRequest) -> AppResult<Option<String>> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::ValidationError(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
    {
        return Err(AppError::ValidationError(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(comment)
}

#[derive(Clone)]
pub struct ReviewService {
    pool: DatabaseConnection,
    store_service: StoreService,
    notification_service: NotificationService,
}

impl ReviewService {
    pub fn new(
        pool: DatabaseConnection,
        store_service: StoreService,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            pool,
            store_service,
            notification_service,
        }
    }

    pub async fn list_store_reviews(&self, store_id: i64) -> AppResult<Vec<ReviewResponse>> {
        let items = reviews::Entity::find()
            .filter(reviews::Column::StoreId.eq(store_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(items.into_iter().map(ReviewResponse::from).collect())
    }

    /// 仅购买过该店铺套餐的学员可评价，每人一次
    pub async fn create_review(
        &self,
        student_id: i64,
        store_id: i64,
        req: CreateReviewRequest,
    ) -> AppResult<ReviewResponse> {
        let comment = validate_review(&req)?;

        let store = stores::Entity::find_by_id(store_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        let purchased = purchases::Entity::find()
            .filter(purchases::Column::StudentId.eq(student_id))
            .filter(purchases::Column::StoreId.eq(store_id))
            .count(&self.pool)
            .await?;
        if purchased == 0 {
            return Err(AppError::Forbidden(
                "Only students who purchased from this store can review it".to_string(),
            ));
        }

        let existing = reviews::Entity::find()
            .filter(reviews::Column::StoreId.eq(store_id))
            .filter(reviews::Column::StudentId.eq(student_id))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "You have already reviewed this store".to_string(),
            ));
        }

        // 评价与评分重算同一事务提交
        let txn = self.pool.begin().await?;
        let created = reviews::ActiveModel {
            store_id: Set(store_id),
            student_id: Set(student_id),
            rating: Set(req.rating),
            comment: Set(comment),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::unique_or_db(e, "You have already reviewed this store"))?;

        self.store_service.recompute_rating(&txn, store_id).await?;
        txn.commit().await?;

        self.notification_service
            .notify_best_effort(
                store.coach_id,
                NotificationKind::Review,
                format!("New {}-star review for {}", req.rating, store.name),
                created.comment.clone(),
            )
            .await;

        Ok(created.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(rating: i16, comment: Option<&str>) -> CreateReviewRequest {
        CreateReviewRequest {
            rating,
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_review(&req(1, None)).is_ok());
        assert!(validate_review(&req(5, None)).is_ok());
        assert!(validate_review(&req(0, None)).is_err());
        assert!(validate_review(&req(6, None)).is_err());
    }

    #[test]
    fn test_comment_normalized() {
        assert_eq!(validate_review(&req(4, Some("   "))).unwrap(), None);
        assert_eq!(
            validate_review(&req(4, Some(" great coach "))).unwrap(),
            Some("great coach".to_string())
        );
        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert!(validate_review(&req(4, Some(&long))).is_err());
    }
}
