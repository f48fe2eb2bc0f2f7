use crate::entities::{product_entity as products, review_entity as reviews, store_entity as stores};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

const DEFAULT_LOGO: &str = "💪";

/// 评分均值保留一位小数，没有评价时为 0.0
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

fn required_text(value: &str, field: &str, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be between 1 and {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct StoreService {
    pool: DatabaseConnection,
}

impl StoreService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_by_coach(&self, coach_id: i64) -> AppResult<Option<stores::Model>> {
        Ok(stores::Entity::find()
            .filter(stores::Column::CoachId.eq(coach_id))
            .one(&self.pool)
            .await?)
    }

    pub async fn get_my_store(&self, coach_id: i64) -> AppResult<StoreResponse> {
        self.find_by_coach(coach_id)
            .await?
            .map(StoreResponse::from)
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))
    }

    /// 每位教练只能开一家店
    pub async fn create_store(
        &self,
        coach_id: i64,
        req: CreateStoreRequest,
    ) -> AppResult<StoreResponse> {
        let name = required_text(&req.name, "Store name", 100)?;
        let category = required_text(&req.category, "Category", 50)?.to_lowercase();

        if self.find_by_coach(coach_id).await?.is_some() {
            return Err(AppError::Conflict("Coach already has a store".to_string()));
        }

        let logo_emoji = req
            .logo_emoji
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_LOGO.to_string());

        let created = stores::ActiveModel {
            coach_id: Set(coach_id),
            name: Set(name),
            category: Set(category),
            description: Set(req.description),
            rating: Set(0.0),
            logo_emoji: Set(logo_emoji),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::unique_or_db(e, "Coach already has a store"))?;

        log::info!("Coach {coach_id} opened store {}", created.id);
        Ok(created.into())
    }

    pub async fn update_store(
        &self,
        coach_id: i64,
        req: UpdateStoreRequest,
    ) -> AppResult<StoreResponse> {
        let store = self
            .find_by_coach(coach_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        let mut model = store.into_active_model();
        if let Some(name) = req.name {
            model.name = Set(required_text(&name, "Store name", 100)?);
        }
        if let Some(category) = req.category {
            model.category = Set(required_text(&category, "Category", 50)?.to_lowercase());
        }
        if let Some(description) = req.description {
            model.description = Set(Some(description));
        }
        if let Some(emoji) = req.logo_emoji
            && !emoji.trim().is_empty()
        {
            model.logo_emoji = Set(emoji.trim().to_string());
        }
        model.updated_at = Set(Some(Utc::now()));

        Ok(model.update(&self.pool).await?.into())
    }

    pub async fn list_stores(&self, query: &StoreQuery) -> AppResult<PaginatedResponse<StoreResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = stores::Entity::find();
        if let Some(category) = query.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            select = select.filter(stores::Column::Category.eq(category.to_lowercase()));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(stores::Column::Rating)
            .order_by_asc(stores::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(StoreResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 店铺详情：只展示上架中的套餐
    pub async fn get_store_detail(&self, store_id: i64) -> AppResult<StoreDetailResponse> {
        let store = stores::Entity::find_by_id(store_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        let (packages, store_reviews) = tokio::try_join!(
            products::Entity::find()
                .filter(products::Column::CoachId.eq(store.coach_id))
                .filter(products::Column::IsActive.eq(true))
                .order_by_asc(products::Column::Price)
                .all(&self.pool),
            reviews::Entity::find()
                .filter(reviews::Column::StoreId.eq(store.id))
                .order_by_desc(reviews::Column::CreatedAt)
                .all(&self.pool),
        )?;

        Ok(StoreDetailResponse {
            store: store.into(),
            packages: packages.into_iter().map(PackageResponse::from).collect(),
            reviews: store_reviews.into_iter().map(ReviewResponse::from).collect(),
        })
    }

    /// 可在调用方的事务中执行
    pub async fn recompute_rating<C: ConnectionTrait>(
        &self,
        db: &C,
        store_id: i64,
    ) -> AppResult<f64> {
        let ratings: Vec<i16> = reviews::Entity::find()
            .select_only()
            .column(reviews::Column::Rating)
            .filter(reviews::Column::StoreId.eq(store_id))
            .into_tuple()
            .all(db)
            .await?;

        let rating = average_rating(&ratings);
        stores::ActiveModel {
            id: Set(store_id),
            rating: Set(rating),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .update(db)
        .await?;

        log::debug!("Store {store_id} rating now {rating} ({} reviews)", ratings.len());
        Ok(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[5]), 5.0);
        assert_eq!(average_rating(&[5, 4]), 4.5);
        assert_eq!(average_rating(&[5, 4, 4]), 4.3);
        assert_eq!(average_rating(&[1, 2, 2]), 1.7);
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Iron  ", "Store name", 100).unwrap(), "Iron");
        assert!(required_text("   ", "Store name", 100).is_err());
        assert!(required_text(&"x".repeat(51), "Category", 50).is_err());
    }
}
