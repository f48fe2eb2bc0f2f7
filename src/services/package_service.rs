use crate::entities::product_entity as products;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

/// 以分为单位，上限一百万元
pub const MAX_PRICE: i64 = 100_000_000;
pub const MAX_DURATION_DAYS: i32 = 3650;

fn validate_price(price: i64) -> AppResult<()> {
    if !(0..=MAX_PRICE).contains(&price) {
        return Err(AppError::ValidationError(format!(
            "Price must be between 0 and {MAX_PRICE}"
        )));
    }
    Ok(())
}

fn validate_duration(duration_days: Option<i32>) -> AppResult<()> {
    if let Some(days) = duration_days
        && !(1..=MAX_DURATION_DAYS).contains(&days)
    {
        return Err(AppError::ValidationError(format!(
            "Duration must be between 1 and {MAX_DURATION_DAYS} days"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        return Err(AppError::ValidationError(
            "Package name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct PackageService {
    pool: DatabaseConnection,
}

impl PackageService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn find_owned(&self, coach_id: i64, package_id: i64) -> AppResult<products::Model> {
        products::Entity::find_by_id(package_id)
            .filter(products::Column::CoachId.eq(coach_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Package not found".to_string()))
    }

    pub async fn list_coach_packages(&self, coach_id: i64) -> AppResult<Vec<PackageResponse>> {
        let items = products::Entity::find()
            .filter(products::Column::CoachId.eq(coach_id))
            .order_by_desc(products::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(items.into_iter().map(PackageResponse::from).collect())
    }

    pub async fn create_package(
        &self,
        coach_id: i64,
        req: CreatePackageRequest,
    ) -> AppResult<PackageResponse> {
        let name = validate_name(&req.name)?;
        validate_price(req.price)?;
        validate_duration(req.duration_days)?;

        let created = products::ActiveModel {
            coach_id: Set(coach_id),
            name: Set(name),
            description: Set(req.description),
            price: Set(req.price),
            package_type: Set(req.package_type),
            duration_days: Set(req.duration_days),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Coach {coach_id} created {} package {}",
            req.package_type,
            created.id
        );
        Ok(created.into())
    }

    /// 已售出的购买记录保留价格快照，不受修改影响
    pub async fn update_package(
        &self,
        coach_id: i64,
        package_id: i64,
        req: UpdatePackageRequest,
    ) -> AppResult<PackageResponse> {
        let package = self.find_owned(coach_id, package_id).await?;
        let mut model = package.into_active_model();

        if let Some(name) = req.name {
            model.name = Set(validate_name(&name)?);
        }
        if let Some(description) = req.description {
            model.description = Set(Some(description));
        }
        if let Some(price) = req.price {
            validate_price(price)?;
            model.price = Set(price);
        }
        if req.duration_days.is_some() {
            validate_duration(req.duration_days)?;
            model.duration_days = Set(req.duration_days);
        }
        if let Some(is_active) = req.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));

        Ok(model.update(&self.pool).await?.into())
    }

    /// 软删除：下架而不是物理删除
    pub async fn deactivate_package(&self, coach_id: i64, package_id: i64) -> AppResult<()> {
        let package = self.find_owned(coach_id, package_id).await?;
        let mut model = package.into_active_model();
        model.is_active = Set(false);
        model.updated_at = Set(Some(Utc::now()));
        model.update(&self.pool).await?;
        log::info!("Coach {coach_id} deactivated package {package_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_validation() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(-1).is_err());
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(i64::MAX).is_err());
        assert!(validate_duration(None).is_ok());
        assert!(validate_duration(Some(30)).is_ok());
        assert!(validate_duration(Some(0)).is_err());
        assert!(validate_duration(Some(MAX_DURATION_DAYS)).is_ok());
        assert!(validate_duration(Some(100_000_000)).is_err());
        assert!(validate_name(" ").is_err());
        assert_eq!(validate_name(" Starter ").unwrap(), "Starter");
    }
}
