use crate::entities::profile_entity as profiles;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

pub fn validate_full_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if !(2..=50).contains(&len) {
        return Err(AppError::ValidationError(
            "Full name must be between 2 and 50 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct ProfileService {
    pool: DatabaseConnection,
}

impl ProfileService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let profile = profiles::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        Ok(profile.into())
    }

    /// 仅允许修改姓名，角色不可自行变更
    pub async fn update_profile(
        &self,
        user_id: i64,
        req: UpdateProfileRequest,
    ) -> AppResult<ProfileResponse> {
        let full_name = validate_full_name(&req.full_name)?;

        let profile = profiles::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let mut model = profile.into_active_model();
        model.full_name = Set(full_name);
        model.updated_at = Set(Some(Utc::now()));
        let updated = model.update(&self.pool).await?;

        log::info!("Profile {user_id} updated");
        Ok(updated.into())
    }

    pub async fn list_profiles(
        &self,
        query: &ProfileQuery,
    ) -> AppResult<PaginatedResponse<ProfileResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = profiles::Entity::find();
        if let Some(role) = query.role {
            select = select.filter(profiles::Column::Role.eq(role));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(profiles::Column::CreatedAt)
            .order_by_asc(profiles::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ProfileResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_full_name() {
        assert_eq!(validate_full_name("  Dana Levi ").unwrap(), "Dana Levi");
        assert!(validate_full_name("D").is_err());
        assert!(validate_full_name(&"a".repeat(51)).is_err());
        // 按字符计数
        assert!(validate_full_name("李雷").is_ok());
    }
}
