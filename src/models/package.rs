use crate::entities::{PackageType, product_entity};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePackageRequest {
    #[schema(example = "12-week strength program")]
    pub name: String,
    pub description: Option<String>,
    /// 价格（整数货币单位）
    #[schema(example = 1500)]
    pub price: i64,
    pub package_type: PackageType,
    #[schema(example = 30)]
    pub duration_days: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePackageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_days: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageResponse {
    pub id: i64,
    pub coach_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub package_type: PackageType,
    pub duration_days: Option<i32>,
    pub is_active: bool,
}

impl From<product_entity::Model> for PackageResponse {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            coach_id: m.coach_id,
            name: m.name,
            description: m.description,
            price: m.price,
            package_type: m.package_type,
            duration_days: m.duration_days,
            is_active: m.is_active,
        }
    }
}
