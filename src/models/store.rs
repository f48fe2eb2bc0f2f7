use crate::entities::store_entity;
use crate::models::{PackageResponse, ReviewResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    #[schema(example = "Iron Temple")]
    pub name: String,
    #[schema(example = "strength")]
    pub category: String,
    pub description: Option<String>,
    #[schema(example = "🏋️")]
    pub logo_emoji: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub logo_emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreResponse {
    pub id: i64,
    pub coach_id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub rating: f64,
    pub logo_emoji: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoreQuery {
    pub category: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreDetailResponse {
    pub store: StoreResponse,
    pub packages: Vec<PackageResponse>,
    pub reviews: Vec<ReviewResponse>,
}

impl From<store_entity::Model> for StoreResponse {
    fn from(m: store_entity::Model) -> Self {
        Self {
            id: m.id,
            coach_id: m.coach_id,
            name: m.name,
            category: m.category,
            description: m.description,
            rating: m.rating,
            logo_emoji: m.logo_emoji,
            created_at: m.created_at,
        }
    }
}
