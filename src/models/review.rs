use crate::entities::review_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    #[schema(example = 5)]
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub store_id: i64,
    pub student_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<review_entity::Model> for ReviewResponse {
    fn from(m: review_entity::Model) -> Self {
        Self {
            id: m.id,
            store_id: m.store_id,
            student_id: m.student_id,
            rating: m.rating,
            comment: m.comment,
            created_at: m.created_at,
        }
    }
}
