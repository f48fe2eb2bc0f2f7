use crate::entities::{ClassStatus, group_class_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateClassRequest {
    #[schema(example = "Morning HIIT")]
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[schema(example = 45)]
    pub duration_minutes: i32,
    #[schema(example = 12)]
    pub max_participants: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateClassStatusRequest {
    pub status: ClassStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassResponse {
    pub id: i64,
    pub coach_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub status: ClassStatus,
    pub enrolled_count: i64,
    pub enrolled_participants: Vec<i64>,
}

impl ClassResponse {
    pub fn new(m: group_class_entity::Model, enrolled_participants: Vec<i64>) -> Self {
        Self {
            id: m.id,
            coach_id: m.coach_id,
            title: m.title,
            description: m.description,
            scheduled_at: m.scheduled_at,
            duration_minutes: m.duration_minutes,
            max_participants: m.max_participants,
            status: m.status,
            enrolled_count: enrolled_participants.len() as i64,
            enrolled_participants,
        }
    }
}
