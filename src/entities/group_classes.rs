use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "class_status")]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "live")]
    Live,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl ClassStatus {
    fn rank(self) -> u8 {
        match self {
            ClassStatus::Scheduled => 0,
            ClassStatus::Live => 1,
            ClassStatus::Completed => 2,
        }
    }

    /// 状态只能前进：scheduled -> live -> completed
    pub fn can_advance_to(self, next: ClassStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassStatus::Scheduled => write!(f, "scheduled"),
            ClassStatus::Live => write!(f, "live"),
            ClassStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "group_classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub coach_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub status: ClassStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 超出时间范围时退化为开始时间
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at
            .checked_add_signed(chrono::Duration::minutes(self.duration_minutes as i64))
            .unwrap_or(self.scheduled_at)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
