use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

// rating 为 f64，因此不派生 Eq
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub coach_id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub rating: f64,
    pub logo_emoji: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
