use crate::entities::{PurchaseStatus, purchase_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub package_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: i64,
    pub student_id: i64,
    pub coach_id: i64,
    pub store_id: i64,
    pub package_id: i64,
    pub package_name: String,
    pub price: i64,
    /// 读取时计算的有效状态
    pub status: PurchaseStatus,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PurchaseResponse {
    pub fn from_model(m: purchase_entity::Model, now: DateTime<Utc>) -> Self {
        let status = crate::services::effective_status(&m, now);
        Self {
            id: m.id,
            student_id: m.student_id,
            coach_id: m.coach_id,
            store_id: m.store_id,
            package_id: m.package_id,
            package_name: m.package_name,
            price: m.price,
            status,
            purchased_at: m.purchased_at,
            expires_at: m.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CoachingAccessResponse {
    pub has_active_coaching: bool,
}

/// 至少购买过一次该教练套餐的学员
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CoachStudentSummary {
    pub student_id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub purchase_count: i64,
    pub total_spent: i64,
    pub has_active_purchase: bool,
}
