use crate::models::StoreResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct RevenueSummary {
    pub total_revenue: i64,
    pub platform_commission: i64,
    pub coach_payout: i64,
    pub sales_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreRevenue {
    pub store: StoreResponse,
    pub revenue: i64,
    pub sales_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevenueReport {
    pub summary: RevenueSummary,
    pub stores: Vec<StoreRevenue>,
}
