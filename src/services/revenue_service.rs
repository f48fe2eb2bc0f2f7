use crate::entities::{purchase_entity as purchases, store_entity as stores};
use crate::error::AppResult;
use crate::models::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;

/// 平台抽成比例（百分比）
pub const PLATFORM_COMMISSION_PERCENT: i64 = 10;

/// floor(total * 10%)，整数截断
pub fn platform_commission(total_revenue: i64) -> i64 {
    total_revenue.saturating_mul(PLATFORM_COMMISSION_PERCENT) / 100
}

/// 汇总全部购买记录，已过期的也计入历史收入
pub fn aggregate(purchases: &[purchases::Model]) -> RevenueSummary {
    let total_revenue = purchases
        .iter()
        .fold(0i64, |acc, p| acc.saturating_add(p.price));
    let platform_commission = platform_commission(total_revenue);
    RevenueSummary {
        total_revenue,
        platform_commission,
        coach_payout: total_revenue - platform_commission,
        sales_count: purchases.len() as i64,
    }
}

/// 按店铺统计收入，从高到低；收入相同保持输入顺序。
/// 无销售的店铺收入为 0，找不到店铺的购买记录忽略。
pub fn by_store(purchases: &[purchases::Model], stores: &[stores::Model]) -> Vec<StoreRevenue> {
    let mut totals: HashMap<i64, (i64, i64)> = HashMap::new();
    for p in purchases {
        let entry = totals.entry(p.store_id).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(p.price);
        entry.1 += 1;
    }

    let mut ranking: Vec<StoreRevenue> = stores
        .iter()
        .map(|s| {
            let (revenue, sales_count) = totals.get(&s.id).copied().unwrap_or((0, 0));
            StoreRevenue {
                store: StoreResponse::from(s.clone()),
                revenue,
                sales_count,
            }
        })
        .collect();

    // sort_by 是稳定排序
    ranking.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ranking
}

#[derive(Clone)]
pub struct RevenueService {
    pool: DatabaseConnection,
}

impl RevenueService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 平台收入报表（管理员）
    pub async fn platform_report(&self) -> AppResult<RevenueReport> {
        let (store_rows, purchase_rows) = tokio::try_join!(
            stores::Entity::find()
                .order_by_asc(stores::Column::Id)
                .all(&self.pool),
            purchases::Entity::find().all(&self.pool),
        )?;

        let summary = aggregate(&purchase_rows);
        let stores = by_store(&purchase_rows, &store_rows);
        log::debug!(
            "Revenue report: total={} commission={} stores={}",
            summary.total_revenue,
            summary.platform_commission,
            stores.len()
        );
        Ok(RevenueReport { summary, stores })
    }

    /// 教练自己的收入汇总
    pub async fn coach_summary(&self, coach_id: i64) -> AppResult<RevenueSummary> {
        let rows = purchases::Entity::find()
            .filter(purchases::Column::CoachId.eq(coach_id))
            .all(&self.pool)
            .await?;
        Ok(aggregate(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PurchaseStatus;
    use chrono::Utc;

    fn purchase(id: i64, store_id: i64, price: i64) -> purchases::Model {
        purchases::Model {
            id,
            student_id: 100,
            coach_id: store_id * 10,
            store_id,
            package_id: 1,
            package_name: "Package".to_string(),
            price,
            status: PurchaseStatus::Active,
            purchased_at: Utc::now(),
            expires_at: None,
        }
    }

    fn store(id: i64, name: &str) -> stores::Model {
        stores::Model {
            id,
            coach_id: id * 10,
            name: name.to_string(),
            category: "strength".to_string(),
            description: None,
            rating: 0.0,
            logo_emoji: "💪".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_aggregate_example() {
        let rows = vec![purchase(1, 1, 1500), purchase(2, 1, 2000), purchase(3, 2, 500)];
        let summary = aggregate(&rows);
        assert_eq!(summary.total_revenue, 4000);
        assert_eq!(summary.platform_commission, 400);
        assert_eq!(summary.coach_payout, 3600);
        assert_eq!(summary.sales_count, 3);
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(&[]), RevenueSummary::default());
        assert!(by_store(&[], &[]).is_empty());
    }

    #[test]
    fn test_commission_truncates() {
        assert_eq!(platform_commission(9), 0);
        assert_eq!(platform_commission(19), 1);
        assert_eq!(platform_commission(1999), 199);
        for total in [0, 1, 7, 99, 101, 12345, 999_999] {
            let commission = platform_commission(total);
            assert_eq!(commission + (total - commission), total);
            assert!(commission * 10 <= total);
        }
    }

    #[test]
    fn test_huge_totals_saturate() {
        let big = i64::MAX / 2 + 1;
        let rows = vec![purchase(1, 1, big), purchase(2, 1, big)];
        let summary = aggregate(&rows);
        assert_eq!(summary.total_revenue, i64::MAX);
        assert_eq!(
            summary.platform_commission + summary.coach_payout,
            summary.total_revenue
        );

        let ranking = by_store(&rows, &[store(1, "A")]);
        assert_eq!(ranking[0].revenue, i64::MAX);
    }

    #[test]
    fn test_expired_purchases_still_count() {
        let mut expired = purchase(1, 1, 700);
        expired.status = PurchaseStatus::Expired;
        let summary = aggregate(&[expired, purchase(2, 1, 300)]);
        assert_eq!(summary.total_revenue, 1000);
    }

    #[test]
    fn test_by_store_ranking_and_totals() {
        let stores = vec![store(1, "A"), store(2, "B"), store(3, "C")];
        let rows = vec![
            purchase(1, 1, 500),
            purchase(2, 2, 1500),
            purchase(3, 2, 500),
            purchase(4, 3, 800),
        ];
        let ranking = by_store(&rows, &stores);
        let ids: Vec<i64> = ranking.iter().map(|r| r.store.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranking[0].sales_count, 2);

        let sum: i64 = ranking.iter().map(|r| r.revenue).sum();
        assert_eq!(sum, aggregate(&rows).total_revenue);
    }

    #[test]
    fn test_by_store_ties_keep_input_order() {
        let stores = vec![store(5, "E"), store(3, "C"), store(9, "I")];
        let rows = vec![purchase(1, 9, 100), purchase(2, 3, 100), purchase(3, 5, 100)];
        let ids: Vec<i64> = by_store(&rows, &stores).iter().map(|r| r.store.id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }

    #[test]
    fn test_by_store_includes_idle_and_skips_unknown() {
        let stores = vec![store(1, "A"), store(2, "B")];
        let rows = vec![purchase(1, 1, 300), purchase(2, 42, 900)];
        let ranking = by_store(&rows, &stores);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[1].store.id, 2);
        assert_eq!(ranking[1].revenue, 0);
        assert_eq!(ranking[1].sales_count, 0);
    }
}
