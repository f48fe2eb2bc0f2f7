use crate::entities::{
    PackageType, PurchaseStatus, product_entity as products, profile_entity as profiles,
    purchase_entity as purchases, store_entity as stores,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::NotificationService;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// 状态为 active 且未到期（到期时间严格晚于 now）才算有效
pub fn is_currently_active(purchase: &purchases::Model, now: DateTime<Utc>) -> bool {
    purchase.status == PurchaseStatus::Active && purchase.expires_at.is_none_or(|exp| exp > now)
}

/// 状态在读取时计算，不回写数据库
pub fn effective_status(purchase: &purchases::Model, now: DateTime<Utc>) -> PurchaseStatus {
    if is_currently_active(purchase, now) {
        PurchaseStatus::Active
    } else {
        PurchaseStatus::Expired
    }
}

/// 是否持有任一有效的私教套餐
pub fn has_active_coaching(
    purchases: &[purchases::Model],
    packages: &[products::Model],
    now: DateTime<Utc>,
) -> bool {
    let coaching: HashSet<i64> = packages
        .iter()
        .filter(|p| p.package_type == PackageType::Coaching)
        .map(|p| p.id)
        .collect();

    purchases
        .iter()
        .any(|p| coaching.contains(&p.package_id) && is_currently_active(p, now))
}

/// 按套餐时长计算到期时间，无时长则永久有效
pub fn expiry_for(
    now: DateTime<Utc>,
    duration_days: Option<i32>,
) -> AppResult<Option<DateTime<Utc>>> {
    let Some(days) = duration_days else {
        return Ok(None);
    };
    now.checked_add_signed(Duration::days(days as i64))
        .map(Some)
        .ok_or_else(|| AppError::ValidationError("Package duration is out of range".to_string()))
}

pub fn summarize_students(
    sales: &[purchases::Model],
    profiles: &[profiles::Model],
    now: DateTime<Utc>,
) -> Vec<CoachStudentSummary> {
    let by_id: HashMap<i64, &profiles::Model> = profiles.iter().map(|p| (p.id, p)).collect();
    let mut grouped: BTreeMap<i64, CoachStudentSummary> = BTreeMap::new();

    for sale in sales {
        let entry = grouped
            .entry(sale.student_id)
            .or_insert_with(|| CoachStudentSummary {
                student_id: sale.student_id,
                full_name: by_id.get(&sale.student_id).map(|p| p.full_name.clone()),
                email: by_id.get(&sale.student_id).map(|p| p.email.clone()),
                purchase_count: 0,
                total_spent: 0,
                has_active_purchase: false,
            });
        entry.purchase_count += 1;
        entry.total_spent = entry.total_spent.saturating_add(sale.price);
        entry.has_active_purchase |= is_currently_active(sale, now);
    }

    grouped.into_values().collect()
}

#[derive(Clone)]
pub struct PurchaseService {
    pool: DatabaseConnection,
    notification_service: NotificationService,
}

impl PurchaseService {
    pub fn new(pool: DatabaseConnection, notification_service: NotificationService) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    /// 购买套餐：记录价格与名称快照
    pub async fn checkout(
        &self,
        student_id: i64,
        req: CheckoutRequest,
    ) -> AppResult<PurchaseResponse> {
        let package = products::Entity::find_by_id(req.package_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Package not found".to_string()))?;

        if !package.is_active {
            return Err(AppError::ValidationError(
                "Package is not available".to_string(),
            ));
        }
        if package.coach_id == student_id {
            return Err(AppError::ValidationError(
                "Cannot purchase your own package".to_string(),
            ));
        }

        let store = stores::Entity::find()
            .filter(stores::Column::CoachId.eq(package.coach_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::ValidationError("Coach has no store".to_string()))?;

        let now = Utc::now();
        let expires_at = expiry_for(now, package.duration_days)?;

        let created = purchases::ActiveModel {
            student_id: Set(student_id),
            coach_id: Set(package.coach_id),
            store_id: Set(store.id),
            package_id: Set(package.id),
            package_name: Set(package.name.clone()),
            price: Set(package.price),
            status: Set(PurchaseStatus::Active),
            purchased_at: Set(now),
            expires_at: Set(expires_at),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Student {student_id} purchased package {} from store {} for {}",
            package.id,
            store.id,
            package.price
        );

        self.notification_service
            .notify_best_effort(
                package.coach_id,
                NotificationKind::Purchase,
                format!("New purchase: {}", package.name),
                None,
            )
            .await;

        Ok(PurchaseResponse::from_model(created, now))
    }

    pub async fn list_student_purchases(
        &self,
        student_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PurchaseResponse>> {
        let select = purchases::Entity::find()
            .filter(purchases::Column::StudentId.eq(student_id));
        let total = select.clone().count(&self.pool).await?;
        let now = Utc::now();
        let items = select
            .order_by_desc(purchases::Column::PurchasedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| PurchaseResponse::from_model(m, now))
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    /// 每次请求重新读取，不缓存
    pub async fn coaching_access(&self, student_id: i64) -> AppResult<CoachingAccessResponse> {
        let (owned, coaching_packages) = tokio::try_join!(
            purchases::Entity::find()
                .filter(purchases::Column::StudentId.eq(student_id))
                .all(&self.pool),
            products::Entity::find()
                .filter(products::Column::PackageType.eq(PackageType::Coaching))
                .all(&self.pool),
        )?;

        Ok(CoachingAccessResponse {
            has_active_coaching: has_active_coaching(&owned, &coaching_packages, Utc::now()),
        })
    }

    pub async fn list_coach_sales(
        &self,
        coach_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PurchaseResponse>> {
        let select = purchases::Entity::find().filter(purchases::Column::CoachId.eq(coach_id));
        let total = select.clone().count(&self.pool).await?;
        let now = Utc::now();
        let items = select
            .order_by_desc(purchases::Column::PurchasedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| PurchaseResponse::from_model(m, now))
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn list_coach_students(&self, coach_id: i64) -> AppResult<Vec<CoachStudentSummary>> {
        let sales = purchases::Entity::find()
            .filter(purchases::Column::CoachId.eq(coach_id))
            .all(&self.pool)
            .await?;
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let student_ids: HashSet<i64> = sales.iter().map(|s| s.student_id).collect();
        let student_profiles = profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(student_ids))
            .all(&self.pool)
            .await?;

        Ok(summarize_students(&sales, &student_profiles, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;

    fn package(id: i64, package_type: PackageType) -> products::Model {
        products::Model {
            id,
            coach_id: 7,
            name: format!("package-{id}"),
            description: None,
            price: 1000,
            package_type,
            duration_days: Some(30),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn purchase(
        package_id: i64,
        status: PurchaseStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> purchases::Model {
        purchases::Model {
            id: package_id * 100,
            student_id: 1,
            coach_id: 7,
            store_id: 3,
            package_id,
            package_name: format!("package-{package_id}"),
            price: 1000,
            status,
            purchased_at: Utc::now() - Duration::days(10),
            expires_at,
        }
    }

    #[test]
    fn test_empty_purchases_have_no_coaching() {
        let packages = vec![package(1, PackageType::Coaching)];
        assert!(!has_active_coaching(&[], &packages, Utc::now()));
    }

    #[test]
    fn test_active_coaching_purchase_qualifies() {
        let now = Utc::now();
        let packages = vec![package(1, PackageType::Coaching)];
        let owned = vec![purchase(1, PurchaseStatus::Active, Some(now + Duration::days(1)))];
        assert!(has_active_coaching(&owned, &packages, now));

        let open_ended = vec![purchase(1, PurchaseStatus::Active, None)];
        assert!(has_active_coaching(&open_ended, &packages, now));
    }

    #[test]
    fn test_expired_coaching_purchases_do_not_qualify() {
        let now = Utc::now();
        let packages = vec![package(1, PackageType::Coaching), package(2, PackageType::Coaching)];
        let owned = vec![
            // status 仍为 active 但已过期
            purchase(1, PurchaseStatus::Active, Some(now - Duration::days(1))),
            purchase(2, PurchaseStatus::Expired, None),
        ];
        assert!(!has_active_coaching(&owned, &packages, now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let p = purchase(1, PurchaseStatus::Active, Some(now));
        assert!(!is_currently_active(&p, now));
        assert_eq!(effective_status(&p, now), PurchaseStatus::Expired);
    }

    #[test]
    fn test_content_packages_do_not_unlock_coaching() {
        let now = Utc::now();
        let packages = vec![package(1, PackageType::Content)];
        let owned = vec![purchase(1, PurchaseStatus::Active, None)];
        assert!(!has_active_coaching(&owned, &packages, now));
    }

    #[test]
    fn test_expiry_for_duration() {
        let now = Utc::now();
        assert_eq!(expiry_for(now, None).unwrap(), None);
        assert_eq!(expiry_for(now, Some(30)).unwrap(), Some(now + Duration::days(30)));
        assert!(matches!(
            expiry_for(now, Some(i32::MAX)),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_summarize_students() {
        let now = Utc::now();
        let mut second = purchase(2, PurchaseStatus::Active, Some(now - Duration::days(1)));
        second.price = 500;
        let mut other = purchase(3, PurchaseStatus::Active, None);
        other.student_id = 2;

        let profiles = vec![profiles::Model {
            id: 1,
            full_name: "Noa".to_string(),
            email: "noa@example.com".to_string(),
            role: UserRole::Student,
            created_at: None,
            updated_at: None,
        }];

        let summary = summarize_students(
            &[purchase(1, PurchaseStatus::Expired, None), second, other],
            &profiles,
            now,
        );
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].student_id, 1);
        assert_eq!(summary[0].full_name.as_deref(), Some("Noa"));
        assert_eq!(summary[0].purchase_count, 2);
        assert_eq!(summary[0].total_spent, 1500);
        assert!(!summary[0].has_active_purchase);
        assert_eq!(summary[1].full_name, None);
        assert!(summary[1].has_active_purchase);
    }
}
