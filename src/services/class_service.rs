use crate::entities::{
    ClassStatus, class_enrollment_entity as enrollments, group_class_entity as classes,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::NotificationService;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

const MAX_DURATION_MINUTES: i32 = 480;
const MAX_PARTICIPANTS: i32 = 500;
const MAX_SCHEDULE_AHEAD_DAYS: i64 = 365;

pub fn validate_new_class(req: &CreateClassRequest, now: DateTime<Utc>) -> AppResult<()> {
    let title_len = req.title.trim().chars().count();
    if title_len == 0 || title_len > 100 {
        return Err(AppError::ValidationError(
            "Title must be between 1 and 100 characters".to_string(),
        ));
    }
    if req.scheduled_at <= now {
        return Err(AppError::ValidationError(
            "Class must be scheduled in the future".to_string(),
        ));
    }
    if req.scheduled_at - now > Duration::days(MAX_SCHEDULE_AHEAD_DAYS) {
        return Err(AppError::ValidationError(format!(
            "Class must be scheduled within {MAX_SCHEDULE_AHEAD_DAYS} days"
        )));
    }
    if !(1..=MAX_DURATION_MINUTES).contains(&req.duration_minutes) {
        return Err(AppError::ValidationError(format!(
            "Duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
        )));
    }
    if !(1..=MAX_PARTICIPANTS).contains(&req.max_participants) {
        return Err(AppError::ValidationError(format!(
            "Max participants must be between 1 and {MAX_PARTICIPANTS}"
        )));
    }
    Ok(())
}

/// 报名条件：未开始、未满员、未重复报名
pub fn check_enrollable(
    class: &classes::Model,
    enrolled: &[i64],
    student_id: i64,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if class.coach_id == student_id {
        return Err(AppError::ValidationError(
            "Cannot enroll in your own class".to_string(),
        ));
    }
    if class.status != ClassStatus::Scheduled || class.scheduled_at <= now {
        return Err(AppError::ValidationError(
            "Class is no longer open for enrollment".to_string(),
        ));
    }
    if enrolled.contains(&student_id) {
        return Err(AppError::Conflict("Already enrolled in this class".to_string()));
    }
    if enrolled.len() as i64 >= class.max_participants as i64 {
        return Err(AppError::Conflict("Class is full".to_string()));
    }
    Ok(())
}

/// 根据当前时间推算课程状态，只前进不后退
pub fn clock_status(class: &classes::Model, now: DateTime<Utc>) -> ClassStatus {
    let implied = if now >= class.ends_at() {
        ClassStatus::Completed
    } else if now >= class.scheduled_at {
        ClassStatus::Live
    } else {
        ClassStatus::Scheduled
    };
    if class.status.can_advance_to(implied) {
        implied
    } else {
        class.status
    }
}

#[derive(Clone)]
pub struct ClassService {
    pool: DatabaseConnection,
    notification_service: NotificationService,
}

impl ClassService {
    pub fn new(pool: DatabaseConnection, notification_service: NotificationService) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    async fn participants_of(&self, class_ids: Vec<i64>) -> AppResult<HashMap<i64, Vec<i64>>> {
        let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
        if class_ids.is_empty() {
            return Ok(grouped);
        }
        let rows = enrollments::Entity::find()
            .filter(enrollments::Column::ClassId.is_in(class_ids))
            .order_by_asc(enrollments::Column::Id)
            .all(&self.pool)
            .await?;
        for row in rows {
            grouped.entry(row.class_id).or_default().push(row.student_id);
        }
        Ok(grouped)
    }

    async fn with_participants(&self, list: Vec<classes::Model>) -> AppResult<Vec<ClassResponse>> {
        let mut participants = self
            .participants_of(list.iter().map(|c| c.id).collect())
            .await?;
        Ok(list
            .into_iter()
            .map(|c| {
                let enrolled = participants.remove(&c.id).unwrap_or_default();
                ClassResponse::new(c, enrolled)
            })
            .collect())
    }

    async fn find_class(&self, class_id: i64) -> AppResult<classes::Model> {
        classes::Entity::find_by_id(class_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Class not found".to_string()))
    }

    pub async fn create_class(
        &self,
        coach_id: i64,
        req: CreateClassRequest,
    ) -> AppResult<ClassResponse> {
        validate_new_class(&req, Utc::now())?;

        let created = classes::ActiveModel {
            coach_id: Set(coach_id),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            scheduled_at: Set(req.scheduled_at),
            duration_minutes: Set(req.duration_minutes),
            max_participants: Set(req.max_participants),
            status: Set(ClassStatus::Scheduled),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Coach {coach_id} scheduled class {} at {}", created.id, created.scheduled_at);
        Ok(ClassResponse::new(created, Vec::new()))
    }

    pub async fn list_coach_classes(&self, coach_id: i64) -> AppResult<Vec<ClassResponse>> {
        let list = classes::Entity::find()
            .filter(classes::Column::CoachId.eq(coach_id))
            .order_by_asc(classes::Column::ScheduledAt)
            .all(&self.pool)
            .await?;
        self.with_participants(list).await
    }

    pub async fn list_upcoming(&self) -> AppResult<Vec<ClassResponse>> {
        let list = classes::Entity::find()
            .filter(classes::Column::Status.eq(ClassStatus::Scheduled))
            .filter(classes::Column::ScheduledAt.gt(Utc::now()))
            .order_by_asc(classes::Column::ScheduledAt)
            .all(&self.pool)
            .await?;
        self.with_participants(list).await
    }

    pub async fn list_student_classes(&self, student_id: i64) -> AppResult<Vec<ClassResponse>> {
        let class_ids: Vec<i64> = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student_id))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|e| e.class_id)
            .collect();
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = classes::Entity::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .order_by_asc(classes::Column::ScheduledAt)
            .all(&self.pool)
            .await?;
        self.with_participants(list).await
    }

    /// 锁住课程行后再检查名额，避免并发报名超员
    pub async fn enroll(&self, student_id: i64, class_id: i64) -> AppResult<ClassResponse> {
        let txn = self.pool.begin().await?;

        let class = classes::Entity::find_by_id(class_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Class not found".to_string()))?;

        let enrolled: Vec<i64> = enrollments::Entity::find()
            .filter(enrollments::Column::ClassId.eq(class_id))
            .order_by_asc(enrollments::Column::Id)
            .all(&txn)
            .await?
            .into_iter()
            .map(|e| e.student_id)
            .collect();

        check_enrollable(&class, &enrolled, student_id, Utc::now())?;

        enrollments::ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::unique_or_db(e, "Already enrolled in this class"))?;

        txn.commit().await?;

        self.notification_service
            .notify_best_effort(
                class.coach_id,
                NotificationKind::Enrollment,
                format!("New enrollment: {}", class.title),
                None,
            )
            .await;

        let mut participants = enrolled;
        participants.push(student_id);
        Ok(ClassResponse::new(class, participants))
    }

    pub async fn cancel_enrollment(&self, student_id: i64, class_id: i64) -> AppResult<()> {
        let class = self.find_class(class_id).await?;
        if class.status != ClassStatus::Scheduled || class.scheduled_at <= Utc::now() {
            return Err(AppError::ValidationError(
                "Enrollment can only be cancelled before the class starts".to_string(),
            ));
        }

        let result = enrollments::Entity::delete_many()
            .filter(enrollments::Column::ClassId.eq(class_id))
            .filter(enrollments::Column::StudentId.eq(student_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Enrollment not found".to_string()));
        }
        Ok(())
    }

    pub async fn update_status(
        &self,
        coach_id: i64,
        class_id: i64,
        status: ClassStatus,
    ) -> AppResult<ClassResponse> {
        let class = self.find_class(class_id).await?;
        if class.coach_id != coach_id {
            return Err(AppError::NotFound("Class not found".to_string()));
        }
        if !class.status.can_advance_to(status) {
            return Err(AppError::ValidationError(format!(
                "Cannot change class status from {} to {status}",
                class.status
            )));
        }

        let mut model = class.into_active_model();
        model.status = Set(status);
        model.updated_at = Set(Some(Utc::now()));
        let updated = model.update(&self.pool).await?;

        let enrolled = self
            .participants_of(vec![class_id])
            .await?
            .remove(&class_id)
            .unwrap_or_default();
        Ok(ClassResponse::new(updated, enrolled))
    }

    /// 后台任务调用：按时间推进课程状态
    pub async fn advance_by_clock(&self) -> AppResult<u64> {
        let now = Utc::now();
        let pending = classes::Entity::find()
            .filter(classes::Column::Status.ne(ClassStatus::Completed))
            .filter(classes::Column::ScheduledAt.lte(now))
            .all(&self.pool)
            .await?;

        let mut advanced = 0;
        for class in pending {
            let next = clock_status(&class, now);
            if next == class.status {
                continue;
            }
            let class_id = class.id;
            let mut model = class.into_active_model();
            model.status = Set(next);
            model.updated_at = Set(Some(now));
            model.update(&self.pool).await?;
            log::debug!("Class {class_id} advanced to {next}");
            advanced += 1;
        }
        Ok(advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_at(scheduled_at: DateTime<Utc>, status: ClassStatus) -> classes::Model {
        classes::Model {
            id: 1,
            coach_id: 9,
            title: "Morning HIIT".to_string(),
            description: None,
            scheduled_at,
            duration_minutes: 60,
            max_participants: 2,
            status,
            created_at: None,
            updated_at: None,
        }
    }

    fn request(scheduled_at: DateTime<Utc>) -> CreateClassRequest {
        CreateClassRequest {
            title: "Yoga".to_string(),
            description: None,
            scheduled_at,
            duration_minutes: 45,
            max_participants: 10,
        }
    }

    #[test]
    fn test_validate_new_class() {
        let now = Utc::now();
        assert!(validate_new_class(&request(now + Duration::hours(1)), now).is_ok());
        assert!(validate_new_class(&request(now - Duration::hours(1)), now).is_err());

        let mut long = request(now + Duration::hours(1));
        long.duration_minutes = MAX_DURATION_MINUTES + 1;
        assert!(validate_new_class(&long, now).is_err());

        let mut empty = request(now + Duration::hours(1));
        empty.max_participants = 0;
        assert!(validate_new_class(&empty, now).is_err());

        assert!(validate_new_class(&request(now + Duration::days(30)), now).is_ok());
        assert!(validate_new_class(&request(now + Duration::days(366)), now).is_err());
        assert!(validate_new_class(&request(DateTime::<Utc>::MAX_UTC), now).is_err());
    }

    #[test]
    fn test_ends_at_near_max_date() {
        let class = class_at(DateTime::<Utc>::MAX_UTC, ClassStatus::Scheduled);
        assert_eq!(class.ends_at(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_check_enrollable() {
        let now = Utc::now();
        let class = class_at(now + Duration::hours(2), ClassStatus::Scheduled);

        assert!(check_enrollable(&class, &[], 1, now).is_ok());
        assert!(matches!(
            check_enrollable(&class, &[1], 1, now),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            check_enrollable(&class, &[2, 3], 1, now),
            Err(AppError::Conflict(_))
        ));
        assert!(check_enrollable(&class, &[], 9, now).is_err());

        let started = class_at(now - Duration::minutes(5), ClassStatus::Scheduled);
        assert!(check_enrollable(&started, &[], 1, now).is_err());
    }

    #[test]
    fn test_clock_status_moves_forward_only() {
        let now = Utc::now();
        let upcoming = class_at(now + Duration::minutes(10), ClassStatus::Scheduled);
        assert_eq!(clock_status(&upcoming, now), ClassStatus::Scheduled);

        let running = class_at(now - Duration::minutes(10), ClassStatus::Scheduled);
        assert_eq!(clock_status(&running, now), ClassStatus::Live);

        let finished = class_at(now - Duration::minutes(61), ClassStatus::Live);
        assert_eq!(clock_status(&finished, now), ClassStatus::Completed);

        // 教练手动结束的课程不会回退
        let closed_early = class_at(now - Duration::minutes(10), ClassStatus::Completed);
        assert_eq!(clock_status(&closed_early, now), ClassStatus::Completed);
    }
}
