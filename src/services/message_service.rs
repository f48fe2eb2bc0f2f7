use crate::entities::{message_entity as messages, profile_entity as profiles};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::NotificationService;
use chrono::Utc;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

const MAX_BODY_CHARS: usize = 2000;

pub fn validate_body(body: &str) -> AppResult<String> {
    let trimmed = body.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_BODY_CHARS {
        return Err(AppError::ValidationError(format!(
            "Message must be between 1 and {MAX_BODY_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// 按对方分组会话，最近的会话在前
pub fn summarize_conversations(
    user_id: i64,
    history: &[messages::Model],
    names: &HashMap<i64, String>,
) -> Vec<ConversationSummary> {
    let mut by_counterpart: HashMap<i64, ConversationSummary> = HashMap::new();

    for m in history {
        let counterpart = if m.sender_id == user_id {
            m.recipient_id
        } else {
            m.sender_id
        };
        let unread = (m.recipient_id == user_id && m.read_at.is_none()) as i64;

        by_counterpart
            .entry(counterpart)
            .and_modify(|s| {
                s.unread_count += unread;
                let last = &s.last_message;
                if (m.created_at, m.id) > (last.created_at, last.id) {
                    s.last_message = m.clone().into();
                }
            })
            .or_insert_with(|| ConversationSummary {
                counterpart_id: counterpart,
                counterpart_name: names.get(&counterpart).cloned(),
                last_message: m.clone().into(),
                unread_count: unread,
            });
    }

    let mut list: Vec<ConversationSummary> = by_counterpart.into_values().collect();
    list.sort_by(|a, b| {
        (b.last_message.created_at, b.last_message.id)
            .cmp(&(a.last_message.created_at, a.last_message.id))
    });
    list
}

fn between(a: i64, b: i64) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(messages::Column::SenderId.eq(a))
                .add(messages::Column::RecipientId.eq(b)),
        )
        .add(
            Condition::all()
                .add(messages::Column::SenderId.eq(b))
                .add(messages::Column::RecipientId.eq(a)),
        )
}

#[derive(Clone)]
pub struct MessageService {
    pool: DatabaseConnection,
    notification_service: NotificationService,
}

impl MessageService {
    pub fn new(pool: DatabaseConnection, notification_service: NotificationService) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    pub async fn send(&self, sender_id: i64, req: SendMessageRequest) -> AppResult<MessageResponse> {
        let body = validate_body(&req.body)?;
        if req.recipient_id == sender_id {
            return Err(AppError::ValidationError(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        let recipient = profiles::Entity::find_by_id(req.recipient_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        let sender_name = profiles::Entity::find_by_id(sender_id)
            .one(&self.pool)
            .await?
            .map(|p| p.full_name)
            .unwrap_or_else(|| "Someone".to_string());

        let created = messages::ActiveModel {
            sender_id: Set(sender_id),
            recipient_id: Set(recipient.id),
            body: Set(body),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.notification_service
            .notify_best_effort(
                recipient.id,
                NotificationKind::Message,
                format!("New message from {sender_name}"),
                None,
            )
            .await;

        Ok(created.into())
    }

    pub async fn list_conversations(&self, user_id: i64) -> AppResult<Vec<ConversationSummary>> {
        let history = messages::Entity::find()
            .filter(
                Condition::any()
                    .add(messages::Column::SenderId.eq(user_id))
                    .add(messages::Column::RecipientId.eq(user_id)),
            )
            .all(&self.pool)
            .await?;

        let counterparts: Vec<i64> = history
            .iter()
            .map(|m| {
                if m.sender_id == user_id {
                    m.recipient_id
                } else {
                    m.sender_id
                }
            })
            .collect();
        let names: HashMap<i64, String> = if counterparts.is_empty() {
            HashMap::new()
        } else {
            profiles::Entity::find()
                .filter(profiles::Column::Id.is_in(counterparts))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|p| (p.id, p.full_name))
                .collect()
        };

        Ok(summarize_conversations(user_id, &history, &names))
    }

    /// 会话消息按时间正序返回
    pub async fn get_conversation(
        &self,
        user_id: i64,
        counterpart_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<MessageResponse>> {
        let select = messages::Entity::find().filter(between(user_id, counterpart_id));
        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(MessageResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn mark_conversation_read(
        &self,
        user_id: i64,
        counterpart_id: i64,
    ) -> AppResult<AffectedRows> {
        let result = messages::Entity::update_many()
            .col_expr(messages::Column::ReadAt, Expr::value(Utc::now()))
            .filter(messages::Column::SenderId.eq(counterpart_id))
            .filter(messages::Column::RecipientId.eq(user_id))
            .filter(messages::Column::ReadAt.is_null())
            .exec(&self.pool)
            .await?;
        Ok(AffectedRows {
            affected: result.rows_affected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn msg(id: i64, from: i64, to: i64, at: DateTime<Utc>, read: bool) -> messages::Model {
        messages::Model {
            id,
            sender_id: from,
            recipient_id: to,
            body: format!("message {id}"),
            read_at: read.then_some(at),
            created_at: at,
        }
    }

    #[test]
    fn test_validate_body() {
        assert_eq!(validate_body("  hi ").unwrap(), "hi");
        assert!(validate_body("   ").is_err());
        assert!(validate_body(&"x".repeat(MAX_BODY_CHARS + 1)).is_err());
    }

    #[test]
    fn test_summarize_conversations() {
        let t0 = Utc::now() - Duration::hours(3);
        let history = vec![
            msg(1, 1, 2, t0, true),
            msg(2, 2, 1, t0 + Duration::minutes(5), false),
            msg(3, 3, 1, t0 + Duration::hours(1), false),
            msg(4, 2, 1, t0 + Duration::minutes(10), false),
            msg(5, 1, 3, t0 + Duration::hours(2), false),
        ];
        let names = HashMap::from([(2, "Coach Amir".to_string())]);

        let list = summarize_conversations(1, &history, &names);
        assert_eq!(list.len(), 2);

        // 最近的会话排在前面
        assert_eq!(list[0].counterpart_id, 3);
        assert_eq!(list[0].last_message.id, 5);
        assert_eq!(list[0].unread_count, 1);
        assert_eq!(list[0].counterpart_name, None);

        assert_eq!(list[1].counterpart_id, 2);
        assert_eq!(list[1].last_message.id, 4);
        assert_eq!(list[1].unread_count, 2);
        assert_eq!(list[1].counterpart_name.as_deref(), Some("Coach Amir"));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize_conversations(1, &[], &HashMap::new()).is_empty());
    }
}
