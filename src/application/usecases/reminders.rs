use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::{
    application::notify::{NotificationRequest, NotificationSender},
    domain::repositories::reminders::ReminderRepository,
};

/// A reminder rule: how far before the scheduled start the owner is pinged,
/// and how wide the sweep window is around that point. The window absorbs
/// sweep-interval jitter so a booking is never silently skipped.
#[derive(Debug, Clone, Copy)]
struct ReminderRule {
    key: &'static str,
    template_key: &'static str,
    lead: Duration,
    window: Duration,
}

fn rules() -> [ReminderRule; 2] {
    [
        ReminderRule {
            key: "24h",
            template_key: "booking_reminder_24h",
            lead: Duration::hours(24),
            window: Duration::hours(1),
        },
        ReminderRule {
            key: "2h",
            template_key: "booking_reminder_2h",
            lead: Duration::hours(2),
            window: Duration::minutes(30),
        },
    ]
}

/// Periodic sweep that sends pre-service reminders. Idempotent: the
/// (booking, rule) claim in the repository makes overlapping sweeps send at
/// most one notification per pair.
pub struct ReminderSweepUseCase<M>
where
    M: ReminderRepository + 'static,
{
    reminder_repo: Arc<M>,
    notifier: Arc<dyn NotificationSender>,
}

impl<M> ReminderSweepUseCase<M>
where
    M: ReminderRepository + 'static,
{
    pub fn new(reminder_repo: Arc<M>, notifier: Arc<dyn NotificationSender>) -> Self {
        Self {
            reminder_repo,
            notifier,
        }
    }

    /// Runs every rule once against `now`; returns the number of reminders
    /// actually dispatched.
    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut dispatched = 0;

        for rule in rules() {
            let window_from = now + rule.lead - rule.window;
            let window_to = now + rule.lead;

            let due = self
                .reminder_repo
                .list_due(rule.key, window_from, window_to)
                .await
                .map_err(|err| {
                    error!(
                        reminder_rule = rule.key,
                        db_error = ?err,
                        "reminders: failed to list due bookings"
                    );
                    err
                })?;

            for booking in due {
                let claimed = self
                    .reminder_repo
                    .try_mark_sent(booking.id, rule.key)
                    .await
                    .map_err(|err| {
                        error!(
                            booking_id = %booking.id,
                            reminder_rule = rule.key,
                            db_error = ?err,
                            "reminders: failed to claim reminder"
                        );
                        err
                    })?;

                if !claimed {
                    continue;
                }

                self.notifier.dispatch(NotificationRequest {
                    recipient: booking.owner_id,
                    template_key: rule.template_key,
                    variables: HashMap::from([
                        ("booking_id".to_string(), booking.id.to_string()),
                        (
                            "scheduled_at".to_string(),
                            booking.scheduled_at.to_rfc3339(),
                        ),
                    ]),
                });
                dispatched += 1;
            }

            info!(reminder_rule = rule.key, dispatched, "reminders: sweep pass done");
        }

        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notify::MockNotificationSender;
    use crate::domain::{
        entities::bookings::BookingEntity, repositories::reminders::MockReminderRepository,
    };
    use uuid::Uuid;

    fn due_booking(owner_id: Uuid) -> BookingEntity {
        BookingEntity {
            id: Uuid::new_v4(),
            owner_id,
            pet_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            sitter_id: None,
            scheduled_at: Utc::now() + Duration::hours(24),
            duration_minutes: 60,
            status: "confirmed".to_string(),
            total_amount_minor: 25_000,
            payment_status: "paid".to_string(),
            payment_reference: None,
            cancellation_reason: None,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            parent_booking_id: None,
            sequence_number: None,
            actual_started_at: None,
            actual_ended_at: None,
            actual_duration_minutes: None,
            wallet_credited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sweep_sends_only_for_newly_claimed_bookings() {
        let owner_id = Uuid::new_v4();
        let fresh = due_booking(owner_id);
        let already_claimed = due_booking(owner_id);
        let fresh_id = fresh.id;
        let claimed_id = already_claimed.id;

        let mut reminder_repo = MockReminderRepository::new();
        reminder_repo
            .expect_list_due()
            .withf(|rule, _, _| rule == "24h")
            .returning(move |_, _, _| {
                let due = vec![fresh.clone(), already_claimed.clone()];
                Box::pin(async move { Ok(due) })
            });
        reminder_repo
            .expect_list_due()
            .withf(|rule, _, _| rule == "2h")
            .returning(|_, _, _| Box::pin(async { Ok(Vec::new()) }));
        reminder_repo
            .expect_try_mark_sent()
            .returning(move |id, _| {
                let newly = id == fresh_id;
                Box::pin(async move { Ok(newly) })
            });

        let mut notifier = MockNotificationSender::new();
        notifier
            .expect_dispatch()
            .withf(move |request| {
                request.template_key == "booking_reminder_24h"
                    && request.variables["booking_id"] == fresh_id.to_string()
                    && request.variables["booking_id"] != claimed_id.to_string()
            })
            .times(1)
            .returning(|_| ());

        let dispatched = ReminderSweepUseCase::new(Arc::new(reminder_repo), Arc::new(notifier))
            .sweep()
            .await
            .unwrap();

        assert_eq!(dispatched, 1);
    }

    #[tokio::test]
    async fn sweep_windows_trail_the_lead_time() {
        let now = Utc::now();

        let mut reminder_repo = MockReminderRepository::new();
        reminder_repo
            .expect_list_due()
            .withf(move |rule, from, to| match rule {
                "24h" => {
                    *to == now + Duration::hours(24) && *from == *to - Duration::hours(1)
                }
                "2h" => *to == now + Duration::hours(2) && *from == *to - Duration::minutes(30),
                _ => false,
            })
            .times(2)
            .returning(|_, _, _| Box::pin(async { Ok(Vec::new()) }));

        let notifier = MockNotificationSender::new();
        let dispatched = ReminderSweepUseCase::new(Arc::new(reminder_repo), Arc::new(notifier))
            .sweep_at(now)
            .await
            .unwrap();

        assert_eq!(dispatched, 0);
    }
}
