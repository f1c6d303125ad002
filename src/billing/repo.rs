use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration as TimeDuration, OffsetDateTime};
use uuid::Uuid;

/// A purchasable subscription plan. `duration_days` drives the computed
/// subscription window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionPlan {
    pub plan_id: Uuid,
    pub name: String,
    pub price: f64,
    pub duration_days: i32,
}

pub struct NewPayment<'a> {
    pub user_id: Uuid,
    pub payment_id: &'a str,
    pub order_id: Option<&'a str>,
    pub amount: f64,
    pub currency: &'a str,
    pub payment_status: &'a str,
    pub subscription_plan_id: Uuid,
}

/// Append a payment row. Payments are never updated or deleted.
pub async fn record_payment(db: &PgPool, payment: NewPayment<'_>) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payments
            (user_id, payment_id, order_id, amount, currency, payment_status, subscription_plan_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(payment.user_id)
    .bind(payment.payment_id)
    .bind(payment.order_id)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(payment.payment_status)
    .bind(payment.subscription_plan_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn plan_duration(db: &PgPool, plan_id: Uuid) -> anyhow::Result<Option<i32>> {
    let duration = sqlx::query_scalar::<_, i32>(
        "SELECT duration_days FROM subscription_plan WHERE plan_id = $1",
    )
    .bind(plan_id)
    .fetch_optional(db)
    .await?;
    Ok(duration)
}

pub async fn list_plans(db: &PgPool) -> anyhow::Result<Vec<SubscriptionPlan>> {
    let plans = sqlx::query_as::<_, SubscriptionPlan>(
        "SELECT plan_id, name, price, duration_days FROM subscription_plan ORDER BY price",
    )
    .fetch_all(db)
    .await?;
    Ok(plans)
}

/// Append a subscription row derived from a payment and the plan duration.
pub async fn insert_subscription(
    db: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscription_detail
            (user_id, plan_id, subscription_start_date, subscription_end_date, subscription_status)
        VALUES ($1, $2, $3, $4, TRUE)
        "#,
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(start)
    .bind(end)
    .execute(db)
    .await?;
    Ok(())
}

/// End date of the user's most recent subscription, by start date.
pub async fn latest_subscription_end(
    db: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Option<OffsetDateTime>> {
    let end = sqlx::query_scalar::<_, OffsetDateTime>(
        r#"
        SELECT subscription_end_date
        FROM subscription_detail
        WHERE user_id = $1
        ORDER BY subscription_start_date DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(end)
}

pub fn subscription_window(
    start: OffsetDateTime,
    duration_days: i32,
) -> (OffsetDateTime, OffsetDateTime) {
    (start, start + TimeDuration::days(duration_days as i64))
}

/// Active-ness is always re-derived from the end date, never read from the
/// stored status flag.
pub fn subscription_active(end: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    end.map(|e| e > now).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn window_spans_the_plan_duration() {
        let start = datetime!(2024-03-01 12:00 UTC);
        let (s, e) = subscription_window(start, 30);
        assert_eq!(s, start);
        assert_eq!(e, datetime!(2024-03-31 12:00 UTC));
    }

    #[test]
    fn active_only_while_end_date_is_in_the_future() {
        let now = datetime!(2024-03-15 00:00 UTC);
        assert!(subscription_active(
            Some(datetime!(2024-03-16 00:00 UTC)),
            now
        ));
        assert!(!subscription_active(
            Some(datetime!(2024-03-14 00:00 UTC)),
            now
        ));
        assert!(!subscription_active(Some(now), now));
    }

    #[test]
    fn no_subscription_row_means_inactive() {
        assert!(!subscription_active(None, OffsetDateTime::now_utc()));
    }
}
