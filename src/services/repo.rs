use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One service visit to an installed unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceVisit {
    pub service_detail_id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: VisitDetails,
    pub created_at: OffsetDateTime,
}

/// What happened during the visit, as the technician filled it in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct VisitDetails {
    pub visit_date: Option<String>,
    pub visit_time: Option<String>,
    pub purpose: Option<String>,
    pub particulars: Option<String>,
    pub tech_sign: Option<String>,
    pub cust_sign: Option<String>,
}

const VISIT_COLUMNS: &str = "service_detail_id, customer_id, user_id, visit_date, \
     visit_time, purpose, particulars, tech_sign, cust_sign, created_at";

pub async fn insert(
    db: &PgPool,
    customer_id: Uuid,
    user_id: Uuid,
    details: &VisitDetails,
) -> anyhow::Result<Uuid> {
    let service_detail_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO service_detail
            (customer_id, user_id, visit_date, visit_time, purpose, particulars,
             tech_sign, cust_sign)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING service_detail_id
        "#,
    )
    .bind(customer_id)
    .bind(user_id)
    .bind(&details.visit_date)
    .bind(&details.visit_time)
    .bind(&details.purpose)
    .bind(&details.particulars)
    .bind(&details.tech_sign)
    .bind(&details.cust_sign)
    .fetch_one(db)
    .await?;
    Ok(service_detail_id)
}

pub async fn list_by_customer(
    db: &PgPool,
    customer_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Vec<ServiceVisit>> {
    let visits = sqlx::query_as::<_, ServiceVisit>(&format!(
        "SELECT {VISIT_COLUMNS} FROM service_detail WHERE customer_id = $1 AND user_id = $2"
    ))
    .bind(customer_id)
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(visits)
}

/// Delete scoped to the owning user. Returns the number of rows removed.
pub async fn delete(db: &PgPool, service_detail_id: Uuid, user_id: Uuid) -> anyhow::Result<u64> {
    let result =
        sqlx::query("DELETE FROM service_detail WHERE service_detail_id = $1 AND user_id = $2")
            .bind(service_detail_id)
            .bind(user_id)
            .execute(db)
            .await?;
    Ok(result.rows_affected())
}

/// Full-field overwrite scoped to the owning user. Returns rows matched.
pub async fn update(
    db: &PgPool,
    service_detail_id: Uuid,
    user_id: Uuid,
    details: &VisitDetails,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE service_detail
        SET visit_date = $1, visit_time = $2, purpose = $3, particulars = $4,
            tech_sign = $5, cust_sign = $6
        WHERE service_detail_id = $7 AND user_id = $8
        "#,
    )
    .bind(&details.visit_date)
    .bind(&details.visit_time)
    .bind(&details.purpose)
    .bind(&details.particulars)
    .bind(&details.tech_sign)
    .bind(&details.cust_sign)
    .bind(service_detail_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM service_detail WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}
