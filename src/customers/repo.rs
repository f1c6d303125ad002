use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Customer record: an installed unit at a household, owned by the field
/// technician (`user_id`) who services it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: CustomerDetails,
    pub created_at: OffsetDateTime,
}

/// The free-form field-service columns. Everything here is optional and
/// stored as text the way the mobile client sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct CustomerDetails {
    pub address: Option<String>,
    pub mobile_number: Option<String>,
    pub res_mobile_number: Option<String>,
    pub c_mobile_number: Option<String>,
    pub unit_no: Option<String>,
    pub fitting_date: Option<String>,
    pub contract_date: Option<String>,
    pub con_payment: Option<String>,
    pub cash_cheque: Option<String>,
    pub payment_date: Option<String>,
    pub model: Option<String>,
    pub water_time: Option<String>,
    pub morning: Option<String>,
    pub noon: Option<String>,
    pub evening: Option<String>,
    pub instruction: Option<String>,
}

const CUSTOMER_COLUMNS: &str = "customer_id, user_id, name, address, mobile_number, \
     res_mobile_number, c_mobile_number, unit_no, fitting_date, contract_date, \
     con_payment, cash_cheque, payment_date, model, water_time, morning, noon, \
     evening, instruction, created_at";

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    details: &CustomerDetails,
) -> anyhow::Result<Uuid> {
    let customer_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO customers
            (user_id, name, address, mobile_number, res_mobile_number, c_mobile_number,
             unit_no, fitting_date, contract_date, con_payment, cash_cheque, payment_date,
             model, water_time, morning, noon, evening, instruction)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING customer_id
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(&details.address)
    .bind(&details.mobile_number)
    .bind(&details.res_mobile_number)
    .bind(&details.c_mobile_number)
    .bind(&details.unit_no)
    .bind(&details.fitting_date)
    .bind(&details.contract_date)
    .bind(&details.con_payment)
    .bind(&details.cash_cheque)
    .bind(&details.payment_date)
    .bind(&details.model)
    .bind(&details.water_time)
    .bind(&details.morning)
    .bind(&details.noon)
    .bind(&details.evening)
    .bind(&details.instruction)
    .fetch_one(db)
    .await?;
    Ok(customer_id)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Customer>> {
    let customers =
        sqlx::query_as::<_, Customer>(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers"))
            .fetch_all(db)
            .await?;
    Ok(customers)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Customer>> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(customers)
}

/// Delete scoped to the owning user. Returns the number of rows removed.
pub async fn delete(db: &PgPool, customer_id: Uuid, user_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1 AND user_id = $2")
        .bind(customer_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Full-field overwrite keyed by customer_id. Returns rows matched.
pub async fn update(
    db: &PgPool,
    customer_id: Uuid,
    user_id: Uuid,
    name: &str,
    details: &CustomerDetails,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET user_id = $1, name = $2, address = $3, mobile_number = $4,
            res_mobile_number = $5, c_mobile_number = $6, unit_no = $7,
            fitting_date = $8, contract_date = $9, con_payment = $10,
            cash_cheque = $11, payment_date = $12, model = $13, water_time = $14,
            morning = $15, noon = $16, evening = $17, instruction = $18
        WHERE customer_id = $19
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(&details.address)
    .bind(&details.mobile_number)
    .bind(&details.res_mobile_number)
    .bind(&details.c_mobile_number)
    .bind(&details.unit_no)
    .bind(&details.fitting_date)
    .bind(&details.contract_date)
    .bind(&details.con_payment)
    .bind(&details.cash_cheque)
    .bind(&details.payment_date)
    .bind(&details.model)
    .bind(&details.water_time)
    .bind(&details.morning)
    .bind(&details.noon)
    .bind(&details.evening)
    .bind(&details.instruction)
    .bind(customer_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Whether the (user, customer) pair exists. Guards service-visit writes.
pub async fn pair_exists(db: &PgPool, user_id: Uuid, customer_id: Uuid) -> anyhow::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM customers WHERE user_id = $1 AND customer_id = $2",
    )
    .bind(user_id)
    .bind(customer_id)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
