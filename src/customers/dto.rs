use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Customer, CustomerDetails};
use crate::billing::repo::SubscriptionPlan;

/// Request body for adding a customer. Only user_id and name are required;
/// the field-service details are all optional.
#[derive(Debug, Deserialize)]
pub struct AddCustomerRequest {
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: CustomerDetails,
}

#[derive(Debug, Serialize)]
pub struct AddCustomerResponse {
    pub message: String,
    pub customer_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub message: String,
    pub data: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
pub struct GetCustomersRequest {
    pub user_id: Option<Uuid>,
}

/// `data` is null rather than an empty list when the user has no customers.
#[derive(Debug, Serialize)]
pub struct CustomersForUserResponse {
    pub message: String,
    pub data: Option<Vec<Customer>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCustomerRequest {
    pub customer_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Full-field overwrite of a customer row.
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub customer_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: CustomerDetails,
}

#[derive(Debug, Deserialize)]
pub struct ProfilePictureRequest {
    pub user_id: Option<Uuid>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub message: String,
    pub data: Vec<SubscriptionPlan>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardRequest {
    pub user_id: Option<Uuid>,
}

/// Per-user aggregates shown on the app's landing screen.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub message: String,
    pub total_customers: i64,
    pub total_services: i64,
    pub subscription_status: bool,
}
