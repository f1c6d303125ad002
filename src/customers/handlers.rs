use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::auth::extractors::AuthUser;
use crate::auth::repo::User;
use crate::billing;
use crate::common::MessageResponse;
use crate::error::ApiError;
use crate::services;
use crate::state::AppState;

use super::dto::{
    AddCustomerRequest, AddCustomerResponse, CustomerListResponse, CustomersForUserResponse,
    DashboardRequest, DashboardResponse, DeleteCustomerRequest, GetCustomersRequest,
    PlanListResponse, ProfilePictureRequest, UpdateCustomerRequest,
};
use super::repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_customer))
        .route("/getAllCustomers", get(get_all_customers))
        .route("/getCustomerById", post(get_customers_for_user))
        .route("/deleteCustomerById", post(delete_customer))
        .route("/updateCustomerById", post(update_customer))
        .route("/updateProfilePicture", post(update_profile_picture))
        .route("/subscriptionPlan", post(subscription_plans))
        .route("/dashboard", post(dashboard))
}

fn require<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(message))
}

#[instrument(skip(state, payload))]
async fn add_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AddCustomerRequest>,
) -> Result<(StatusCode, Json<AddCustomerResponse>), ApiError> {
    const MISSING: &str = "user_id and name are required";
    let user_id = require(payload.user_id, MISSING)?;
    let name = require(payload.name, MISSING)?;

    if user_id != auth.id {
        return Err(ApiError::forbidden("User ID does not match the token"));
    }

    let customer_id = repo::insert(&state.db, user_id, &name, &payload.details).await?;

    info!(%user_id, %customer_id, "customer added");
    Ok((
        StatusCode::CREATED,
        Json(AddCustomerResponse {
            message: "Customer added successfully".into(),
            customer_id,
        }),
    ))
}

#[instrument(skip(state))]
async fn get_all_customers(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<CustomerListResponse>, ApiError> {
    let data = repo::list_all(&state.db).await?;
    Ok(Json(CustomerListResponse {
        message: "Customer data fetched successfully".into(),
        data,
    }))
}

#[instrument(skip(state, payload))]
async fn get_customers_for_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<GetCustomersRequest>,
) -> Result<Json<CustomersForUserResponse>, ApiError> {
    let user_id = require(payload.user_id, "user_id is required")?;

    let customers = repo::list_by_user(&state.db, user_id).await?;
    let data = if customers.is_empty() {
        None
    } else {
        Some(customers)
    };
    Ok(Json(CustomersForUserResponse {
        message: "Customer data fetched successfully".into(),
        data,
    }))
}

#[instrument(skip(state, payload))]
async fn delete_customer(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<DeleteCustomerRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let customer_id = require(payload.customer_id, "customer_id is required")?;
    let user_id = require(payload.user_id, "user_id is required")?;

    let rows = repo::delete(&state.db, customer_id, user_id).await?;
    if rows == 0 {
        return Err(ApiError::not_found("Customer not found"));
    }

    info!(%user_id, %customer_id, "customer deleted");
    Ok(Json(MessageResponse::new("Customer deleted successfully")))
}

#[instrument(skip(state, payload))]
async fn update_customer(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    const MISSING: &str = "Customer ID and User ID are required";
    let customer_id = require(payload.customer_id, MISSING)?;
    let user_id = require(payload.user_id, MISSING)?;
    let name = payload.name.unwrap_or_default();

    let rows = repo::update(&state.db, customer_id, user_id, &name, &payload.details).await?;
    if rows == 0 {
        return Err(ApiError::not_found("Customer not found"));
    }

    info!(%user_id, %customer_id, "customer updated");
    Ok(Json(MessageResponse::new("Customer updated successfully")))
}

#[instrument(skip(state, payload))]
async fn update_profile_picture(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<ProfilePictureRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    const MISSING: &str = "user_id and profile_picture are required";
    let user_id = require(payload.user_id, MISSING)?;
    let profile_picture = require(payload.profile_picture, MISSING)?;

    let rows = User::update_profile_picture(&state.db, user_id, &profile_picture).await?;
    if rows == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    info!(%user_id, "profile picture updated");
    Ok(Json(MessageResponse::new(
        "Profile picture updated successfully",
    )))
}

#[instrument(skip(state))]
async fn subscription_plans(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<PlanListResponse>, ApiError> {
    let data = billing::repo::list_plans(&state.db).await?;
    Ok(Json(PlanListResponse {
        message: "Subscription plans fetched successfully".into(),
        data,
    }))
}

#[instrument(skip(state, payload))]
async fn dashboard(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<DashboardRequest>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user_id = require(payload.user_id, "user_id is required")?;

    let total_customers = repo::count_by_user(&state.db, user_id).await?;
    let total_services = services::repo::count_by_user(&state.db, user_id).await?;

    // Same degradation as login: a failed subscription lookup reads as
    // "not subscribed", it does not fail the dashboard.
    let subscription_end = match billing::repo::latest_subscription_end(&state.db, user_id).await {
        Ok(end) => end,
        Err(e) => {
            error!(error = %e, %user_id, "subscription lookup failed");
            None
        }
    };
    let subscription_status =
        billing::repo::subscription_active(subscription_end, OffsetDateTime::now_utc());

    Ok(Json(DashboardResponse {
        message: "Dashboard data fetched successfully".into(),
        total_customers,
        total_services,
        subscription_status,
    }))
}
