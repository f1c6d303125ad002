use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{ServiceVisit, VisitDetails};

/// Request body for recording a service visit.
#[derive(Debug, Deserialize)]
pub struct AddServiceRequest {
    pub customer_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: VisitDetails,
}

#[derive(Debug, Serialize)]
pub struct AddServiceResponse {
    pub message: String,
    pub service_detail_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GetServicesRequest {
    pub customer_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub message: String,
    pub data: Vec<ServiceVisit>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteServiceRequest {
    pub service_detail_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Full-field overwrite of a visit record.
#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub service_detail_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: VisitDetails,
}
