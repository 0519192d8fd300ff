use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Service;

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceList {
    pub items: Vec<Service>,
}
