use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub service_id: Option<Uuid>,
    pub address_id: Option<Uuid>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub assessment_data: Option<Value>,
}
