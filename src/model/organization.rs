use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrgType {
    Company,
    Department,
    Team,
    ProjectGroup,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Organization {
    pub id: i64,
    #[schema(example = "RND")]
    pub org_code: String,
    #[schema(example = "Research")]
    pub org_name: String,
    pub org_type: OrgType,
    /// empty for a top-level node
    pub parent_org_id: Option<i64>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewOrganization {
    #[schema(example = "RND")]
    pub org_code: String,
    #[schema(example = "Research")]
    pub org_name: String,
    pub org_type: OrgType,
    pub parent_org_id: Option<i64>,
}
