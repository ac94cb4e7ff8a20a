use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::organization::{NewOrganization, Organization};
use crate::service::organization as organization_service;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct MoveOrganization {
    /// null moves the node to the top level
    #[schema(example = 1, nullable = true)]
    pub parent_org_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/organization",
    responses(
        (status = 200, description = "All organization nodes", body = [Organization])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Organization"
)]
pub async fn list_orgs(
    _auth: AuthUser,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    let orgs = organization_service::list_orgs(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(orgs))
}

#[utoipa::path(
    post,
    path = "/api/organization",
    request_body = NewOrganization,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Parent organization not found"),
        (status = 409, description = "Organization code already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Organization"
)]
pub async fn create_org(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<NewOrganization>,
) -> actix_web::Result<impl Responder> {
    let org =
        organization_service::create_org(store.get_ref(), &auth.actor(), payload.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(org))
}

#[utoipa::path(
    put,
    path = "/api/organization/{org_id}/parent",
    params(
        ("org_id", Path, description = "Organization ID")
    ),
    request_body = MoveOrganization,
    responses(
        (status = 200, description = "Organization moved", body = Object, example = json!({
            "message": "Organization moved"
        })),
        (status = 400, description = "Move would create a cycle", body = Object, example = json!({
            "message": "Cycle detected in organization hierarchy"
        })),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Organization not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Organization"
)]
pub async fn reparent(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    payload: web::Json<MoveOrganization>,
) -> actix_web::Result<impl Responder> {
    organization_service::reparent(
        store.get_ref(),
        &auth.actor(),
        path.into_inner(),
        payload.parent_org_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Organization moved" })))
}
