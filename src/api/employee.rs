use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::paging;
use crate::auth::auth::AuthUser;
use crate::model::employee::{Employee, NewEmployee};
use crate::service::organization as organization_service;
use crate::store::{EmployeeQuery, Store};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub org_id: Option<i64>,
    /// HR/Admin only; other callers always see their direct reports
    pub manager_emp_id: Option<i64>,
    /// matches code, name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid field", body = Object, example = json!({
            "message": "email is not valid"
        })),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Organization or manager not found"),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<NewEmployee>,
) -> actix_web::Result<impl Responder> {
    let employee =
        organization_service::create_employee(store.get_ref(), &auth.actor(), payload.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(employee))
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "Paginated employees", body = EmployeeListResponse),
        (status = 403, description = "No employee profile")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<EmployeeFilter>,
) -> actix_web::Result<impl Responder> {
    let filter = query.into_inner();
    let (page, per_page, offset) = paging(filter.page, filter.per_page);

    let (data, total) = organization_service::list_employees(
        store.get_ref(),
        &auth.actor(),
        EmployeeQuery {
            org_id: filter.org_id,
            manager_emp_id: filter.manager_emp_id,
            search: filter.search,
            limit: i64::from(per_page),
            offset,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let employee =
        organization_service::get_employee(store.get_ref(), &auth.actor(), path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(employee))
}
