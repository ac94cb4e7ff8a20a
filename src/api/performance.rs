use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::performance::{NewCycle, PerformanceCycle};
use crate::service::performance::{self as performance_service, EvaluationReport};
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct NewEvaluation {
    #[schema(example = 1)]
    pub cycle_id: i64,
    #[schema(example = 1000)]
    pub employee_id: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct FinalScore {
    #[schema(example = 87.5)]
    pub final_score: f64,
}

#[utoipa::path(
    post,
    path = "/api/performance/cycles",
    request_body = NewCycle,
    responses(
        (status = 201, description = "Cycle created", body = PerformanceCycle),
        (status = 400, description = "Invalid dates or weights", body = Object, example = json!({
            "message": "Attendance weight and leave weight must sum to 100 (got 60 + 60)"
        })),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn create_cycle(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<NewCycle>,
) -> actix_web::Result<impl Responder> {
    let cycle =
        performance_service::create_cycle(store.get_ref(), &auth.actor(), payload.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(cycle))
}

#[utoipa::path(
    get,
    path = "/api/performance/cycles/{cycle_id}",
    params(
        ("cycle_id", Path, description = "Cycle ID")
    ),
    responses(
        (status = 200, description = "Cycle", body = PerformanceCycle),
        (status = 404, description = "Performance cycle not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn get_cycle(
    _auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let cycle = performance_service::get_cycle(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cycle))
}

#[utoipa::path(
    get,
    path = "/api/performance/cycles/{cycle_id}/evaluations",
    params(
        ("cycle_id", Path, description = "Cycle ID")
    ),
    responses(
        (status = 200, description = "Stored evaluations of the cycle", body = [EvaluationReport]),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Performance cycle not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn cycle_evaluations(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let reports =
        performance_service::cycle_evaluations(store.get_ref(), &auth.actor(), path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(reports))
}

#[utoipa::path(
    post,
    path = "/api/performance/cycles/{cycle_id}/refresh",
    params(
        ("cycle_id", Path, description = "Cycle ID")
    ),
    responses(
        (status = 200, description = "Every evaluation of the cycle recomputed", body = [EvaluationReport]),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Performance cycle not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn refresh_cycle(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let reports = performance_service::refresh_cycle(
        store.get_ref(),
        &auth.actor(),
        path.into_inner(),
        config.work_offset(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(reports))
}

#[utoipa::path(
    post,
    path = "/api/performance/evaluations",
    request_body = NewEvaluation,
    responses(
        (status = 201, description = "Evaluation created and computed", body = EvaluationReport),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Cycle or employee not found"),
        (status = 409, description = "Employee already evaluated in this cycle")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn create_evaluation(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<NewEvaluation>,
) -> actix_web::Result<impl Responder> {
    let report = performance_service::create_evaluation(
        store.get_ref(),
        &auth.actor(),
        payload.cycle_id,
        payload.employee_id,
        config.work_offset(),
    )
    .await?;
    Ok(HttpResponse::Created().json(report))
}

#[utoipa::path(
    get,
    path = "/api/performance/evaluations/{evaluation_id}",
    params(
        ("evaluation_id", Path, description = "Evaluation ID")
    ),
    responses(
        (status = 200, description = "Stored evaluation", body = EvaluationReport),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Evaluation not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn get_evaluation(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let report =
        performance_service::get_evaluation(store.get_ref(), &auth.actor(), path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    post,
    path = "/api/performance/evaluations/{evaluation_id}/refresh",
    params(
        ("evaluation_id", Path, description = "Evaluation ID")
    ),
    responses(
        (status = 200, description = "Evaluation recomputed", body = EvaluationReport),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Evaluation not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn refresh_evaluation(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let report = performance_service::refresh_evaluation(
        store.get_ref(),
        &auth.actor(),
        path.into_inner(),
        config.work_offset(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    put,
    path = "/api/performance/evaluations/{evaluation_id}/final-score",
    params(
        ("evaluation_id", Path, description = "Evaluation ID")
    ),
    request_body = FinalScore,
    responses(
        (status = 200, description = "Final score stored", body = EvaluationReport),
        (status = 400, description = "Score outside 0..=100"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Evaluation not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn set_final_score(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    payload: web::Json<FinalScore>,
) -> actix_web::Result<impl Responder> {
    let report = performance_service::set_final_score(
        store.get_ref(),
        &auth.actor(),
        path.into_inner(),
        payload.final_score,
    )
    .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::api::test_support::{get, hr_token, post, put, state, test_app, token};
    use crate::model::role::Role;

    fn march() -> Value {
        json!({
            "cycle_name": "March 2026",
            "cycle_type": "monthly",
            "start_time": "2026-03-01T00:00:00Z",
            "end_time": "2026-04-01T00:00:00Z",
            "attendance_weight": 50,
            "leave_weight": 50
        })
    }

    #[actix_web::test]
    async fn evaluation_flow_over_http() {
        let (store, team) = state();
        let app = test_app!(store);
        let hr = hr_token();

        let req = post("/api/performance/cycles", &hr).set_json(march()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let cycle: Value = test::read_body_json(resp).await;
        let cycle_id = cycle["id"].as_i64().unwrap();

        let req = post("/api/performance/evaluations", &hr)
            .set_json(json!({ "cycle_id": cycle_id, "employee_id": team.member }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let report: Value = test::read_body_json(resp).await;
        assert_eq!(report["data_status"], "pending");
        assert!(report["rule_score"].is_null());
        let id = report["id"].as_i64().unwrap();

        let req = post("/api/performance/evaluations", &hr)
            .set_json(json!({ "cycle_id": cycle_id, "employee_id": team.member }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = put(&format!("/api/performance/evaluations/{id}/final-score"), &hr)
            .set_json(json!({ "final_score": 101 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = put(&format!("/api/performance/evaluations/{id}/final-score"), &hr)
            .set_json(json!({ "final_score": 87.456 }))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["final_score"], 87.46);

        // the evaluated employee reads their own, a peer cannot
        let member = token(Role::Employee, 11, Some(team.member));
        let uri = format!("/api/performance/evaluations/{id}");
        let resp = test::call_service(&app, get(&uri, &member).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let peer = token(Role::Employee, 12, Some(team.peer));
        let resp = test::call_service(&app, get(&uri, &peer).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let uri = format!("/api/performance/cycles/{cycle_id}/evaluations");
        let reports: Value = test::call_and_read_body_json(&app, get(&uri, &hr).to_request()).await;
        assert_eq!(reports.as_array().unwrap().len(), 1);

        let uri = format!("/api/performance/cycles/{cycle_id}/refresh");
        let resp = test::call_service(&app, post(&uri, &hr).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn bad_weights_are_rejected() {
        let (store, _) = state();
        let app = test_app!(store);
        let mut cycle = march();
        cycle["leave_weight"] = json!(60);

        let req = post("/api/performance/cycles", &hr_token())
            .set_json(cycle)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            get("/api/performance/cycles/999", &hr_token()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
