use tracing::info;

use super::{Actor, non_blank};
use crate::error::AppError;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::organization::{NewOrganization, Organization};
use crate::rules::org_tree::would_create_cycle;
use crate::store::{DirectoryStore, EmployeeQuery};

pub async fn create_org<S>(store: &S, actor: &Actor, req: NewOrganization) -> Result<Organization, AppError>
where
    S: DirectoryStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let org = NewOrganization {
        org_code: non_blank(&req.org_code, "org_code")?,
        org_name: non_blank(&req.org_name, "org_name")?,
        ..req
    };
    let created = store.insert_org(&org).await?;
    info!(org_id = created.id, org_code = %created.org_code, "Organization created");
    Ok(created)
}

pub async fn list_orgs<S>(store: &S) -> Result<Vec<Organization>, AppError>
where
    S: DirectoryStore + ?Sized,
{
    store.list_orgs().await
}

/// Moves an organization under `parent`, or to the top level with `None`.
pub async fn reparent<S>(store: &S, actor: &Actor, id: i64, parent: Option<i64>) -> Result<(), AppError>
where
    S: DirectoryStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let parents = store.org_parents().await?;
    if !parents.contains_key(&id) {
        return Err(AppError::NotFound("Organization"));
    }
    if let Some(parent) = parent {
        if !parents.contains_key(&parent) {
            return Err(AppError::NotFound("Parent organization"));
        }
        if would_create_cycle(id, parent, &parents) {
            return Err(AppError::OrgCycle);
        }
    }
    // the database trigger re-checks against concurrent moves
    if !store.set_org_parent(id, parent).await? {
        return Err(AppError::NotFound("Organization"));
    }
    info!(org_id = id, parent_org_id = ?parent, "Organization moved");
    Ok(())
}

pub async fn create_employee<S>(store: &S, actor: &Actor, req: NewEmployee) -> Result<Employee, AppError>
where
    S: DirectoryStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let email = non_blank(&req.email, "email")?.to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    let employee = NewEmployee {
        emp_code: non_blank(&req.emp_code, "emp_code")?,
        emp_name: non_blank(&req.emp_name, "emp_name")?,
        email,
        ..req
    };
    let created = store.insert_employee(&employee).await?;
    info!(employee_id = created.id, org_id = created.org_id, "Employee created");
    Ok(created)
}

/// Visible to the employee, their direct manager and HR/Admin.
pub async fn get_employee<S>(store: &S, actor: &Actor, id: i64) -> Result<Employee, AppError>
where
    S: DirectoryStore + ?Sized,
{
    let employee = store
        .get_employee(id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;
    let is_manager = actor.employee_id.is_some() && employee.manager_emp_id == actor.employee_id;
    if actor.is_hr_or_admin() || actor.is_employee(id) || is_manager {
        return Ok(employee);
    }
    Err(AppError::Forbidden("You cannot view this employee"))
}

/// HR/Admin list everyone; other users only see their direct reports.
pub async fn list_employees<S>(
    store: &S,
    actor: &Actor,
    mut query: EmployeeQuery,
) -> Result<(Vec<Employee>, i64), AppError>
where
    S: DirectoryStore + ?Sized,
{
    if !actor.is_hr_or_admin() {
        query.manager_emp_id = Some(actor.employee_id()?);
    }
    query.search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    store.list_employees(&query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::organization::OrgType;
    use crate::service::fixtures::{employee, hr};
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn org(code: &str, parent: Option<i64>) -> NewOrganization {
        NewOrganization {
            org_code: code.to_string(),
            org_name: format!("{code} group"),
            org_type: OrgType::Team,
            parent_org_id: parent,
        }
    }

    fn hire(code: &str, org_id: i64, manager: Option<i64>) -> NewEmployee {
        NewEmployee {
            emp_code: code.to_string(),
            emp_name: format!("{code} name"),
            email: format!(" {code}@Company.com "),
            org_id,
            manager_emp_id: manager,
            hire_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        }
    }

    #[actix_web::test]
    async fn reparent_detects_cycles() {
        let store = MemoryStore::new();
        let root = create_org(&store, &hr(), org("ROOT", None)).await.unwrap();
        let mid = create_org(&store, &hr(), org("MID", Some(root.id))).await.unwrap();
        let leaf = create_org(&store, &hr(), org("LEAF", Some(mid.id))).await.unwrap();

        assert!(matches!(
            reparent(&store, &hr(), root.id, Some(leaf.id)).await,
            Err(AppError::OrgCycle)
        ));
        assert!(matches!(
            reparent(&store, &hr(), mid.id, Some(mid.id)).await,
            Err(AppError::OrgCycle)
        ));
        assert!(matches!(
            reparent(&store, &hr(), 999, None).await,
            Err(AppError::NotFound(_))
        ));

        reparent(&store, &hr(), leaf.id, Some(root.id)).await.unwrap();
        reparent(&store, &hr(), mid.id, None).await.unwrap();
        let orgs = list_orgs(&store).await.unwrap();
        let leaf_now = orgs.iter().find(|o| o.id == leaf.id).unwrap();
        assert_eq!(leaf_now.parent_org_id, Some(root.id));
    }

    #[actix_web::test]
    async fn org_code_is_unique_and_required() {
        let store = MemoryStore::new();
        create_org(&store, &hr(), org("OPS", None)).await.unwrap();
        assert!(matches!(
            create_org(&store, &hr(), org("OPS", None)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            create_org(&store, &hr(), org("  ", None)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_org(&store, &employee(1, 1), org("DEV", None)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[actix_web::test]
    async fn employees_are_normalized_and_scoped() {
        let (store, team) = MemoryStore::with_team();
        let created = create_employee(&store, &hr(), hire("EMP3", team.org_id, Some(team.peer)))
            .await
            .unwrap();
        assert_eq!(created.email, "emp3@company.com");

        let mut bad_email = hire("EMP4", team.org_id, None);
        bad_email.email = "not-an-email".to_string();
        assert!(create_employee(&store, &hr(), bad_email).await.is_err());
        assert!(matches!(
            create_employee(&store, &hr(), hire("EMP5", 999, None)).await,
            Err(AppError::NotFound(_))
        ));

        let manager = employee(10, team.manager);
        let (reports, total) = list_employees(
            &store,
            &manager,
            EmployeeQuery {
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(total, 2);
        assert!(reports.iter().all(|e| e.manager_emp_id == Some(team.manager)));

        let (found, _) = list_employees(
            &store,
            &hr(),
            EmployeeQuery {
                search: Some(" emp3 ".to_string()),
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);

        assert!(get_employee(&store, &manager, team.member).await.is_ok());
        assert!(get_employee(&store, &employee(11, team.member), team.member).await.is_ok());
        assert!(matches!(
            get_employee(&store, &employee(11, team.member), team.peer).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
