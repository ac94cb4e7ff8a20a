pub mod attendance;
pub mod employee;
pub mod leave;
pub mod organization;
pub mod performance;

/// `(page, per_page, offset)` from 1-based query values.
pub(crate) fn paging(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(per_page);
    (page, per_page, offset)
}
