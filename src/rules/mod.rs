//! Business rules that do not touch storage.

pub mod leave_status;
pub mod org_tree;
pub mod overlap;
pub mod scoring;
pub mod shift;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
