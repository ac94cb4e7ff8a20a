pub mod attendance;
pub mod employee;
pub mod leave;
pub mod organization;
pub mod performance;
pub mod role;
