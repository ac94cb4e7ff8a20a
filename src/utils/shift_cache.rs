use std::time::Duration;

use moka::future::Cache;

use crate::error::AppError;
use crate::model::attendance::AttendanceShift;
use crate::store::ShiftStore;

/// Short-lived copy of the active shift. Check-in and check-out read it on
/// every request; activation invalidates it.
pub struct ShiftCache {
    inner: Cache<(), Option<AttendanceShift>>,
}

impl ShiftCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    pub async fn active<S>(&self, store: &S) -> Result<Option<AttendanceShift>, AppError>
    where
        S: ShiftStore + ?Sized,
    {
        if let Some(hit) = self.inner.get(&()).await {
            return Ok(hit);
        }
        let shift = store.active_shift().await?;
        self.inner.insert((), shift.clone()).await;
        Ok(shift)
    }

    pub async fn invalidate(&self) {
        self.inner.invalidate(&()).await;
    }
}
