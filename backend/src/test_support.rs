//! Test doubles shared by unit tests across the crate.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::domain::timer::date_from_micros;

/// Clock frozen at one instant.
pub struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock frozen at the given microsecond timestamp.
pub fn fixed_clock(micros: i64) -> Arc<dyn Clock> {
    Arc::new(FixedClock(date_from_micros(micros)))
}
