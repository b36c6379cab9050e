use chrono::NaiveDateTime;

/// Wall-clock access.
pub trait ClockOps {
    /// Current local date and time.
    fn now_local(&self) -> NaiveDateTime;
}
