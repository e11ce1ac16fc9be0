pub mod local_date;
pub mod local_time;
pub mod provider;

pub use local_date::LocalDate;
pub use local_time::LocalTime;
pub use provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
