pub mod backup;
pub mod calendar;
pub mod core;
pub mod events;
pub mod semesters;
pub mod setup;
