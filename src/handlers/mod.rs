pub mod attendance;
pub mod auth;
pub mod classes;
pub mod expenses;
pub mod grades;
pub mod parents;
pub mod payments;
pub mod schedule;
pub mod stats;
pub mod students;
pub mod subjects;
pub mod teachers;
