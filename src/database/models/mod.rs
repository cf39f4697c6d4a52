pub mod account;
pub mod attendance;
pub mod class;
pub mod expense;
pub mod grade;
pub mod payment;
pub mod schedule;
pub mod student;
pub mod subject;
pub mod teacher;
