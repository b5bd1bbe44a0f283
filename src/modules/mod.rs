pub mod auth;
pub mod courses;
pub mod fees;
pub mod grades;
pub mod payments;
pub mod students;
pub mod users;
