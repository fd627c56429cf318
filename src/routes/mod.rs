pub mod attempts;
pub mod exams;
pub mod health;
pub mod integrity;
pub mod interviews;
