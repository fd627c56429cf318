pub mod attempt;
pub mod exam;
pub mod integrity_log;
pub mod interview_attempt;
pub mod mock_interview;
pub mod question;
