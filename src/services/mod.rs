pub mod attempt_service;
pub mod eval_service;
pub mod exam_service;
pub mod grading_service;
pub mod integrity_service;
pub mod interview_service;
