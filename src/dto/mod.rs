pub mod attempt_dto;
pub mod exam_dto;
pub mod interview_dto;
