//! Exam-side proctoring engine: classifies environment signals during an
//! active attempt, escalates counted violations toward automatic
//! termination, and drives best-effort integrity reporting plus an
//! exactly-once forced submission.
//!
//! The state machine ([`session::ProctoringSession`]) is pure and returns
//! [`session::MonitorAction`] values; [`monitor::ExamMonitor`] wires those
//! to the network seams in [`reporter`].

pub mod events;
pub mod monitor;
pub mod reporter;
pub mod session;

pub use monitor::ExamMonitor;
pub use session::{MonitorAction, ProctoringSession, SessionState};
