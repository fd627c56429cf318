use crate::proctor::events::RawSignal;
use crate::proctor::reporter::{IntegrityReporter, SubmitHandle};
use crate::proctor::session::{MonitorAction, ProctoringSession, SessionState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Drives a [`ProctoringSession`], translating its actions into calls on
/// the reporting and submission seams. Owns the session for the lifetime
/// of one monitored attempt; drop it on navigation away.
pub struct ExamMonitor {
    session: ProctoringSession,
    reporter: Arc<dyn IntegrityReporter>,
    submitter: Arc<dyn SubmitHandle>,
}

impl ExamMonitor {
    pub fn new(reporter: Arc<dyn IntegrityReporter>, submitter: Arc<dyn SubmitHandle>) -> Self {
        Self {
            session: ProctoringSession::new(),
            reporter,
            submitter,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn accept_security_notice(&mut self) {
        self.session.arm();
    }

    pub fn begin_attempt(
        &mut self,
        attempt_id: Uuid,
        started_at: DateTime<Utc>,
        duration_minutes: i32,
    ) {
        self.session.activate(attempt_id, started_at, duration_minutes);
    }

    pub fn remaining_seconds(&self, at: DateTime<Utc>) -> i64 {
        self.session.remaining_seconds(at)
    }

    /// Number of questions answered so far; hosts use this to confirm
    /// before a submission that would leave questions blank.
    pub fn answered_count(&self) -> usize {
        self.session.answers().len()
    }

    /// Feeds one environment signal through the state machine. Returns
    /// whether the host should suppress the underlying action.
    pub fn observe(&mut self, signal: &RawSignal, at: DateTime<Utc>) -> bool {
        let actions = self.session.handle_signal(signal, at);
        self.apply(actions)
    }

    pub fn record_answer(&mut self, question_id: Uuid, selected: String, at: DateTime<Utc>) {
        let actions = self.session.record_answer(question_id, selected, at);
        self.apply(actions);
    }

    /// Countdown tick; fires the forced submit on expiry.
    pub fn tick(&mut self, at: DateTime<Utc>) {
        let actions = self.session.tick(at);
        self.apply(actions);
    }

    /// Voluntary submission. Returns `false` when the session is already
    /// in a terminal state (termination or expiry got there first).
    pub fn submit(&mut self) -> bool {
        if !self.session.submit_normally() {
            return false;
        }
        if let Some(attempt_id) = self.session.attempt_id() {
            self.submitter
                .force_submit(attempt_id, self.session.answers().clone(), None);
        }
        true
    }

    fn apply(&mut self, actions: Vec<MonitorAction>) -> bool {
        let mut prevented = false;
        for action in actions {
            match action {
                MonitorAction::PreventDefault => prevented = true,
                MonitorAction::Report { event, metadata } => {
                    if let Some(attempt_id) = self.session.attempt_id() {
                        self.reporter.report(attempt_id, event, metadata);
                    }
                }
                MonitorAction::ForceSubmit { reason } => {
                    if let Some(attempt_id) = self.session.attempt_id() {
                        self.submitter.force_submit(
                            attempt_id,
                            self.session.answers().clone(),
                            reason,
                        );
                    }
                }
            }
        }
        prevented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::integrity_log::IntegrityEventType;
    use crate::proctor::reporter::{MockIntegrityReporter, MockSubmitHandle};
    use chrono::TimeZone;
    use mockall::predicate::{always, eq};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn monitor_with(
        reporter: MockIntegrityReporter,
        submitter: MockSubmitHandle,
        attempt_id: Uuid,
    ) -> ExamMonitor {
        let mut m = ExamMonitor::new(Arc::new(reporter), Arc::new(submitter));
        m.accept_security_notice();
        m.begin_attempt(attempt_id, at(0), 30);
        m
    }

    #[test]
    fn blur_storm_fires_exactly_one_forced_submit() {
        let attempt_id = Uuid::new_v4();

        let mut reporter = MockIntegrityReporter::new();
        reporter
            .expect_report()
            .with(eq(attempt_id), eq(IntegrityEventType::WindowBlur), always())
            .times(5)
            .returning(|_, _, _| ());
        reporter
            .expect_report()
            .with(
                eq(attempt_id),
                eq(IntegrityEventType::AutomaticTermination),
                always(),
            )
            .times(1)
            .returning(|_, _, _| ());

        let mut submitter = MockSubmitHandle::new();
        submitter
            .expect_force_submit()
            .withf(move |id, _, reason| {
                *id == attempt_id && reason.as_deref().unwrap_or("").contains("tab switches")
            })
            .times(1)
            .returning(|_, _, _| ());

        let mut m = monitor_with(reporter, submitter, attempt_id);
        // 8 rapid blurs: 5 are processed, the rest are suppressed by the
        // termination flag.
        for i in 0..8 {
            m.observe(&RawSignal::WindowBlur, at(i));
        }
        assert_eq!(m.state(), SessionState::Terminated);
        // Manual click after termination does not submit again.
        assert!(!m.submit());
    }

    #[test]
    fn prevented_signals_report_and_suppress() {
        let attempt_id = Uuid::new_v4();

        let mut reporter = MockIntegrityReporter::new();
        reporter
            .expect_report()
            .with(
                eq(attempt_id),
                eq(IntegrityEventType::RightClickAttempt),
                always(),
            )
            .times(1)
            .returning(|_, _, _| ());

        let submitter = MockSubmitHandle::new();

        let mut m = monitor_with(reporter, submitter, attempt_id);
        assert!(m.observe(&RawSignal::ContextMenu, at(1)));
    }

    #[test]
    fn counted_signals_are_not_suppressed() {
        let attempt_id = Uuid::new_v4();

        let mut reporter = MockIntegrityReporter::new();
        reporter
            .expect_report()
            .with(eq(attempt_id), eq(IntegrityEventType::WindowBlur), always())
            .times(1)
            .returning(|_, _, _| ());

        let submitter = MockSubmitHandle::new();

        let mut m = monitor_with(reporter, submitter, attempt_id);
        assert!(!m.observe(&RawSignal::WindowBlur, at(1)));
    }

    #[test]
    fn timer_expiry_submits_without_termination_report() {
        let attempt_id = Uuid::new_v4();

        let reporter = MockIntegrityReporter::new();
        let mut submitter = MockSubmitHandle::new();
        submitter
            .expect_force_submit()
            .withf(move |id, _, reason| *id == attempt_id && reason.is_none())
            .times(1)
            .returning(|_, _, _| ());

        let mut m = monitor_with(reporter, submitter, attempt_id);
        m.tick(at(1799));
        m.tick(at(1800));
        m.tick(at(1801));
        assert_eq!(m.state(), SessionState::SubmittedNormally);
    }

    #[test]
    fn manual_submit_carries_recorded_answers() {
        let attempt_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();

        let reporter = MockIntegrityReporter::new();
        let mut submitter = MockSubmitHandle::new();
        submitter
            .expect_force_submit()
            .withf(move |id, answers, reason| {
                *id == attempt_id
                    && answers.get(&question_id).map(String::as_str) == Some("B")
                    && reason.is_none()
            })
            .times(1)
            .returning(|_, _, _| ());

        let mut m = monitor_with(reporter, submitter, attempt_id);
        m.record_answer(question_id, "A".to_string(), at(10));
        m.record_answer(question_id, "B".to_string(), at(120));
        assert!(m.submit());
        assert!(!m.submit());
    }

    #[test]
    fn answer_burst_reports_suspicious_pattern() {
        let attempt_id = Uuid::new_v4();

        let mut reporter = MockIntegrityReporter::new();
        reporter
            .expect_report()
            .with(
                eq(attempt_id),
                eq(IntegrityEventType::SuspiciousAnswerPattern),
                always(),
            )
            .times(1)
            .returning(|_, _, _| ());

        let submitter = MockSubmitHandle::new();

        let mut m = monitor_with(reporter, submitter, attempt_id);
        for i in 0..3 {
            m.record_answer(Uuid::new_v4(), "A".to_string(), at(i * 2));
        }
    }
}
