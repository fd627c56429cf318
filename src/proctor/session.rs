use crate::models::integrity_log::IntegrityEventType;
use crate::proctor::events::{classify, RawSignal};
use crate::utils::time::remaining_seconds;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value as JsonValue};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Counted violations (window_blur / tab_hidden) before automatic
/// termination. Blur and hide share one counter and are counted
/// independently per runtime event; whether a single physical tab switch
/// firing both should count once is an open product question.
pub const VIOLATION_THRESHOLD: u32 = 5;

/// Trailing window and size for answer-burst detection.
pub const BURST_WINDOW_SECONDS: i64 = 10;
pub const BURST_SIZE: usize = 3;

const TERMINATION_REASON: &str = "Too many tab switches / focus losses during the exam";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, security notice not yet accepted.
    Inactive,
    /// Security protocol accepted, attempt not yet running.
    Armed,
    /// Attempt running; signals are processed.
    Active,
    /// Terminal: violation threshold crossed, forced submit fired.
    Terminated,
    /// Terminal: voluntary submission or timer expiry.
    SubmittedNormally,
}

/// Side effects requested by the state machine. The session never performs
/// IO itself; the driver interprets these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// Best-effort, at-most-once report to the integrity log endpoint.
    Report {
        event: IntegrityEventType,
        metadata: JsonValue,
    },
    /// Suppress the host action (context menu, clipboard, key press).
    PreventDefault,
    /// Invoke the submit operation. `reason` is set for threshold
    /// termination and absent for timer expiry.
    ForceSubmit { reason: Option<String> },
}

/// The monitor's working state for one attempt. Client-local and
/// ephemeral; discarded on navigation away or termination. Single-threaded
/// by design: each input is processed to completion before the next.
#[derive(Debug)]
pub struct ProctoringSession {
    state: SessionState,
    attempt_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    duration_minutes: i32,
    violations: u32,
    answers: HashMap<Uuid, String>,
    answer_times: VecDeque<DateTime<Utc>>,
}

impl ProctoringSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Inactive,
            attempt_id: None,
            started_at: None,
            duration_minutes: 0,
            violations: 0,
            answers: HashMap::new(),
            answer_times: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn attempt_id(&self) -> Option<Uuid> {
        self.attempt_id
    }

    /// Snapshot of locally recorded answers; travels with the submit call.
    pub fn answers(&self) -> &HashMap<Uuid, String> {
        &self.answers
    }

    /// User accepted the security notice.
    pub fn arm(&mut self) {
        if self.state == SessionState::Inactive {
            self.state = SessionState::Armed;
        }
    }

    /// Attempt is running. `started_at` is the server's authoritative
    /// timestamp, so the countdown survives page reloads.
    pub fn activate(
        &mut self,
        attempt_id: Uuid,
        started_at: DateTime<Utc>,
        duration_minutes: i32,
    ) {
        if self.state == SessionState::Armed {
            self.attempt_id = Some(attempt_id);
            self.started_at = Some(started_at);
            self.duration_minutes = duration_minutes;
            self.state = SessionState::Active;
        }
    }

    pub fn remaining_seconds(&self, at: DateTime<Utc>) -> i64 {
        match self.started_at {
            Some(started) => remaining_seconds(started, self.duration_minutes, at),
            None => 0,
        }
    }

    /// Processes one raw environment signal. Counted events advance the
    /// shared violation counter; crossing the threshold transitions to
    /// `Terminated` exactly once and emits a single forced submit. All
    /// events are ignored outside `Active` (idempotent shutdown).
    pub fn handle_signal(&mut self, signal: &RawSignal, at: DateTime<Utc>) -> Vec<MonitorAction> {
        if self.state != SessionState::Active {
            return Vec::new();
        }
        let Some(classification) = classify(signal) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if classification.prevent_default {
            actions.push(MonitorAction::PreventDefault);
        }

        let mut counted = false;
        for event in classification.events {
            let metadata = match signal {
                RawSignal::KeyPress { key, .. }
                    if event == IntegrityEventType::ForbiddenKeyPress =>
                {
                    json!({ "key": key, "timestamp": at.to_rfc3339() })
                }
                _ => json!({ "timestamp": at.to_rfc3339() }),
            };
            actions.push(MonitorAction::Report { event, metadata });
            counted |= event.is_counted();
        }

        if counted {
            self.violations += 1;
            if self.violations >= VIOLATION_THRESHOLD {
                actions.extend(self.terminate(at));
            }
        }
        actions
    }

    /// Records a locally selected answer and runs burst detection: three or
    /// more selections inside the trailing 10-second window flag one
    /// `suspicious_answer_pattern`, then the buffer is cleared so the same
    /// burst is not flagged twice.
    pub fn record_answer(
        &mut self,
        question_id: Uuid,
        selected_option: String,
        at: DateTime<Utc>,
    ) -> Vec<MonitorAction> {
        if self.state != SessionState::Active {
            return Vec::new();
        }
        self.answers.insert(question_id, selected_option);

        self.answer_times.push_back(at);
        let cutoff = at - Duration::seconds(BURST_WINDOW_SECONDS);
        while self
            .answer_times
            .front()
            .map(|t| *t <= cutoff)
            .unwrap_or(false)
        {
            self.answer_times.pop_front();
        }

        if self.answer_times.len() >= BURST_SIZE {
            let count = self.answer_times.len();
            self.answer_times.clear();
            return vec![MonitorAction::Report {
                event: IntegrityEventType::SuspiciousAnswerPattern,
                metadata: json!({
                    "detail": format!("{}+ answers in {}s", BURST_SIZE, BURST_WINDOW_SECONDS),
                    "count": count,
                    "timestamp": at.to_rfc3339(),
                }),
            }];
        }
        Vec::new()
    }

    /// Countdown check. At zero the session force-submits once, without an
    /// `automatic_termination` entry and without touching the violation
    /// counter; expiry is recorded implicitly by `submitted_at`.
    pub fn tick(&mut self, at: DateTime<Utc>) -> Vec<MonitorAction> {
        if self.state != SessionState::Active {
            return Vec::new();
        }
        if self.remaining_seconds(at) > 0 {
            return Vec::new();
        }
        self.state = SessionState::SubmittedNormally;
        vec![MonitorAction::ForceSubmit { reason: None }]
    }

    /// Voluntary submission. Returns `false` in terminal states so a manual
    /// click racing termination or expiry is a no-op.
    pub fn submit_normally(&mut self) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        self.state = SessionState::SubmittedNormally;
        true
    }

    fn terminate(&mut self, at: DateTime<Utc>) -> Vec<MonitorAction> {
        // Re-entrancy guard: state is already Terminated on any later call.
        self.state = SessionState::Terminated;
        vec![
            MonitorAction::Report {
                event: IntegrityEventType::AutomaticTermination,
                metadata: json!({
                    "reason": TERMINATION_REASON,
                    "violations": self.violations,
                    "timestamp": at.to_rfc3339(),
                }),
            },
            MonitorAction::ForceSubmit {
                reason: Some(TERMINATION_REASON.to_string()),
            },
        ]
    }
}

impl Default for ProctoringSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn active_session() -> ProctoringSession {
        let mut s = ProctoringSession::new();
        s.arm();
        s.activate(Uuid::new_v4(), at(0), 30);
        s
    }

    fn reports(actions: &[MonitorAction]) -> Vec<IntegrityEventType> {
        actions
            .iter()
            .filter_map(|a| match a {
                MonitorAction::Report { event, .. } => Some(*event),
                _ => None,
            })
            .collect()
    }

    fn force_submits(actions: &[MonitorAction]) -> Vec<Option<String>> {
        actions
            .iter()
            .filter_map(|a| match a {
                MonitorAction::ForceSubmit { reason } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn lifecycle_transitions() {
        let mut s = ProctoringSession::new();
        assert_eq!(s.state(), SessionState::Inactive);
        // Signals before arming are dropped.
        assert!(s.handle_signal(&RawSignal::WindowBlur, at(0)).is_empty());
        s.arm();
        assert_eq!(s.state(), SessionState::Armed);
        assert!(s.handle_signal(&RawSignal::WindowBlur, at(0)).is_empty());
        s.activate(Uuid::new_v4(), at(0), 30);
        assert_eq!(s.state(), SessionState::Active);
    }

    #[test]
    fn four_counted_events_stay_active() {
        let mut s = active_session();
        for i in 0..4 {
            let actions = s.handle_signal(&RawSignal::WindowBlur, at(i));
            assert!(force_submits(&actions).is_empty());
        }
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.violations(), 4);
    }

    #[test]
    fn fifth_counted_event_terminates_exactly_once() {
        let mut s = active_session();
        for i in 0..4 {
            s.handle_signal(&RawSignal::WindowBlur, at(i));
        }
        let actions = s.handle_signal(&RawSignal::VisibilityHidden, at(4));
        assert_eq!(s.state(), SessionState::Terminated);
        let events = reports(&actions);
        assert!(events.contains(&IntegrityEventType::TabHidden));
        assert!(events.contains(&IntegrityEventType::AutomaticTermination));
        let submits = force_submits(&actions);
        assert_eq!(submits.len(), 1);
        assert!(submits[0].is_some());

        // Rapid repeated blur after termination: fully suppressed.
        let after = s.handle_signal(&RawSignal::WindowBlur, at(5));
        assert!(after.is_empty());
        assert_eq!(s.violations(), 5);
    }

    #[test]
    fn blur_and_hide_share_one_counter() {
        let mut s = active_session();
        s.handle_signal(&RawSignal::WindowBlur, at(0));
        s.handle_signal(&RawSignal::VisibilityHidden, at(1));
        s.handle_signal(&RawSignal::WindowBlur, at(2));
        assert_eq!(s.violations(), 3);
    }

    #[test]
    fn monitoring_only_events_never_terminate() {
        let mut s = active_session();
        for i in 0..20 {
            let actions = s.handle_signal(&RawSignal::Copy, at(i));
            assert!(force_submits(&actions).is_empty());
            assert!(actions.contains(&MonitorAction::PreventDefault));
        }
        for i in 20..40 {
            s.handle_signal(
                &RawSignal::KeyPress {
                    ctrl: true,
                    key: "p".to_string(),
                },
                at(i),
            );
        }
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.violations(), 0);
    }

    #[test]
    fn burst_of_three_answers_flags_once_and_resets() {
        let mut s = active_session();
        let q = || Uuid::new_v4();
        assert!(s.record_answer(q(), "A".into(), at(0)).is_empty());
        assert!(s.record_answer(q(), "B".into(), at(3)).is_empty());
        let actions = s.record_answer(q(), "C".into(), at(6));
        assert_eq!(
            reports(&actions),
            vec![IntegrityEventType::SuspiciousAnswerPattern]
        );
        // Buffer cleared: a fourth rapid answer starts a fresh count.
        assert!(s.record_answer(q(), "D".into(), at(7)).is_empty());
        assert!(s.record_answer(q(), "E".into(), at(8)).is_empty());
        let again = s.record_answer(q(), "F".into(), at(9));
        assert_eq!(
            reports(&again),
            vec![IntegrityEventType::SuspiciousAnswerPattern]
        );
    }

    #[test]
    fn slow_answers_do_not_flag() {
        let mut s = active_session();
        for i in 0..6 {
            let actions = s.record_answer(Uuid::new_v4(), "A".into(), at(i * 11));
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn answers_are_retained_for_submission() {
        let mut s = active_session();
        let q1 = Uuid::new_v4();
        s.record_answer(q1, "A".into(), at(0));
        s.record_answer(q1, "B".into(), at(60));
        assert_eq!(s.answers().get(&q1), Some(&"B".to_string()));
    }

    #[test]
    fn timer_expiry_forces_submit_without_termination_log() {
        let mut s = active_session();
        assert!(s.tick(at(1799)).is_empty());
        let actions = s.tick(at(1800));
        assert_eq!(reports(&actions), Vec::<IntegrityEventType>::new());
        assert_eq!(force_submits(&actions), vec![None]);
        assert_eq!(s.state(), SessionState::SubmittedNormally);
        // Second tick is a no-op.
        assert!(s.tick(at(1801)).is_empty());
    }

    #[test]
    fn manual_submit_is_noop_after_terminal_state() {
        let mut s = active_session();
        assert!(s.submit_normally());
        assert!(!s.submit_normally());

        let mut t = active_session();
        for i in 0..5 {
            t.handle_signal(&RawSignal::WindowBlur, at(i));
        }
        assert_eq!(t.state(), SessionState::Terminated);
        assert!(!t.submit_normally());
    }

    #[test]
    fn remaining_time_derives_from_authoritative_start() {
        // Session "mounted" late (page reload): countdown still anchored
        // at the server's created_at.
        let mut s = ProctoringSession::new();
        s.arm();
        s.activate(Uuid::new_v4(), at(0), 30);
        assert_eq!(s.remaining_seconds(at(600)), 1200);
    }

    #[test]
    fn violation_at_last_second_scenario() {
        // Exam of 30 minutes started at T0; at T0+29:59 a blur is the 5th
        // counted violation.
        let mut s = active_session();
        let q = Uuid::new_v4();
        s.record_answer(q, "A".into(), at(100));
        for i in 0..4 {
            s.handle_signal(&RawSignal::WindowBlur, at(60 * i));
        }
        let actions = s.handle_signal(&RawSignal::WindowBlur, at(1799));
        let submits = force_submits(&actions);
        assert_eq!(submits.len(), 1);
        assert!(submits[0].as_deref().unwrap_or("").contains("tab switches"));
        // Answers as of that instant travel with the forced submit.
        assert_eq!(s.answers().len(), 1);
        // Subsequent manual click is a no-op.
        assert!(!s.submit_normally());
    }
}
