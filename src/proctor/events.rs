use crate::models::integrity_log::IntegrityEventType;

/// Raw runtime signals as observed by the host environment's event hooks.
/// Classification into [`IntegrityEventType`] is a pure mapping so it can
/// be tested with synthetic events, independent of any runtime event API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSignal {
    /// The exam window lost focus.
    WindowBlur,
    /// The document became hidden (tab switch, minimize).
    VisibilityHidden,
    /// Context-menu (right-click) attempt.
    ContextMenu,
    Copy,
    Paste,
    KeyPress { ctrl: bool, key: String },
}

/// Outcome of classifying one raw signal. `events` may carry two entries
/// (Ctrl+P logs both the key press and a print attempt); `prevent_default`
/// tells the host to suppress the underlying action unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub events: Vec<IntegrityEventType>,
    pub prevent_default: bool,
}

/// Classifies a raw signal. Returns `None` for signals that are not
/// integrity-relevant (e.g. an ordinary key press).
pub fn classify(signal: &RawSignal) -> Option<Classification> {
    match signal {
        RawSignal::WindowBlur => Some(Classification {
            events: vec![IntegrityEventType::WindowBlur],
            prevent_default: false,
        }),
        RawSignal::VisibilityHidden => Some(Classification {
            events: vec![IntegrityEventType::TabHidden],
            prevent_default: false,
        }),
        RawSignal::ContextMenu => Some(Classification {
            events: vec![IntegrityEventType::RightClickAttempt],
            prevent_default: true,
        }),
        RawSignal::Copy => Some(Classification {
            events: vec![IntegrityEventType::CopyAttempt],
            prevent_default: true,
        }),
        RawSignal::Paste => Some(Classification {
            events: vec![IntegrityEventType::PasteAttempt],
            prevent_default: true,
        }),
        RawSignal::KeyPress { ctrl, key } => {
            // Shift changes the reported key ("P" vs "p"); the shortcut is
            // the same either way.
            let key = key.to_ascii_lowercase();
            let forbidden = (*ctrl && matches!(key.as_str(), "c" | "v" | "p" | "r")) || key == "f5";
            if !forbidden {
                return None;
            }
            let mut events = vec![IntegrityEventType::ForbiddenKeyPress];
            if *ctrl && key == "p" {
                events.push(IntegrityEventType::PrintAttempt);
            }
            Some(Classification {
                events,
                prevent_default: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ctrl: bool, key: &str) -> RawSignal {
        RawSignal::KeyPress {
            ctrl,
            key: key.to_string(),
        }
    }

    #[test]
    fn blur_and_hide_are_not_prevented() {
        let c = classify(&RawSignal::WindowBlur).unwrap();
        assert_eq!(c.events, vec![IntegrityEventType::WindowBlur]);
        assert!(!c.prevent_default);

        let c = classify(&RawSignal::VisibilityHidden).unwrap();
        assert_eq!(c.events, vec![IntegrityEventType::TabHidden]);
        assert!(!c.prevent_default);
    }

    #[test]
    fn clipboard_and_context_menu_are_always_prevented() {
        for (signal, expected) in [
            (RawSignal::ContextMenu, IntegrityEventType::RightClickAttempt),
            (RawSignal::Copy, IntegrityEventType::CopyAttempt),
            (RawSignal::Paste, IntegrityEventType::PasteAttempt),
        ] {
            let c = classify(&signal).unwrap();
            assert_eq!(c.events, vec![expected]);
            assert!(c.prevent_default);
        }
    }

    #[test]
    fn forbidden_key_combinations() {
        for k in ["c", "v", "p", "r"] {
            let c = classify(&key(true, k)).unwrap();
            assert!(c.events.contains(&IntegrityEventType::ForbiddenKeyPress));
            assert!(c.prevent_default);
        }
        let c = classify(&key(false, "F5")).unwrap();
        assert_eq!(c.events, vec![IntegrityEventType::ForbiddenKeyPress]);
    }

    #[test]
    fn shift_modified_combinations_are_still_forbidden() {
        // Shift+Ctrl+P reports key "P"; the shortcut must not slip past.
        for k in ["C", "V", "P", "R"] {
            let c = classify(&key(true, k)).unwrap();
            assert!(c.events.contains(&IntegrityEventType::ForbiddenKeyPress));
            assert!(c.prevent_default);
        }
        let c = classify(&key(true, "P")).unwrap();
        assert!(c.events.contains(&IntegrityEventType::PrintAttempt));
        assert!(classify(&key(false, "f5")).is_some());
    }

    #[test]
    fn ctrl_p_also_logs_print_attempt() {
        let c = classify(&key(true, "p")).unwrap();
        assert_eq!(
            c.events,
            vec![
                IntegrityEventType::ForbiddenKeyPress,
                IntegrityEventType::PrintAttempt
            ]
        );
    }

    #[test]
    fn ordinary_keys_are_ignored() {
        assert!(classify(&key(false, "c")).is_none());
        assert!(classify(&key(true, "a")).is_none());
        assert!(classify(&key(false, "Enter")).is_none());
    }
}
