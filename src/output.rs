//! Terminal rendering of application events.

use crate::events::AppEvent;
use crate::vision::detector::ModelStatus;

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Format an event as one colored line. Detection ticks without labels
/// produce nothing.
pub fn format_event(event: &AppEvent) -> Option<String> {
    let line = match event {
        AppEvent::ModelStatusChanged { status } => {
            let color = match status {
                ModelStatus::Ready => GREEN,
                ModelStatus::Error => RED,
                ModelStatus::Start | ModelStatus::Loading => DIM,
            };
            format!("{color}model {status}{RESET}")
        }
        AppEvent::CameraChanged { on } => format!("{DIM}camera {}{RESET}", on_off(*on)),
        AppEvent::FacingChanged { facing } => {
            format!("{DIM}facing {}{RESET}", facing.as_str())
        }
        AppEvent::NarrationChanged { active } => {
            format!("{DIM}narration {}{RESET}", on_off(*active))
        }
        AppEvent::IntervalChanged { interval_ms } => {
            format!("{DIM}detection interval {interval_ms}ms{RESET}")
        }
        AppEvent::Detections { sequence, labels } => {
            if labels.is_empty() {
                return None;
            }
            format!("{DIM}#{sequence}{RESET} {}", labels.join(", "))
        }
        AppEvent::Narrated { text } => format!("{CYAN}\u{1f50a} {text}{RESET}"),
        AppEvent::Alert { message, .. } => format!("{YELLOW}{message}{RESET}"),
        AppEvent::DetectorFailed { message } => {
            format!("{RED}detector error: {message}{RESET}")
        }
        AppEvent::SpeechFailed { message } => format!("{RED}speech error: {message}{RESET}"),
    };
    Some(line)
}

/// Print an event to stderr.
pub fn render_event(event: &AppEvent) {
    if let Some(line) = format_event(event) {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FacingMode;
    use crate::events::Alert;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn plain(event: AppEvent) -> Option<String> {
        format_event(&event).map(|s| strip_ansi(&s))
    }

    #[test]
    fn test_model_status_colors() {
        let ready = format_event(&AppEvent::ModelStatusChanged {
            status: ModelStatus::Ready,
        })
        .unwrap();
        assert!(ready.starts_with(GREEN));
        assert_eq!(strip_ansi(&ready), "model READY");

        let error = format_event(&AppEvent::ModelStatusChanged {
            status: ModelStatus::Error,
        })
        .unwrap();
        assert!(error.starts_with(RED));
    }

    #[test]
    fn test_state_changes() {
        assert_eq!(
            plain(AppEvent::CameraChanged { on: true }).as_deref(),
            Some("camera on")
        );
        assert_eq!(
            plain(AppEvent::NarrationChanged { active: false }).as_deref(),
            Some("narration off")
        );
        assert_eq!(
            plain(AppEvent::FacingChanged {
                facing: FacingMode::Environment
            })
            .as_deref(),
            Some("facing environment")
        );
        assert_eq!(
            plain(AppEvent::IntervalChanged { interval_ms: 500 }).as_deref(),
            Some("detection interval 500ms")
        );
    }

    #[test]
    fn test_detections_line() {
        assert_eq!(
            plain(AppEvent::Detections {
                sequence: 7,
                labels: vec!["person".to_string(), "cup".to_string()],
            })
            .as_deref(),
            Some("#7 person, cup")
        );
    }

    #[test]
    fn test_empty_detections_are_silent() {
        assert_eq!(
            plain(AppEvent::Detections {
                sequence: 1,
                labels: vec![],
            }),
            None
        );
    }

    #[test]
    fn test_alert_shows_message() {
        let line = format_event(&AppEvent::Alert {
            alert: Alert::CameraInactive,
            message: "Turn on the camera first.".to_string(),
        })
        .unwrap();
        assert!(line.starts_with(YELLOW));
        assert_eq!(strip_ansi(&line), "Turn on the camera first.");
    }

    #[test]
    fn test_failures_are_red() {
        let line = format_event(&AppEvent::SpeechFailed {
            message: "no voice".to_string(),
        })
        .unwrap();
        assert!(line.starts_with(RED));
        assert_eq!(strip_ansi(&line), "speech error: no voice");
    }
}
