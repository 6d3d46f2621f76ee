//! IPC message dispatch: parse s-expressions and route to handlers.

use lexpr::Value;
use tracing::{debug, warn};

use crate::hand::{GestureConfig, Handedness, LandmarkFrame, NavEvent, Point3};
use crate::state::NavState;

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns an optional response string (s-expression).
pub fn handle_message(state: &mut NavState, raw: &str) -> Option<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("frame") => handle_frame(state, msg_id, &value),
        Some("gesture-start") => handle_gesture_start(state, msg_id),
        Some("gesture-stop") => handle_gesture_stop(state, msg_id),
        Some("gesture-status") => handle_gesture_status(state, msg_id),
        Some("gesture-config") => handle_gesture_config(state, msg_id, &value),
        Some("pager-status") => handle_pager_status(state, msg_id),
        Some("pager-set-total") => handle_pager_set_total(state, msg_id, &value),
        Some("pager-next") => handle_pager_turn(state, msg_id, NavEvent::NextPage),
        Some("pager-previous") => handle_pager_turn(state, msg_id, NavEvent::PreviousPage),
        Some(other) => Some(error_response(
            msg_id,
            &format!("unknown message type: {other}"),
        )),
        None => Some(error_response(msg_id, "missing :type field")),
    }
}

// ── Handlers ────────────────────────────────────────────────

fn handle_frame(state: &mut NavState, msg_id: i64, value: &Value) -> Option<String> {
    let now_ms = match get_float(value, "t") {
        Some(t) if t.is_finite() => t,
        _ => return Some(error_response(msg_id, "missing :t (milliseconds)")),
    };

    let frame = match parse_frame(value) {
        Ok(f) => f,
        Err(reason) => return Some(error_response(msg_id, &reason)),
    };

    let outcome = state.process_frame(frame.as_ref(), now_ms);
    debug!(
        msg_id,
        gesture = outcome.classification.name.as_str(),
        "frame processed"
    );
    Some(format!(
        "(:type :response :id {} :status :ok :gesture {})",
        msg_id,
        outcome.classification.to_sexp()
    ))
}

fn handle_gesture_start(state: &mut NavState, msg_id: i64) -> Option<String> {
    state.gesture.start();
    Some(ok_response(msg_id))
}

fn handle_gesture_stop(state: &mut NavState, msg_id: i64) -> Option<String> {
    state.gesture.stop();
    Some(ok_response(msg_id))
}

fn handle_gesture_status(state: &mut NavState, msg_id: i64) -> Option<String> {
    let status = state.gesture.status_sexp();
    Some(format!(
        "(:type :response :id {} :status :ok :session {})",
        msg_id, status
    ))
}

fn handle_gesture_config(state: &mut NavState, msg_id: i64, value: &Value) -> Option<String> {
    if let Err(reason) = apply_config(&mut state.gesture.config, value) {
        return Some(error_response(msg_id, &reason));
    }
    let config = state.gesture.config_sexp();
    Some(format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id, config
    ))
}

fn handle_pager_status(state: &mut NavState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :pager {})",
        msg_id,
        state.pager.status_sexp()
    ))
}

fn handle_pager_set_total(state: &mut NavState, msg_id: i64, value: &Value) -> Option<String> {
    let total = match get_int(value, "total") {
        Some(t) if (0..=i64::from(u32::MAX)).contains(&t) => t as u32,
        _ => return Some(error_response(msg_id, "missing or invalid :total")),
    };
    state.pager.set_total(total);
    handle_pager_status(state, msg_id)
}

fn handle_pager_turn(state: &mut NavState, msg_id: i64, event: NavEvent) -> Option<String> {
    if !state.turn_page(event) {
        debug!(msg_id, event = event.as_str(), "page turn at document bound");
    }
    handle_pager_status(state, msg_id)
}

// ── Frame parsing ───────────────────────────────────────────

/// Build a landmark frame from a `:frame` message.
///
/// A missing, nil, or empty `:landmarks` means no hand was detected.
/// Point count is not checked here; the classifier rejects short frames
/// itself.
fn parse_frame(value: &Value) -> Result<Option<LandmarkFrame>, String> {
    let landmarks = match get_value(value, "landmarks") {
        None | Some(Value::Null) | Some(Value::Nil) => return Ok(None),
        Some(Value::Symbol(s)) if s.as_ref() == "nil" => return Ok(None),
        Some(v) => v,
    };

    let items = list_items(landmarks).ok_or_else(|| ":landmarks must be a list".to_string())?;
    let mut points = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        points.push(parse_point(item).ok_or_else(|| format!("bad landmark {i}"))?);
    }

    let handedness = get_string(value, "handedness").and_then(|h| Handedness::from_label(&h));
    let confidence = get_float(value, "score").map(|s| s as f32);
    Ok(Some(LandmarkFrame {
        points,
        handedness,
        confidence,
    }))
}

/// Parse `(x y)` or `(x y z)`.
fn parse_point(value: &Value) -> Option<Point3> {
    let coords: Vec<f32> = list_items(value)?
        .iter()
        .map(|v| match v {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            _ => None,
        })
        .collect::<Option<_>>()?;
    match coords.as_slice() {
        [x, y] => Some(Point3::new(*x, *y, 0.0)),
        [x, y, z] => Some(Point3::new(*x, *y, *z)),
        _ => None,
    }
}

// ── Config ──────────────────────────────────────────────────

/// Apply config overrides from a plist.  Validates every present key
/// before changing anything.
pub fn apply_config(config: &mut GestureConfig, value: &Value) -> Result<(), String> {
    let mut next = config.clone();

    let threshold = |key: &str| -> Result<Option<f32>, String> {
        match get_keyword(value, key) {
            None => Ok(None),
            Some(s) => match s.parse::<f32>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
                _ => Err(format!("invalid :{key} {s}")),
            },
        }
    };
    let millis = |key: &str| -> Result<Option<f64>, String> {
        match get_keyword(value, key) {
            None => Ok(None),
            Some(s) => match s.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
                _ => Err(format!("invalid :{key} {s}")),
            },
        }
    };

    if let Some(v) = threshold("thumb-axis-threshold")? {
        next.fingers.thumb_axis_threshold = v;
    }
    if let Some(v) = threshold("thumb-palm-proximity")? {
        next.fingers.thumb_palm_proximity = v;
    }
    if let Some(v) = threshold("finger-extend-threshold")? {
        next.fingers.finger_extend_threshold = v;
    }
    if let Some(v) = threshold("swipe-displacement-threshold")? {
        next.swipe.displacement_threshold = v;
    }
    if let Some(v) = millis("swipe-window-ms")? {
        next.swipe.window_ms = v;
    }
    if let Some(v) = millis("swipe-cooldown-ms")? {
        next.swipe.cooldown_ms = v;
    }
    if let Some(v) = millis("fist-release-delay-ms")? {
        next.fist_release_delay_ms = v;
    }
    if let Some(v) = millis("open-release-delay-ms")? {
        next.open_release_delay_ms = v;
    }
    if let Some(s) = get_keyword(value, "open-hand-min-fingers") {
        next.open_hand_min_fingers = match s.parse::<u8>() {
            Ok(n) if (1..=5).contains(&n) => n,
            _ => return Err(format!("invalid :open-hand-min-fingers {s} (1-5)")),
        };
    }

    *config = next;
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Find the value following `:key` in an s-expression plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a plist value as a string.  Keywords lose their colon.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "t" } else { "nil" }).to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

/// Extract an integer value from an s-expression plist.
fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a string value from an s-expression plist.
fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Extract a floating-point value from an s-expression plist.
fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Elements of a proper list, or None for anything else.
fn list_items(value: &Value) -> Option<Vec<&Value>> {
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Null => return Some(items),
            _ => return None,
        }
    }
}

/// Format an IPC event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::LANDMARK_COUNT;

    fn nav_state() -> NavState {
        let mut state = NavState::new(GestureConfig::default(), 5);
        state.gesture.start();
        state
    }

    /// Render a frame message with every landmark at one point except
    /// the listed overrides.
    fn frame_message(id: i64, t: f64, overrides: &[(usize, f32, f32)]) -> String {
        let mut points = vec![(0.5f32, 0.6f32); LANDMARK_COUNT];
        for &(i, x, y) in overrides {
            points[i] = (x, y);
        }
        let body: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("({} {} 0)", x, y))
            .collect();
        format!(
            "(:type :frame :id {} :t {} :handedness :right :score 0.8 :landmarks ({}))",
            id,
            t,
            body.join(" ")
        )
    }

    /// Open hand (four fingers up, thumb tucked) with the palm at `x`.
    fn open_hand(id: i64, t: f64, x: f32) -> String {
        frame_message(
            id,
            t,
            &[
                (9, x, 0.6),
                (3, x, 0.6),
                (4, x, 0.6),
                (6, x, 0.5),
                (8, x, 0.4),
                (10, x, 0.5),
                (12, x, 0.4),
                (14, x, 0.5),
                (16, x, 0.4),
                (18, x, 0.5),
                (20, x, 0.4),
            ],
        )
    }

    // ── ok_response / error_response ────────────────────────

    #[test]
    fn test_ok_response_format() {
        let r = ok_response(42);
        assert!(r.contains(":type :response"));
        assert!(r.contains(":id 42"));
        assert!(r.contains(":status :ok"));
    }

    #[test]
    fn test_error_response_escapes_quotes() {
        let r = error_response(1, "say \"hello\"");
        assert!(r.contains(":status :error"));
        assert!(r.contains("say \\\"hello\\\""));
    }

    // ── plist helpers ───────────────────────────────────────

    #[test]
    fn test_get_keyword_from_plist() {
        let v = lexpr::from_str("(:type :frame :handedness \"Right\" :t 16.5)").unwrap();
        assert_eq!(get_keyword(&v, "type"), Some("frame".to_string()));
        assert_eq!(get_string(&v, "handedness"), Some("Right".to_string()));
        assert_eq!(get_float(&v, "t"), Some(16.5));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_int() {
        let v = lexpr::from_str("(:id 42 :x -100 :y :hello)").unwrap();
        assert_eq!(get_int(&v, "id"), Some(42));
        assert_eq!(get_int(&v, "x"), Some(-100));
        assert_eq!(get_int(&v, "y"), None);
    }

    #[test]
    fn test_parse_point() {
        let v = lexpr::from_str("(0.25 0.5)").unwrap();
        assert_eq!(parse_point(&v), Some(Point3::new(0.25, 0.5, 0.0)));
        let v = lexpr::from_str("(1 0 0.5)").unwrap();
        assert_eq!(parse_point(&v), Some(Point3::new(1.0, 0.0, 0.5)));
        let v = lexpr::from_str("(0.1 foo)").unwrap();
        assert_eq!(parse_point(&v), None);
        let v = lexpr::from_str("(0.1)").unwrap();
        assert_eq!(parse_point(&v), None);
    }

    #[test]
    fn test_format_event() {
        let e = format_event("next-page", &[("page", "2")]);
        assert_eq!(e, "(:type :event :event :next-page :page 2)");
    }

    // ── dispatch ────────────────────────────────────────────

    #[test]
    fn test_unknown_type() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:type :bogus :id 3)").unwrap();
        assert!(r.contains("unknown message type: bogus"));
    }

    #[test]
    fn test_missing_type() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:id 3)").unwrap();
        assert!(r.contains("missing :type field"));
    }

    #[test]
    fn test_malformed_sexp() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:type :frame").unwrap();
        assert!(r.contains(":status :error"));
    }

    #[test]
    fn test_frame_without_landmarks_is_scanning() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:type :frame :id 1 :t 0)").unwrap();
        assert!(r.contains(":name SCANNING"), "got {}", r);
        let r = handle_message(&mut state, "(:type :frame :id 2 :t 16 :landmarks ())").unwrap();
        assert!(r.contains(":name SCANNING"), "got {}", r);
    }

    #[test]
    fn test_frame_requires_timestamp() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:type :frame :id 1)").unwrap();
        assert!(r.contains("missing :t"));
    }

    #[test]
    fn test_frame_fist_queues_pause_event() {
        let mut state = nav_state();
        // Default frame: every tip level with its pip, so nothing is extended.
        let r = handle_message(&mut state, &frame_message(1, 0.0, &[])).unwrap();
        assert!(r.contains(":name PAUSED"), "got {}", r);
        assert!(r.contains(":confidence 0.80"), "got {}", r);
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(":event :pause"));
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_swipe_turns_page() {
        let mut state = nav_state();
        handle_message(&mut state, &open_hand(1, 0.0, 0.70)).unwrap();
        let r = handle_message(&mut state, &open_hand(2, 100.0, 0.50)).unwrap();
        assert!(r.contains(":name SWIPE_RIGHT"), "got {}", r);
        assert_eq!(state.pager.current(), 2);
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(":event :next-page"));
        assert!(events[0].contains(":page 2"));
    }

    #[test]
    fn test_short_frame_keeps_previous() {
        let mut state = nav_state();
        handle_message(&mut state, &frame_message(1, 0.0, &[])).unwrap();
        state.drain_events();
        let r = handle_message(
            &mut state,
            "(:type :frame :id 2 :t 16 :landmarks ((0.1 0.2 0.0) (0.3 0.4 0.0)))",
        )
        .unwrap();
        assert!(r.contains(":name PAUSED"), "got {}", r);
        assert!(state.drain_events().is_empty());
        assert!(state.gesture.status_sexp().contains(":dropped 1"));
    }

    #[test]
    fn test_bad_landmark_is_error() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:type :frame :id 4 :t 0 :landmarks ((0.1 x)))").unwrap();
        assert!(r.contains("bad landmark 0"), "got {}", r);
    }

    #[test]
    fn test_start_stop() {
        let mut state = NavState::new(GestureConfig::default(), 0);
        let r = handle_message(&mut state, "(:type :gesture-start :id 1)").unwrap();
        assert_eq!(r, ok_response(1));
        assert!(state.gesture.is_active());

        let r = handle_message(&mut state, "(:type :gesture-stop :id 2)").unwrap();
        assert_eq!(r, ok_response(2));
        assert!(!state.gesture.is_active());

        let r = handle_message(&mut state, "(:type :gesture-status :id 3)").unwrap();
        assert!(r.contains(":active nil"));
        assert!(r.contains(":name WAITING"));
    }

    #[test]
    fn test_gesture_config_updates() {
        let mut state = nav_state();
        let r = handle_message(
            &mut state,
            "(:type :gesture-config :id 5 :swipe-cooldown-ms 700 :open-hand-min-fingers 5 :thumb-palm-proximity 0.1)",
        )
        .unwrap();
        assert!(r.contains(":swipe-cooldown-ms 700"), "got {}", r);
        assert_eq!(state.gesture.config.open_hand_min_fingers, 5);
        assert!((state.gesture.config.fingers.thumb_palm_proximity - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_gesture_config_rejects_bad_values() {
        let mut state = nav_state();
        let r = handle_message(
            &mut state,
            "(:type :gesture-config :id 6 :swipe-window-ms 250 :open-hand-min-fingers 9)",
        )
        .unwrap();
        assert!(r.contains(":status :error"));
        // Nothing applied when any key is invalid.
        assert_eq!(state.gesture.config, GestureConfig::default());
    }

    #[test]
    fn test_pager_messages() {
        let mut state = nav_state();
        let r = handle_message(&mut state, "(:type :pager-set-total :id 7 :total 12)").unwrap();
        assert!(r.contains(":pager (:page 1 :total 12)"), "got {}", r);
        let r = handle_message(&mut state, "(:type :pager-set-total :id 8)").unwrap();
        assert!(r.contains(":status :error"));
        let r = handle_message(&mut state, "(:type :pager-status :id 9)").unwrap();
        assert!(r.contains(":total 12"));
    }

    #[test]
    fn test_pager_next_previous() {
        let mut state = NavState::new(GestureConfig::default(), 3);
        let r = handle_message(&mut state, "(:type :pager-next :id 1)").unwrap();
        assert!(r.contains(":pager (:page 2 :total 3)"), "got {}", r);
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(":event :next-page"), "got {:?}", events);
        assert!(events[0].contains(":source manual"), "got {:?}", events);
        assert!(events[0].contains(":page 2"), "got {:?}", events);

        let r = handle_message(&mut state, "(:type :pager-previous :id 2)").unwrap();
        assert!(r.contains(":pager (:page 1 :total 3)"), "got {}", r);
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(":event :previous-page"), "got {:?}", events);
    }

    #[test]
    fn test_pager_turns_clamp_at_bounds() {
        let mut state = NavState::new(GestureConfig::default(), 2);
        let r = handle_message(&mut state, "(:type :pager-previous :id 1)").unwrap();
        assert!(r.contains(":status :ok"), "got {}", r);
        assert!(r.contains(":pager (:page 1 :total 2)"), "got {}", r);
        assert!(state.drain_events().is_empty());

        handle_message(&mut state, "(:type :pager-next :id 2)").unwrap();
        state.drain_events();
        let r = handle_message(&mut state, "(:type :pager-next :id 3)").unwrap();
        assert!(r.contains(":pager (:page 2 :total 2)"), "got {}", r);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_pager_turn_ignores_session() {
        // Manual turns work while gesture recognition is stopped.
        let mut state = NavState::new(GestureConfig::default(), 4);
        assert!(!state.gesture.is_active());
        handle_message(&mut state, "(:type :pager-next :id 1)").unwrap();
        assert_eq!(state.pager.current(), 2);
        assert!(state.gesture.status_sexp().contains(":events 0"));
    }

    #[test]
    fn test_gesture_config_reports_exact_values() {
        let mut state = nav_state();
        let r = handle_message(
            &mut state,
            "(:type :gesture-config :id 10 :swipe-displacement-threshold 0.1505 :swipe-window-ms 450.4)",
        )
        .unwrap();
        assert!(r.contains(":swipe-displacement-threshold 0.1505 "), "got {}", r);
        assert!(r.contains(":swipe-window-ms 450.4 "), "got {}", r);

        // Feeding the reported config back leaves it unchanged.
        let before = state.gesture.config.clone();
        let config = r
            .split(":config ")
            .nth(1)
            .and_then(|c| c.strip_suffix(')'))
            .unwrap();
        let echo = format!("(:type :gesture-config :id 11 {}", &config[1..]);
        let r = handle_message(&mut state, &echo).unwrap();
        assert!(r.contains(":status :ok"), "got {}", r);
        assert_eq!(state.gesture.config, before);
    }

    #[test]
    fn test_empty_landmarks_clear_swipe_anchor() {
        let mut state = nav_state();
        handle_message(&mut state, &open_hand(1, 0.0, 0.30)).unwrap();
        assert!(state.gesture.swipe_tracker().anchor().is_some());
        handle_message(&mut state, "(:type :frame :id 2 :t 16 :landmarks ())").unwrap();
        assert_eq!(state.gesture.swipe_tracker().anchor(), None);
    }
}
