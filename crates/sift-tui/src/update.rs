//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.
//!
//! This is the single source of truth for how events modify state.

use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use sift_core::scenario;
use sift_core::turn::{MessagePatch, TurnEvent};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, TurnState};
use crate::{render, transcript};

/// Lines scrolled per mouse wheel notch.
const WHEEL_SCROLL_LINES: usize = 3;

/// Max characters of the first user message kept as a conversation title.
const TITLE_MAX_CHARS: usize = 40;

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            // Advance spinner animation and expire the scroll affordance.
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            app.viewport.tick(Instant::now());
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(app, width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Turn(turn_event) => handle_turn_event(app, turn_event),
        UiEvent::TurnSpawned { message_id, rx } => {
            if let Err(err) = app.store.append_agent_placeholder(message_id) {
                tracing::error!(%err, "placeholder append rejected");
                return vec![];
            }
            app.turn_state = TurnState::Running { message_id, rx };
            app.viewport.on_turn_started();
            app.viewport.scroll_to_bottom();
            vec![]
        }
    }
}

/// Per-frame layout: recompute transcript geometry and detect content growth.
fn handle_frame(app: &mut AppState, width: u16, height: u16) {
    let (text_width, visible) = render::transcript_geometry(width, height, app.show_sidebar);
    let lines = transcript::build_lines(
        app.store.messages(),
        app.store.is_pristine(),
        app.spinner_frame,
        text_width,
    )
    .len();

    if app.store.version() != app.last_seen_version {
        app.last_seen_version = app.store.version();
        app.viewport.on_content_appended(lines);
    }
    app.viewport.set_geometry(lines, visible as usize);
    app.transcript_height = visible;
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Mouse(mouse) => handle_mouse(app, &mouse),
        _ => vec![],
    }
}

fn handle_mouse(app: &mut AppState, mouse: &MouseEvent) -> Vec<UiEffect> {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.viewport.scroll_up(WHEEL_SCROLL_LINES),
        MouseEventKind::ScrollDown => app.viewport.scroll_down(WHEEL_SCROLL_LINES),
        _ => {}
    }
    vec![]
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Ctrl+C: cancel turn, clear input, or quit.
        KeyCode::Char('c') if ctrl => {
            if app.turn_state.is_running() {
                cancel_turn(app)
            } else if !app.input.is_empty() {
                app.input.clear();
                vec![]
            } else {
                vec![UiEffect::Quit]
            }
        }
        KeyCode::Char('b') if ctrl => {
            app.show_sidebar = !app.show_sidebar;
            vec![]
        }
        KeyCode::Char('n') if ctrl => reset_conversation(app),
        KeyCode::Esc => {
            if app.turn_state.is_running() {
                cancel_turn(app)
            } else {
                app.input.clear();
                vec![]
            }
        }
        KeyCode::Enter => {
            let Some(text) = app.input.take_submission() else {
                return vec![];
            };
            submit(app, text)
        }
        KeyCode::Up => {
            app.input.history_prev();
            vec![]
        }
        KeyCode::Down => {
            app.input.history_next();
            vec![]
        }
        KeyCode::PageUp => {
            app.viewport.scroll_up(app.transcript_height as usize);
            vec![]
        }
        KeyCode::PageDown => {
            app.viewport.scroll_down(app.transcript_height as usize);
            vec![]
        }
        KeyCode::Backspace => {
            app.input.backspace();
            vec![]
        }
        KeyCode::Delete => {
            app.input.delete();
            vec![]
        }
        KeyCode::Left => {
            app.input.move_left();
            vec![]
        }
        KeyCode::Right => {
            app.input.move_right();
            vec![]
        }
        KeyCode::Home => {
            app.input.move_home();
            vec![]
        }
        // End jumps to the newest content when not editing.
        KeyCode::End => {
            if app.input.is_empty() {
                app.viewport.scroll_to_bottom();
            } else {
                app.input.move_end();
            }
            vec![]
        }
        KeyCode::Char(ch) if !ctrl => {
            // Digits select a welcome quick action while the input is empty.
            if app.input.is_empty()
                && app.store.is_pristine()
                && let Some(action) = quick_action(ch)
            {
                app.input.set_text(action);
                if let Some(text) = app.input.take_submission() {
                    return submit(app, text);
                }
                return vec![];
            }
            app.input.insert_char(ch);
            vec![]
        }
        _ => vec![],
    }
}

fn quick_action(ch: char) -> Option<&'static str> {
    let index = ch.to_digit(10)? as usize;
    (1..=scenario::QUICK_ACTIONS.len())
        .contains(&index)
        .then(|| scenario::QUICK_ACTIONS[index - 1])
}

/// Appends the user message and asks the runtime to start a turn.
///
/// Submission while a turn is running is dropped; the input guard upstream
/// makes this unreachable from the keyboard, but quick actions and tests go
/// through here too.
fn submit(app: &mut AppState, prompt: String) -> Vec<UiEffect> {
    if app.turn_state.is_running() {
        tracing::warn!("submit ignored while a turn is active");
        return vec![];
    }
    app.store.append_user(prompt.clone());
    app.viewport.scroll_to_bottom();
    vec![UiEffect::StartTurn { prompt }]
}

/// Tears down the running turn locally and asks the runtime to cancel it.
///
/// Dropping the receiver here is what guarantees silence: even events the
/// task managed to queue before the token fired can no longer arrive.
fn cancel_turn(app: &mut AppState) -> Vec<UiEffect> {
    if !app.turn_state.is_running() {
        return vec![];
    }
    app.turn_state = TurnState::Idle;
    app.viewport.on_turn_completed(Instant::now());
    vec![UiEffect::CancelTurn]
}

/// Starts a fresh conversation, keeping the old one's title in the sidebar.
fn reset_conversation(app: &mut AppState) -> Vec<UiEffect> {
    let effects = cancel_turn(app);

    if let Some(first_user) = app
        .store
        .messages()
        .iter()
        .find(|m| m.role == sift_core::turn::Role::User)
    {
        let title: String = first_user.text.chars().take(TITLE_MAX_CHARS).collect();
        app.past_conversations.push(title);
    }

    app.store.reset(scenario::WELCOME_TEXT);
    app.input.clear();
    app.viewport.scroll_to_bottom();
    effects
}

fn handle_turn_event(app: &mut AppState, event: TurnEvent) -> Vec<UiEffect> {
    let TurnState::Running { message_id, .. } = &app.turn_state else {
        // Receiver already torn down (cancel raced a queued event).
        return vec![];
    };
    let id = *message_id;

    let patch = match event {
        TurnEvent::TurnStarted => return vec![],
        TurnEvent::TurnCompleted => {
            app.engine.finish(id);
            app.turn_state = TurnState::Idle;
            app.viewport.on_turn_completed(Instant::now());
            return vec![];
        }
        TurnEvent::StageChanged { stage } => MessagePatch {
            stage: Some(stage),
            ..Default::default()
        },
        TurnEvent::ThinkingUpdate { text } => MessagePatch {
            thinking: Some(text),
            ..Default::default()
        },
        TurnEvent::ReplyUpdate { text } => MessagePatch {
            text: Some(text),
            ..Default::default()
        },
        TurnEvent::StepsUpdate { steps } => MessagePatch {
            steps: Some(steps),
            ..Default::default()
        },
        TurnEvent::ReportReady { report } => MessagePatch {
            final_report: Some(report),
            ..Default::default()
        },
    };

    if let Err(err) = app.store.patch_agent(id, patch) {
        tracing::error!(%err, "turn patch rejected");
    }
    vec![]
}

#[cfg(test)]
mod tests {
    use sift_core::config::Config;
    use sift_core::turn::{MessageId, Role, Stage, create_event_channel};

    use super::*;

    fn app() -> AppState {
        AppState::new(Config::default())
    }

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl_key(ch: char) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(
            KeyCode::Char(ch),
            KeyModifiers::CONTROL,
        )))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            update(app, key(KeyCode::Char(ch)));
        }
    }

    fn spawn_running_turn(app: &mut AppState) -> MessageId {
        let (_tx, rx) = create_event_channel();
        let message_id = MessageId::new();
        update(app, UiEvent::TurnSpawned { message_id, rx });
        message_id
    }

    #[test]
    fn enter_submits_and_emits_start_turn() {
        let mut app = app();
        type_text(&mut app, "analyze beverages");

        let effects = update(&mut app, key(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![UiEffect::StartTurn {
                prompt: "analyze beverages".to_string()
            }]
        );

        let last = app.store.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.text, "analyze beverages");
        assert!(app.input.is_empty());
    }

    #[test]
    fn blank_input_does_not_submit() {
        let mut app = app();
        type_text(&mut app, "   ");
        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert_eq!(app.store.messages().len(), 1);
    }

    #[test]
    fn turn_spawned_appends_thinking_placeholder() {
        let mut app = app();
        let id = spawn_running_turn(&mut app);

        let last = app.store.messages().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.role, Role::Agent);
        assert_eq!(last.stage, Stage::Thinking);
        assert!(app.turn_state.is_running());
    }

    #[test]
    fn submission_is_dropped_while_turn_runs() {
        let mut app = app();
        spawn_running_turn(&mut app);
        let before = app.store.messages().len();

        type_text(&mut app, "another question");
        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert_eq!(app.store.messages().len(), before);
    }

    #[test]
    fn quick_action_digit_submits_on_pristine_conversation() {
        let mut app = app();
        let effects = update(&mut app, key(KeyCode::Char('2')));
        assert_eq!(
            effects,
            vec![UiEffect::StartTurn {
                prompt: scenario::QUICK_ACTIONS[1].to_string()
            }]
        );
    }

    #[test]
    fn digits_are_plain_text_after_first_message() {
        let mut app = app();
        app.store.append_user("earlier question");

        let effects = update(&mut app, key(KeyCode::Char('2')));
        assert!(effects.is_empty());
        assert_eq!(app.input.text(), "2");
    }

    #[test]
    fn turn_events_patch_the_placeholder() {
        let mut app = app();
        let id = spawn_running_turn(&mut app);

        update(
            &mut app,
            UiEvent::Turn(TurnEvent::ThinkingUpdate {
                text: "reasoning".to_string(),
            }),
        );
        update(
            &mut app,
            UiEvent::Turn(TurnEvent::StageChanged {
                stage: Stage::Speaking,
            }),
        );
        update(
            &mut app,
            UiEvent::Turn(TurnEvent::ReplyUpdate {
                text: "partial reply".to_string(),
            }),
        );

        let msg = app.store.messages().iter().find(|m| m.id == id).unwrap();
        assert_eq!(msg.thinking, "reasoning");
        assert_eq!(msg.text, "partial reply");
        assert_eq!(msg.stage, Stage::Speaking);
    }

    #[test]
    fn turn_completed_returns_to_idle() {
        let mut app = app();
        spawn_running_turn(&mut app);

        update(&mut app, UiEvent::Turn(TurnEvent::TurnCompleted));
        assert!(!app.turn_state.is_running());
    }

    #[test]
    fn esc_cancels_running_turn() {
        let mut app = app();
        spawn_running_turn(&mut app);

        let effects = update(&mut app, key(KeyCode::Esc));
        assert_eq!(effects, vec![UiEffect::CancelTurn]);
        assert!(!app.turn_state.is_running());
    }

    #[test]
    fn ctrl_c_cancels_then_clears_then_quits() {
        let mut app = app();
        spawn_running_turn(&mut app);
        assert_eq!(update(&mut app, ctrl_key('c')), vec![UiEffect::CancelTurn]);

        type_text(&mut app, "draft");
        assert!(update(&mut app, ctrl_key('c')).is_empty());
        assert!(app.input.is_empty());

        assert_eq!(update(&mut app, ctrl_key('c')), vec![UiEffect::Quit]);
    }

    #[test]
    fn ctrl_n_resets_and_records_title() {
        let mut app = app();
        type_text(&mut app, "analyze beverages");
        update(&mut app, key(KeyCode::Enter));

        let effects = update(&mut app, ctrl_key('n'));
        assert!(effects.is_empty());
        assert_eq!(app.store.messages().len(), 1);
        assert!(app.store.is_pristine());
        assert_eq!(app.past_conversations, vec!["analyze beverages"]);
    }

    #[test]
    fn ctrl_n_mid_turn_also_cancels() {
        let mut app = app();
        app.store.append_user("question");
        spawn_running_turn(&mut app);

        let effects = update(&mut app, ctrl_key('n'));
        assert_eq!(effects, vec![UiEffect::CancelTurn]);
        assert!(!app.turn_state.is_running());
        assert!(app.store.is_pristine());
    }

    #[test]
    fn frame_growth_raises_affordance_when_anchored() {
        let mut app = app();
        // Fill the transcript well past one screen.
        for _ in 0..30 {
            app.store.append_user("a question that takes up a line");
        }
        update(&mut app, UiEvent::Frame { width: 100, height: 24 });

        spawn_running_turn(&mut app);
        update(&mut app, UiEvent::Frame { width: 100, height: 24 });
        app.viewport.scroll_up(10);

        update(
            &mut app,
            UiEvent::Turn(TurnEvent::ThinkingUpdate {
                text: "line one\nline two\nline three".to_string(),
            }),
        );
        update(&mut app, UiEvent::Frame { width: 100, height: 24 });
        assert!(app.viewport.alert_visible());

        app.viewport.scroll_to_bottom();
        assert!(!app.viewport.alert_visible());
    }

    #[test]
    fn late_turn_events_after_cancel_are_ignored() {
        let mut app = app();
        let id = spawn_running_turn(&mut app);
        update(&mut app, key(KeyCode::Esc));

        update(
            &mut app,
            UiEvent::Turn(TurnEvent::ReplyUpdate {
                text: "late".to_string(),
            }),
        );
        let msg = app.store.messages().iter().find(|m| m.id == id).unwrap();
        assert!(msg.text.is_empty());
    }
}
