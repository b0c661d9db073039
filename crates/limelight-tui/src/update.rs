//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use limelight_core::events::ClientCommand;
use limelight_core::transport::ConnectionStatus;

use crate::effects::{LotteryAction, UiEffect};
use crate::events::UiEvent;
use crate::state::AppState;
use crate::statusline::NoticeLevel;

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick { now } => {
            app.captions.tick(now);
            app.wheel.step(now);
            app.status_line.tick(now);
            vec![]
        }
        UiEvent::Frame { .. } => {
            // Layout is derived from the terminal size at render time.
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Server { event, now } => {
            app.captions.handle_event(&event, now);
            app.wheel.handle_event(&event, now);
            vec![]
        }
        UiEvent::Transport(status) => {
            let previous = app.connection;
            app.connection = status;

            let mut effects = Vec::new();
            if status == ConnectionStatus::Connected && previous != ConnectionStatus::Connected {
                // Identify ourselves on every (re)connect; the server keys
                // its push subscriptions off the hello.
                effects.push(UiEffect::SendSocket(ClientCommand::hello()));
                if previous == ConnectionStatus::Reconnecting {
                    // The roster may have drifted while we were away.
                    effects.push(UiEffect::Hydrate);
                }
            }
            effects
        }
        UiEvent::HydrateResult { result } => {
            match result {
                Ok(snapshot) => {
                    app.lottery_locked = snapshot.is_locked;
                    app.wheel.replace_participants(
                        snapshot.participants,
                        snapshot.base_tickets_limit,
                        snapshot.final_tickets_limit,
                    );
                }
                Err(error) => {
                    tracing::warn!(%error, "lottery hydration failed");
                    app.status_line.set_notice(
                        NoticeLevel::Error,
                        format!("Hydration failed: {error}"),
                        Instant::now(),
                    );
                }
            }
            vec![]
        }
        UiEvent::LotteryResult { action, result } => {
            let now = Instant::now();
            match result {
                Ok(()) => app.status_line.set_notice(
                    NoticeLevel::Info,
                    format!("Lottery {} requested", action.label()),
                    now,
                ),
                Err(error) => app.status_line.set_notice(
                    NoticeLevel::Error,
                    format!("Lottery {} failed: {error}", action.label()),
                    now,
                ),
            }
            vec![]
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) => handle_key(app, key),
        // Resize is picked up from the frame size on the next draw.
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.kind == KeyEventKind::Release {
        return vec![];
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![UiEffect::Quit];
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => vec![UiEffect::Quit],
        KeyCode::Char('c') => {
            let enabled = !app.captions.is_enabled();
            app.captions.set_enabled(enabled);
            let text = if enabled {
                "Captions shown"
            } else {
                "Captions hidden"
            };
            app.status_line
                .set_notice(NoticeLevel::Info, text.to_string(), Instant::now());
            vec![]
        }
        KeyCode::Char('s') => vec![UiEffect::Lottery {
            action: LotteryAction::Start,
        }],
        KeyCode::Char('x') => vec![UiEffect::Lottery {
            action: LotteryAction::Stop,
        }],
        KeyCode::Char('r') => vec![UiEffect::Lottery {
            action: LotteryAction::Clear,
        }],
        _ => vec![],
    }
}
