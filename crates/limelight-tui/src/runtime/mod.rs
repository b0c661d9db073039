//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! The runtime uses an "inbox" pattern for async event collection:
//! - Socket handlers and spawned API calls send `UiEvent`s to `inbox_tx`
//! - The runtime drains `inbox_rx` each loop iteration
//! - This eliminates per-operation receivers and keeps collection in one place

mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use limelight_core::api::OverlayApi;
use limelight_core::config::Config;
use limelight_core::transport::{SocketClient, Subscription};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::effects::{LotteryAction, UiEffect};
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Target frame rate while the wheel is moving (60fps = ~16ms per frame).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle (wheel at rest, no recent input).
/// Longer timeout reduces CPU usage when nothing is happening.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen overlay runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is guaranteed to be restored on drop, panic, or Ctrl+C.
pub struct TuiRuntime {
    /// Terminal instance.
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state.
    pub state: AppState,
    /// Inbox sender - handlers send events here.
    inbox_tx: UiEventSender,
    /// Inbox receiver - runtime drains this each loop iteration.
    inbox_rx: UiEventReceiver,
    /// Control-plane API client, cloned into spawned effect tasks.
    api: OverlayApi,
    /// Socket connection to the overlay server.
    socket: SocketClient,
    /// Registered socket handlers, released on drop.
    subscriptions: Vec<Subscription>,
    /// Last time a Tick event was emitted.
    last_tick: Instant,
    /// Last time a render occurred (for FPS calculation).
    last_render: Instant,
    /// Last time a terminal event was received (for fast tick during interaction).
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Creates the runtime: panic hook, terminal, state, socket wiring.
    ///
    /// Must be called from within a tokio runtime; the socket connection and
    /// status forwarding run as background tasks.
    pub fn new(config: &Config) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let state = AppState::new(config);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let api = OverlayApi::new(&config.api);
        let socket = SocketClient::new(config.transport.clone());

        // Register handlers before connecting so no early event is missed.
        // Events are stamped on arrival; the reducer never reads the clock.
        let tx = inbox_tx.clone();
        let subscriptions = socket.on_all(move |server_event| {
            let _ = tx.send(UiEvent::Server {
                event: server_event.clone(),
                now: Instant::now(),
            });
        });

        // Forward connection status changes into the inbox.
        let mut status_rx = socket.watch_status();
        let tx = inbox_tx.clone();
        tokio::spawn(async move {
            loop {
                let status = *status_rx.borrow_and_update();
                if tx.send(UiEvent::Transport(status)).is_err() {
                    break;
                }
                if status_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        socket.connect()?;

        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            inbox_tx,
            inbox_rx,
            api,
            socket,
            subscriptions,
            last_tick: now,
            last_render: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until quit.
    pub fn run(&mut self) -> Result<()> {
        // Pull the current roster before the first frame.
        self.execute_effect(UiEffect::Hydrate);

        let result = self.event_loop();

        self.socket.teardown();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true; // Start dirty to ensure initial render

        while !self.state.should_quit {
            // Collect events from terminal and inbox
            let mut events = self.collect_events()?;

            // Prepend Frame event with current terminal size
            // This ensures layout updates happen before other events
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            // Process each event through the reducer
            for ui_event in events {
                // Track terminal activity for fast tick mode
                if matches!(&ui_event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }

                // Only Tick triggers render - this caps frame rate at tick cadence
                // Terminal and server events update state but batch renders to next Tick
                let marks_dirty = matches!(&ui_event, UiEvent::Tick { .. });

                let effects = update::update(&mut self.state, ui_event);
                if marks_dirty {
                    dirty = true;
                }
                self.execute_effects(effects);
            }

            // Only render if something changed
            if dirty {
                // Measure time since last render (actual frame interval for FPS)
                let frame_ms = self.last_render.elapsed().as_millis() as u16;
                self.last_render = Instant::now();

                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;

                dirty = false;

                self.state.status_line.on_frame(frame_ms);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects events from all sources (terminal, inbox).
    ///
    /// Blocks in `event::poll` until the next tick is due, a caption expiry
    /// deadline lands, or input arrives.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        // Fast polling (60fps) only while the wheel is moving or the user is
        // actively typing; otherwise slow polling to save CPU.
        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = self.state.wheel.is_moving() || recent_terminal_activity;

        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        // Drain inbox - socket events and async results arrive here
        while let Ok(ui_event) = self.inbox_rx.try_recv() {
            events.push(ui_event);
        }

        // Calculate time until next tick for poll duration.
        // Caption expiries can land between idle ticks, so also wake for the
        // nearest pending deadline.
        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let mut poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            Duration::ZERO
        };
        if let Some(deadline) = self.state.captions.next_deadline() {
            poll_duration = poll_duration.min(deadline.saturating_duration_since(Instant::now()));
        }

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            // Drain any remaining buffered events (non-blocking)
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        // Emit Tick after poll - either the interval elapsed or a caption
        // deadline is due and needs a tick to be observed.
        let now = Instant::now();
        let timer_due = self
            .state
            .captions
            .next_deadline()
            .is_some_and(|deadline| deadline <= now);
        if timer_due || self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick { now });
            self.last_tick = now;
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    /// Executes effects returned by the reducer.
    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async effect, sending the result event to the inbox when
    /// complete. Handlers stay pure async functions that return `UiEvent`.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    /// Executes a single effect.
    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::Hydrate => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    let result = api
                        .fetch_lottery()
                        .await
                        .map_err(|error| format!("{error:#}"));
                    UiEvent::HydrateResult { result }
                });
            }
            UiEffect::Lottery { action } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    let result = match action {
                        LotteryAction::Start => api.start_lottery().await,
                        LotteryAction::Stop => api.stop_lottery().await,
                        LotteryAction::Clear => api.clear_participants().await,
                    }
                    .map_err(|error| format!("{error:#}"));
                    UiEvent::LotteryResult { action, result }
                });
            }
            UiEffect::SendSocket(command) => {
                if let Err(err) = self.socket.send(command) {
                    tracing::warn!(%err, "failed to queue socket command");
                }
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.socket.teardown();
        let _ = terminal::restore_terminal();
    }
}
