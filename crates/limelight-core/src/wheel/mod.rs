//! Lottery wheel engine.
//!
//! Owns the participant roster, the derived wheel partition, and the spin
//! phase machine. Rotation advances through [`WheelState::step`], a
//! discrete time-stepped update fed by the caller's clock, so the physics
//! are deterministic under test. The server remains the authority on the
//! actual draw; local motion only decides timing and highlight.

pub mod geometry;
pub mod tickets;

use std::time::{Duration, Instant};

use geometry::WheelSegment;
use serde::Serialize;
use tickets::TicketLimits;

use crate::config::WheelConfig;
use crate::events::{Participant, ServerEvent};

/// Fixed physics tick. Deceleration decay applies once per tick so frame
/// pacing jitter cannot change the curve.
const PHYSICS_TICK: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq)]
pub enum WheelPhase {
    Idle,
    Spinning,
    Decelerating,
    /// At rest, highlighting the locally observed pointer segment while
    /// the server draw is still in flight.
    Revealing { local_winner: Option<String> },
    /// The canonical result announced by the server.
    Winner { name: String },
}

impl WheelPhase {
    pub fn label(&self) -> &'static str {
        match self {
            WheelPhase::Idle => "idle",
            WheelPhase::Spinning => "spinning",
            WheelPhase::Decelerating => "decelerating",
            WheelPhase::Revealing { .. } => "revealing",
            WheelPhase::Winner { .. } => "winner",
        }
    }
}

/// What one physics step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// Rotation or phase changed; the surface should redraw.
    pub changed: bool,
    /// The pointer moved onto a different segment during this step.
    pub crossed_segment: bool,
}

/// Serializable view of the engine, used by headless output and panels.
#[derive(Debug, Clone, Serialize)]
pub struct WheelSnapshot {
    pub phase: String,
    pub rotation: f64,
    pub winner: Option<String>,
    pub local_winner: Option<String>,
    pub segments: Vec<WheelSegment>,
}

#[derive(Debug)]
pub struct WheelState {
    cfg: WheelConfig,
    limits: TicketLimits,
    participants: Vec<Participant>,
    segments: Vec<WheelSegment>,
    phase: WheelPhase,
    /// Current rotation in degrees, kept in `[0, 360)`.
    rotation: f64,
    /// Angular velocity in degrees per second.
    velocity: f64,
    last_step: Option<Instant>,
    /// Sub-tick remainder carried between deceleration steps.
    tick_carry: Duration,
    /// Participant currently under the pointer, for crossing signals.
    pointer_over: Option<String>,
}

impl WheelState {
    pub fn new(cfg: WheelConfig) -> Self {
        let limits = cfg.ticket_limits();
        WheelState {
            cfg,
            limits,
            participants: Vec::new(),
            segments: Vec::new(),
            phase: WheelPhase::Idle,
            rotation: 0.0,
            velocity: 0.0,
            last_step: None,
            tick_carry: Duration::ZERO,
            pointer_over: None,
        }
    }

    pub fn phase(&self) -> &WheelPhase {
        &self.phase
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn segments(&self) -> &[WheelSegment] {
        &self.segments
    }

    /// Segment currently aligned with the pointer.
    pub fn pointer_segment(&self) -> Option<&WheelSegment> {
        geometry::segment_at_pointer(&self.segments, self.rotation)
    }

    /// The server-announced winner, once one exists.
    pub fn canonical_winner(&self) -> Option<&str> {
        match &self.phase {
            WheelPhase::Winner { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(
            self.phase,
            WheelPhase::Spinning | WheelPhase::Decelerating
        )
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        let local_winner = match &self.phase {
            WheelPhase::Revealing { local_winner } => local_winner.clone(),
            _ => None,
        };
        WheelSnapshot {
            phase: self.phase.label().to_string(),
            rotation: self.rotation,
            winner: self.canonical_winner().map(str::to_string),
            local_winner,
            segments: self.segments.clone(),
        }
    }

    /// Routes a lottery event into the engine. Returns whether state
    /// changed. Events the engine does not consume are ignored.
    pub fn handle_event(&mut self, event: &ServerEvent, now: Instant) -> bool {
        match event {
            ServerEvent::LotteryParticipantAdded { participant } => {
                self.upsert_participant(participant.clone());
                true
            }
            ServerEvent::LotteryParticipantsUpdated {
                participants,
                base_tickets_limit,
                final_tickets_limit,
            } => {
                self.replace_participants(
                    participants.clone(),
                    *base_tickets_limit,
                    *final_tickets_limit,
                );
                true
            }
            ServerEvent::LotteryStarted => self.start_spin(now),
            ServerEvent::LotteryStopped => self.begin_deceleration(),
            ServerEvent::LotteryWinner { winner } => self.set_winner(winner),
            ServerEvent::LotteryParticipantsCleared => self.clear(),
            _ => false,
        }
    }

    /// Inserts or replaces one participant by id.
    pub fn upsert_participant(&mut self, participant: Participant) {
        match self
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
        self.rebuild_segments();
    }

    /// Replaces the whole roster, optionally retuning the ticket limits.
    ///
    /// Safe mid-spin: the partition is rebuilt but the running animation
    /// is not interrupted, so the next pointer sample simply uses the new
    /// segments.
    pub fn replace_participants(
        &mut self,
        participants: Vec<Participant>,
        base_limit: Option<u32>,
        final_limit: Option<u32>,
    ) {
        self.participants = participants;
        if let Some(base) = base_limit {
            self.limits.base = base;
        }
        if let Some(final_total) = final_limit {
            self.limits.final_total = final_total;
        }
        self.rebuild_segments();
    }

    /// Begins a spin at the configured velocity. Refused when the wheel
    /// has no segments to land on, or while already spinning.
    pub fn start_spin(&mut self, now: Instant) -> bool {
        if self.segments.is_empty() || self.phase == WheelPhase::Spinning {
            return false;
        }
        self.phase = WheelPhase::Spinning;
        self.velocity = self.cfg.spin_velocity_deg_per_sec;
        self.tick_carry = Duration::ZERO;
        self.last_step = Some(now);
        self.pointer_over = self
            .pointer_segment()
            .map(|segment| segment.participant_id.clone());
        true
    }

    /// Switches a running spin into multiplicative decay.
    pub fn begin_deceleration(&mut self) -> bool {
        if self.phase != WheelPhase::Spinning {
            return false;
        }
        self.phase = WheelPhase::Decelerating;
        self.tick_carry = Duration::ZERO;
        true
    }

    /// Accepts the server's draw. Always overrides whatever the local
    /// pointer computed, phase and highlight included.
    pub fn set_winner(&mut self, name: &str) -> bool {
        if matches!(&self.phase, WheelPhase::Winner { name: current } if current == name) {
            return false;
        }
        self.phase = WheelPhase::Winner {
            name: name.to_string(),
        };
        self.velocity = 0.0;
        true
    }

    /// Resets to idle and discards roster, rotation, and winner state.
    pub fn clear(&mut self) -> bool {
        let had_state = !self.participants.is_empty()
            || self.phase != WheelPhase::Idle
            || self.rotation != 0.0;
        self.participants.clear();
        self.segments.clear();
        self.phase = WheelPhase::Idle;
        self.rotation = 0.0;
        self.velocity = 0.0;
        self.last_step = None;
        self.tick_carry = Duration::ZERO;
        self.pointer_over = None;
        had_state
    }

    /// Advances the animation to `now`.
    pub fn step(&mut self, now: Instant) -> StepOutcome {
        let Some(last) = self.last_step else {
            self.last_step = Some(now);
            return StepOutcome::default();
        };
        let elapsed = now.saturating_duration_since(last);
        self.last_step = Some(now);

        match self.phase {
            WheelPhase::Spinning => {
                self.rotation = geometry::normalize_angle(
                    self.rotation + self.velocity * elapsed.as_secs_f64(),
                );
                let crossed = self.update_pointer_over();
                StepOutcome {
                    changed: true,
                    crossed_segment: crossed,
                }
            }
            WheelPhase::Decelerating => {
                let total = self.tick_carry + elapsed;
                let ticks = (total.as_millis() / PHYSICS_TICK.as_millis()) as u32;
                self.tick_carry = total - PHYSICS_TICK * ticks;

                let (rotation, velocity) = decelerate(
                    self.rotation,
                    self.velocity,
                    ticks,
                    self.cfg.decay_factor,
                    self.cfg.rest_threshold_deg_per_sec,
                );
                self.rotation = geometry::normalize_angle(rotation);
                self.velocity = velocity;
                let crossed = self.update_pointer_over();

                if self.velocity == 0.0 {
                    // At rest; the pointer segment becomes the local pick.
                    self.phase = WheelPhase::Revealing {
                        local_winner: self
                            .pointer_segment()
                            .map(|segment| segment.participant_id.clone()),
                    };
                }
                StepOutcome {
                    changed: ticks > 0,
                    crossed_segment: crossed,
                }
            }
            _ => StepOutcome::default(),
        }
    }

    fn rebuild_segments(&mut self) {
        self.segments = geometry::build_segments(&self.participants, self.limits);
    }

    /// Re-samples the pointer segment; returns whether it changed.
    fn update_pointer_over(&mut self) -> bool {
        let current = self
            .pointer_segment()
            .map(|segment| segment.participant_id.clone());
        let crossed = current != self.pointer_over && current.is_some();
        self.pointer_over = current;
        crossed
    }
}

/// Deceleration physics, pure in its inputs.
///
/// Per tick: advance by the current velocity, then decay it; once it
/// drops below the rest threshold it is pinned to exactly zero.
fn decelerate(
    mut rotation: f64,
    mut velocity: f64,
    ticks: u32,
    decay_factor: f64,
    rest_threshold: f64,
) -> (f64, f64) {
    let tick_secs = PHYSICS_TICK.as_secs_f64();
    for _ in 0..ticks {
        if velocity == 0.0 {
            break;
        }
        rotation += velocity * tick_secs;
        velocity *= decay_factor;
        if velocity < rest_threshold {
            velocity = 0.0;
        }
    }
    (rotation, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SubscriberTier;

    fn participant(id: &str, entry_count: u32) -> Participant {
        Participant {
            id: id.to_string(),
            entry_count,
            is_subscriber: false,
            subscriber_tier: SubscriberTier::Unknown,
            subscribed_months: 0,
        }
    }

    fn wheel_with(ids: &[&str]) -> WheelState {
        let mut wheel = WheelState::new(WheelConfig::default());
        wheel.replace_participants(
            ids.iter().map(|id| participant(id, 1)).collect(),
            None,
            None,
        );
        wheel
    }

    /// Drives the animation in 50ms steps until the phase settles.
    fn settle(wheel: &mut WheelState, start: Instant) -> Instant {
        let mut now = start;
        for _ in 0..400 {
            now += Duration::from_millis(50);
            wheel.step(now);
            if !wheel.is_moving() {
                break;
            }
        }
        now
    }

    #[test]
    fn test_spin_refused_without_participants() {
        let mut wheel = WheelState::new(WheelConfig::default());
        let now = Instant::now();
        assert!(!wheel.handle_event(&ServerEvent::LotteryStarted, now));
        assert_eq!(*wheel.phase(), WheelPhase::Idle);
    }

    #[test]
    fn test_spin_advances_rotation() {
        let mut wheel = wheel_with(&["a", "b"]);
        let now = Instant::now();
        assert!(wheel.start_spin(now));

        let outcome = wheel.step(now + Duration::from_millis(100));
        assert!(outcome.changed);
        // 540 deg/s for 100ms.
        assert!((wheel.rotation() - 54.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_decays_to_revealing() {
        let mut wheel = wheel_with(&["a", "b", "c"]);
        let start = Instant::now();
        wheel.start_spin(start);
        wheel.step(start + Duration::from_millis(200));
        assert!(wheel.begin_deceleration());

        settle(&mut wheel, start + Duration::from_millis(200));
        match wheel.phase() {
            WheelPhase::Revealing { local_winner } => {
                let under_pointer = wheel
                    .pointer_segment()
                    .map(|segment| segment.participant_id.clone());
                assert_eq!(*local_winner, under_pointer);
                assert!(local_winner.is_some());
            }
            other => panic!("expected revealing, got {other:?}"),
        }
        assert_eq!(wheel.velocity(), 0.0);
    }

    #[test]
    fn test_server_winner_overrides_local() {
        let mut wheel = wheel_with(&["a", "b"]);
        let start = Instant::now();
        wheel.start_spin(start);
        wheel.begin_deceleration();
        settle(&mut wheel, start);
        assert!(matches!(wheel.phase(), WheelPhase::Revealing { .. }));

        // "zeta" is on no segment at all; it still wins.
        assert!(wheel.handle_event(
            &ServerEvent::LotteryWinner {
                winner: "zeta".to_string(),
            },
            start,
        ));
        assert_eq!(wheel.canonical_winner(), Some("zeta"));
    }

    #[test]
    fn test_winner_accepted_mid_spin() {
        let mut wheel = wheel_with(&["a", "b"]);
        let now = Instant::now();
        wheel.start_spin(now);
        assert!(wheel.set_winner("b"));
        assert_eq!(wheel.canonical_winner(), Some("b"));
        assert_eq!(wheel.velocity(), 0.0);
    }

    #[test]
    fn test_clear_resets_to_idle() {
        let mut wheel = wheel_with(&["a", "b"]);
        let now = Instant::now();
        wheel.start_spin(now);
        wheel.set_winner("a");

        assert!(wheel.handle_event(&ServerEvent::LotteryParticipantsCleared, now));
        assert_eq!(*wheel.phase(), WheelPhase::Idle);
        assert!(wheel.participants().is_empty());
        assert!(wheel.segments().is_empty());
        assert_eq!(wheel.rotation(), 0.0);
    }

    #[test]
    fn test_roster_update_mid_spin_keeps_animation() {
        let mut wheel = wheel_with(&["a", "b"]);
        let start = Instant::now();
        wheel.start_spin(start);
        wheel.step(start + Duration::from_millis(100));
        let rotation_before = wheel.rotation();

        wheel.replace_participants(
            vec![participant("a", 1), participant("b", 1), participant("c", 2)],
            None,
            None,
        );
        assert_eq!(*wheel.phase(), WheelPhase::Spinning);
        assert_eq!(wheel.segments().len(), 3);
        assert_eq!(wheel.rotation(), rotation_before);

        // Animation carries on over the new partition.
        let outcome = wheel.step(start + Duration::from_millis(200));
        assert!(outcome.changed);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut wheel = wheel_with(&["a"]);
        wheel.upsert_participant(participant("a", 5));
        assert_eq!(wheel.participants().len(), 1);
        assert_eq!(wheel.participants()[0].entry_count, 5);
        assert_eq!(wheel.segments()[0].weight, 5);

        wheel.upsert_participant(participant("b", 1));
        assert_eq!(wheel.participants().len(), 2);
    }

    #[test]
    fn test_limits_from_update_event() {
        let mut wheel = WheelState::new(WheelConfig::default());
        let now = Instant::now();
        wheel.handle_event(
            &ServerEvent::LotteryParticipantsUpdated {
                participants: vec![participant("a", 9), participant("b", 1)],
                base_tickets_limit: Some(3),
                final_tickets_limit: None,
            },
            now,
        );
        assert_eq!(wheel.segments()[0].weight, 3);
        assert_eq!(wheel.segments()[1].weight, 1);
    }

    #[test]
    fn test_boundary_crossing_signal() {
        let mut wheel = wheel_with(&["a", "b"]);
        let now = Instant::now();
        wheel.start_spin(now);

        // 540 deg/s over 400ms sweeps 216 degrees, crossing a boundary.
        let outcome = wheel.step(now + Duration::from_millis(400));
        assert!(outcome.crossed_segment);
    }

    #[test]
    fn test_decelerate_pins_velocity_to_zero() {
        let (_, velocity) = decelerate(0.0, 540.0, 10_000, 0.985, 12.0);
        assert_eq!(velocity, 0.0);

        let (rotation, velocity) = decelerate(10.0, 540.0, 1, 0.985, 12.0);
        assert!((rotation - (10.0 + 540.0 * 0.016)).abs() < 1e-9);
        assert!((velocity - 540.0 * 0.985).abs() < 1e-9);
    }

    #[test]
    fn test_restart_after_winner() {
        let mut wheel = wheel_with(&["a", "b"]);
        let now = Instant::now();
        wheel.set_winner("a");
        assert!(wheel.start_spin(now));
        assert_eq!(*wheel.phase(), WheelPhase::Spinning);
    }

    #[test]
    fn test_snapshot_shape() {
        let mut wheel = wheel_with(&["a", "b"]);
        wheel.set_winner("b");

        let json = serde_json::to_value(wheel.snapshot()).unwrap();
        assert_eq!(json["phase"], "winner");
        assert_eq!(json["winner"], "b");
        assert_eq!(json["segments"].as_array().unwrap().len(), 2);
        assert_eq!(json["segments"][0]["participant_id"], "a");
    }
}
