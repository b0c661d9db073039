//! Status line state types.

use std::time::{Duration, Instant};

/// How long a transient notice stays visible.
const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message shown on the status line (REST call feedback).
#[derive(Clone, Debug)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
}

/// Public, immutable snapshot read by the renderer each frame.
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
    pub fps: f32,
    pub notice: Option<Notice>,
}

/// Mutable accumulator tracking FPS and the active notice.
#[derive(Debug)]
pub struct StatusLineAccumulator {
    fps_ema: f32,
    notice: Option<(Notice, Instant)>,
}

impl Default for StatusLineAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLineAccumulator {
    pub fn new() -> Self {
        Self {
            fps_ema: 60.0,
            notice: None,
        }
    }

    /// Update with frame time (ms).
    pub fn on_frame(&mut self, frame_ms: u16) {
        let fps = if frame_ms > 0 {
            1000.0 / f32::from(frame_ms)
        } else {
            self.fps_ema
        };
        self.fps_ema += 0.1 * (fps - self.fps_ema);
    }

    /// Replaces the active notice.
    pub fn set_notice(&mut self, level: NoticeLevel, text: String, now: Instant) {
        self.notice = Some((Notice { text, level }, now));
    }

    /// Drops the notice once it has been shown long enough.
    pub fn tick(&mut self, now: Instant) {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown_at)| now.duration_since(*shown_at) >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    /// Get snapshot for rendering.
    pub fn snapshot(&self) -> StatusLine {
        StatusLine {
            fps: (self.fps_ema * 10.0).round() / 10.0,
            notice: self.notice.as_ref().map(|(notice, _)| notice.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_tracking() {
        let mut acc = StatusLineAccumulator::new();
        acc.on_frame(16); // ~60fps
        acc.on_frame(16);
        acc.on_frame(16);
        let snapshot = acc.snapshot();
        assert!(snapshot.fps > 50.0);
    }

    #[test]
    fn test_notice_expires() {
        let now = Instant::now();
        let mut acc = StatusLineAccumulator::new();
        acc.set_notice(NoticeLevel::Info, "sent".to_string(), now);
        assert!(acc.snapshot().notice.is_some());

        acc.tick(now + Duration::from_secs(1));
        assert!(acc.snapshot().notice.is_some());

        acc.tick(now + Duration::from_secs(6));
        assert!(acc.snapshot().notice.is_none());
    }

    #[test]
    fn test_new_notice_replaces_old() {
        let now = Instant::now();
        let mut acc = StatusLineAccumulator::new();
        acc.set_notice(NoticeLevel::Info, "first".to_string(), now);
        acc.set_notice(NoticeLevel::Error, "second".to_string(), now + Duration::from_secs(4));

        // The replacement restarts the clock.
        acc.tick(now + Duration::from_secs(6));
        let notice = acc.snapshot().notice.expect("notice");
        assert_eq!(notice.text, "second");
    }
}
