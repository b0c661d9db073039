//! Caption line lifecycle.
//!
//! The board reconciles an unordered stream of speech fragments into an
//! ordered list of display lines. Final fragments merge with or append to
//! the list, interim fragments live in a single provisional slot, and
//! translations are correlated back to their line even after a merge has
//! renamed it. All timing flows through an injected clock so the whole
//! lifecycle is testable without sleeping.

mod alias;

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use alias::AliasTable;
use serde::Serialize;

use crate::config::CaptionsConfig;
use crate::events::ServerEvent;
use crate::timer::TimerSet;

/// Timers owned by the board. Each name is armed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum CaptionTimer {
    /// Fires at the minimum `expires_at` across all lines.
    Expiry,
    /// Drops the provisional line after a quiet period.
    InterimQuiet,
    /// Lapses when the newest line has waited long enough for translations.
    TranslationWait,
    /// Clears the whole board after a period of no activity.
    DisplayClear,
}

/// Key addressing one translation slot on a line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TranslationSlot {
    Index(u32),
    Language(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
}

/// A committed caption line.
#[derive(Debug, Clone)]
pub struct CaptionLine {
    pub id: String,
    pub text: String,
    pub translations: BTreeMap<TranslationSlot, Translation>,
    pub expected_translations: u32,
    created_at: Instant,
    expires_at: Option<Instant>,
}

impl CaptionLine {
    /// Whether fewer distinct translations have arrived than announced.
    pub fn awaiting_translations(&self) -> bool {
        (self.translations.len() as u32) < self.expected_translations
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}

/// The single provisional line, replaced wholesale on every interim event.
#[derive(Debug, Clone)]
pub struct InterimLine {
    pub id: Option<String>,
    pub text: String,
}

/// Serializable view of the board, used by headless output and panels.
#[derive(Debug, Clone, Serialize)]
pub struct CaptionsSnapshot {
    pub enabled: bool,
    pub lines: Vec<LineSnapshot>,
    pub interim: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineSnapshot {
    pub id: String,
    pub text: String,
    pub expected_translations: u32,
    pub translations: Vec<TranslationSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationSnapshot {
    pub slot: String,
    pub text: String,
    pub target_language: Option<String>,
}

#[derive(Debug)]
pub struct CaptionBoard {
    cfg: CaptionsConfig,
    enabled: bool,
    lines: VecDeque<CaptionLine>,
    interim: Option<InterimLine>,
    aliases: AliasTable,
    timers: TimerSet<CaptionTimer>,
}

impl CaptionBoard {
    pub fn new(cfg: CaptionsConfig) -> Self {
        let enabled = cfg.enabled;
        CaptionBoard {
            cfg,
            enabled,
            lines: VecDeque::new(),
            interim: None,
            aliases: AliasTable::new(),
            timers: TimerSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Committed lines, oldest first.
    pub fn lines(&self) -> &VecDeque<CaptionLine> {
        &self.lines
    }

    pub fn interim(&self) -> Option<&InterimLine> {
        self.interim.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.interim.is_none()
    }

    /// Earliest instant at which [`CaptionBoard::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Routes a transcript or translation event into the board.
    ///
    /// Returns whether visible state changed. Events the board does not
    /// consume are ignored.
    pub fn handle_event(&mut self, event: &ServerEvent, now: Instant) -> bool {
        match event {
            ServerEvent::Transcript {
                id,
                text,
                is_interim,
                expected_translations,
                ..
            } => {
                if *is_interim {
                    self.ingest_interim(id.as_deref(), text, now)
                } else {
                    self.ingest_final(id.as_deref(), text, *expected_translations, now)
                }
            }
            ServerEvent::TranscriptTranslation {
                id,
                translation,
                target_language,
                source_language,
                slot_index,
            } => self.apply_translation(
                id.as_deref(),
                translation,
                target_language.as_deref(),
                source_language.as_deref(),
                *slot_index,
                now,
            ),
            _ => false,
        }
    }

    /// Commits a final speech fragment.
    ///
    /// A fragment that continues the newest unexpired line (either text is
    /// a prefix of the other) merges in place: the line keeps its position
    /// but takes the new text and id, and the old id is recorded as a
    /// redirect so in-flight translations still land. Anything else appends,
    /// dropping the oldest line once the board is full.
    pub fn ingest_final(
        &mut self,
        id: Option<&str>,
        text: &str,
        expected_translations: Option<u32>,
        now: Instant,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let absorbed = self.interim.take();
        if absorbed.is_some() {
            self.timers.cancel(CaptionTimer::InterimQuiet);
        }

        let new_id = id.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

        let merged_old_id = match self.lines.back_mut() {
            Some(last)
                if last.expires_at.is_none_or(|at| at > now)
                    && (text.starts_with(last.text.as_str()) || last.text.starts_with(text)) =>
            {
                let old_id = std::mem::replace(&mut last.id, new_id.clone());
                last.text = text.to_string();
                if let Some(expected) = expected_translations {
                    last.expected_translations = expected;
                }
                last.created_at = now;
                Some(old_id)
            }
            _ => None,
        };

        if let Some(old_id) = merged_old_id {
            self.aliases.record(&old_id, &new_id, now);
        } else {
            self.lines.push_back(CaptionLine {
                id: new_id.clone(),
                text: text.to_string(),
                translations: BTreeMap::new(),
                expected_translations: expected_translations.unwrap_or(0),
                created_at: now,
                expires_at: None,
            });
            while self.lines.len() > self.cfg.max_lines {
                self.lines.pop_front();
            }
        }

        // The promoted interim may already have translations addressed to it.
        if let Some(interim_id) = absorbed.and_then(|interim| interim.id) {
            self.aliases.record(&interim_id, &new_id, now);
        }

        self.schedule_after_commit(now);
        true
    }

    /// Replaces the provisional line and restarts its quiet-period timer.
    pub fn ingest_interim(&mut self, id: Option<&str>, text: &str, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.interim = Some(InterimLine {
            id: id.map(str::to_string),
            text: text.to_string(),
        });
        self.timers
            .arm(CaptionTimer::InterimQuiet, now + self.cfg.interim_quiet());
        // Interim activity also pushes back the global clear, unless the
        // clear is currently deferred behind a translation wait (which will
        // restart it later than now anyway).
        if !self.timers.is_armed(CaptionTimer::TranslationWait) {
            self.timers
                .arm(CaptionTimer::DisplayClear, now + self.cfg.display_clear());
        }
        true
    }

    /// Attaches a translation to the line it addresses.
    ///
    /// The event id is chased through the redirect table first; if that
    /// finds no current line, the newest line catches the translation as
    /// long as it was committed within the wait window. Anything else is
    /// dropped.
    pub fn apply_translation(
        &mut self,
        id: Option<&str>,
        translation: &str,
        target_language: Option<&str>,
        source_language: Option<&str>,
        slot_index: Option<u32>,
        now: Instant,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let translation = translation.trim();
        if translation.is_empty() {
            return false;
        }

        self.aliases.prune(now);
        let resolved = id.map(|raw| self.aliases.resolve(raw, now).to_string());
        let mut target = resolved
            .as_deref()
            .and_then(|rid| self.lines.iter().position(|line| line.id == rid));

        if target.is_none() {
            let wait = self.cfg.translation_wait();
            target = self
                .lines
                .back()
                .filter(|last| now.duration_since(last.created_at) <= wait)
                .map(|_| self.lines.len() - 1);
        }

        let Some(index) = target else {
            tracing::debug!(?id, "dropping translation with no matching line");
            return false;
        };
        let is_last = index + 1 == self.lines.len();

        let slot = match slot_index {
            Some(i) => TranslationSlot::Index(i),
            None => TranslationSlot::Language(
                target_language.map(normalize_language).unwrap_or_default(),
            ),
        };

        let Some(line) = self.lines.get_mut(index) else {
            return false;
        };
        let was_awaiting = line.awaiting_translations();
        line.translations.insert(
            slot,
            Translation {
                text: translation.to_string(),
                source_language: source_language.map(str::to_string),
                target_language: target_language.map(str::to_string),
            },
        );

        // Once the newest line has everything it announced, stop waiting
        // and start the clear countdown right away.
        if is_last && was_awaiting && !line.awaiting_translations() {
            self.timers.cancel(CaptionTimer::TranslationWait);
            self.timers
                .arm(CaptionTimer::DisplayClear, now + self.cfg.display_clear());
        }
        true
    }

    /// Fires any due timers. Returns whether visible state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for timer in self.timers.take_due(now) {
            match timer {
                CaptionTimer::Expiry => {
                    let before = self.lines.len();
                    self.lines
                        .retain(|line| line.expires_at.is_none_or(|at| at > now));
                    if self.lines.len() != before {
                        changed = true;
                    }
                    self.recompute_expiries();
                }
                CaptionTimer::InterimQuiet => {
                    changed |= self.interim.take().is_some();
                }
                CaptionTimer::TranslationWait => {
                    // The wait lapsed unfulfilled; the clear countdown
                    // starts from here instead.
                    self.timers
                        .arm(CaptionTimer::DisplayClear, now + self.cfg.display_clear());
                }
                CaptionTimer::DisplayClear => {
                    changed |= self.clear();
                }
            }
        }
        changed
    }

    /// Clears every line and the provisional slot.
    ///
    /// Redirects are left to age out on their own so that a translation
    /// racing the clear still resolves to a (now gone) line id instead of
    /// mis-attaching.
    pub fn clear(&mut self) -> bool {
        let had_content = !self.is_empty();
        self.lines.clear();
        self.interim = None;
        self.timers.clear();
        had_content
    }

    /// Enables or disables the feature.
    ///
    /// Disabling tears everything down synchronously, redirects included;
    /// no timer survives to resurrect state later.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        if !enabled {
            self.clear();
            self.aliases.clear();
        }
        true
    }

    pub fn snapshot(&self) -> CaptionsSnapshot {
        CaptionsSnapshot {
            enabled: self.enabled,
            lines: self
                .lines
                .iter()
                .map(|line| LineSnapshot {
                    id: line.id.clone(),
                    text: line.text.clone(),
                    expected_translations: line.expected_translations,
                    translations: line
                        .translations
                        .iter()
                        .map(|(slot, t)| TranslationSnapshot {
                            slot: match slot {
                                TranslationSlot::Index(i) => i.to_string(),
                                TranslationSlot::Language(l) => l.clone(),
                            },
                            text: t.text.clone(),
                            target_language: t.target_language.clone(),
                        })
                        .collect(),
                })
                .collect(),
            interim: self.interim.as_ref().map(|i| i.text.clone()),
        }
    }

    /// Restarts the post-commit schedule: translation wait or clear
    /// countdown, plus per-line expiries.
    fn schedule_after_commit(&mut self, now: Instant) {
        self.timers.cancel(CaptionTimer::TranslationWait);
        if self
            .lines
            .back()
            .is_some_and(CaptionLine::awaiting_translations)
        {
            self.timers
                .arm(CaptionTimer::TranslationWait, now + self.cfg.translation_wait());
            self.timers.cancel(CaptionTimer::DisplayClear);
        } else {
            self.timers
                .arm(CaptionTimer::DisplayClear, now + self.cfg.display_clear());
        }
        self.recompute_expiries();
    }

    /// Reassigns every line's `expires_at` from its position and re-arms
    /// the single expiry check at the minimum.
    ///
    /// The newest line uses the last-line TTL (`None` meaning it never
    /// expires on its own); earlier lines use the default TTL. A line that
    /// announced translations keeps at least the wait window so a slow
    /// translation cannot be expired away before it can be shown.
    fn recompute_expiries(&mut self) {
        let default_ttl = self.cfg.line_ttl();
        let last_ttl = self.cfg.last_line_ttl();
        let wait = self.cfg.translation_wait();
        let len = self.lines.len();

        for (i, line) in self.lines.iter_mut().enumerate() {
            let base = if i + 1 == len {
                last_ttl
            } else {
                Some(default_ttl)
            };
            line.expires_at = base.map(|ttl| {
                let ttl = if line.expected_translations > 0 {
                    ttl.max(wait)
                } else {
                    ttl
                };
                line.created_at + ttl
            });
        }

        match self.lines.iter().filter_map(|line| line.expires_at).min() {
            Some(at) => self.timers.arm(CaptionTimer::Expiry, at),
            None => {
                self.timers.cancel(CaptionTimer::Expiry);
            }
        }
    }
}

fn normalize_language(lang: &str) -> String {
    lang.trim().to_ascii_lowercase()
}
