//! Play clock with pause and one-second pause fades.
//!
//! The fade level runs from 0 to [`FADE_STEPS`]. Fading out ends in the paused
//! state with the level back at full; fading in unpauses immediately. Turning a
//! running fade around mirrors its start time so the level stays continuous.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use super::KeyOutcome;

pub const FADE_STEPS: u8 = 64;
const FADE_TIME: Duration = Duration::from_secs(1);

pub const PAUSE_KEYS: &[(&str, &str)] = &[
    ("p", "Start/stop pause with fade"),
    ("P", "Start/stop pause with fade"),
    ("Ctrl-P", "Start/stop pause"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    None,
    In,
    Out,
}

#[derive(Debug, Clone)]
pub struct Transport {
    started: Instant,
    paused_at: Option<Instant>,
    fade: Fade,
    fade_start: Instant,
    level: u8,
}

fn fade_steps(elapsed: Duration) -> u8 {
    let steps = elapsed.as_millis() * u128::from(FADE_STEPS) / FADE_TIME.as_millis();
    steps.min(u128::from(FADE_STEPS)) as u8
}

impl Transport {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            paused_at: None,
            fade: Fade::None,
            fade_start: now,
            level: FADE_STEPS,
        }
    }

    /// Play time excluding paused stretches.
    pub fn play_time(&self, now: Instant) -> Duration {
        self.paused_at
            .unwrap_or(now)
            .saturating_duration_since(self.started)
    }

    /// Start the clock over, keeping the pause state.
    pub fn restart(&mut self, now: Instant) {
        self.started = now;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    fn resume_clock(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            let paused_for = now.saturating_duration_since(at);
            self.started = self.started.checked_add(paused_for).unwrap_or(now);
        }
    }

    /// `p`: start a fade, or turn the running one around.
    pub fn toggle_fade(&mut self, now: Instant) {
        let mut paused = self.is_paused();
        self.resume_clock(now);

        match self.fade {
            Fade::None => self.fade_start = now,
            running => {
                if running == Fade::Out {
                    paused = true;
                }
                let elapsed = now.saturating_duration_since(self.fade_start).min(FADE_TIME);
                self.fade_start = now.checked_sub(FADE_TIME - elapsed).unwrap_or(now);
            }
        }

        self.fade = if paused { Fade::In } else { Fade::Out };
    }

    /// `Ctrl-P`: pause or resume at once, dropping any fade.
    pub fn toggle_pause(&mut self, now: Instant) {
        self.fade = Fade::None;
        self.level = FADE_STEPS;
        if self.is_paused() {
            self.resume_clock(now);
        } else {
            self.paused_at = Some(now);
        }
    }

    /// Advance a running fade.
    pub fn update(&mut self, now: Instant) {
        let steps = fade_steps(now.saturating_duration_since(self.fade_start));
        match self.fade {
            Fade::None => {}
            Fade::In => {
                self.level = steps;
                if steps >= FADE_STEPS {
                    self.fade = Fade::None;
                }
            }
            Fade::Out => {
                let level = FADE_STEPS - steps;
                if level == 0 {
                    self.fade = Fade::None;
                    self.paused_at = Some(now);
                    self.level = FADE_STEPS;
                } else {
                    self.level = level;
                }
            }
        }
    }

    pub fn process_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('p') | KeyCode::Char('P') if ctrl => self.toggle_pause(now),
            KeyCode::Char('p') | KeyCode::Char('P') => self.toggle_fade(now),
            _ => return KeyOutcome::Unhandled,
        }
        KeyOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fade_out_ends_paused() {
        let t0 = Instant::now();
        let mut transport = Transport::new(t0);

        transport.toggle_fade(t0 + ms(1000));
        assert_eq!(transport.fade(), Fade::Out);

        transport.update(t0 + ms(1500));
        assert_eq!(transport.level(), 32);
        assert!(!transport.is_paused());

        transport.update(t0 + ms(2000));
        assert!(transport.is_paused());
        assert_eq!(transport.fade(), Fade::None);
        assert_eq!(transport.level(), FADE_STEPS);
        assert_eq!(transport.play_time(t0 + ms(5000)), ms(2000));
    }

    #[test]
    fn test_fade_in_resumes_immediately() {
        let t0 = Instant::now();
        let mut transport = Transport::new(t0);
        transport.toggle_pause(t0 + ms(1000));
        assert_eq!(transport.play_time(t0 + ms(3000)), ms(1000));

        transport.toggle_fade(t0 + ms(3000));
        assert!(!transport.is_paused());
        assert_eq!(transport.fade(), Fade::In);
        assert_eq!(transport.play_time(t0 + ms(3000)), ms(1000));

        transport.update(t0 + ms(3250));
        assert_eq!(transport.level(), 16);
        transport.update(t0 + ms(4000));
        assert_eq!(transport.fade(), Fade::None);
        assert_eq!(transport.level(), FADE_STEPS);
    }

    #[test]
    fn test_reversing_fade_keeps_level_continuous() {
        let t0 = Instant::now();
        let mut transport = Transport::new(t0);

        transport.toggle_fade(t0);
        transport.update(t0 + ms(250));
        assert_eq!(transport.level(), 48);

        transport.toggle_fade(t0 + ms(250));
        assert_eq!(transport.fade(), Fade::In);
        transport.update(t0 + ms(250));
        assert_eq!(transport.level(), 48);

        transport.update(t0 + ms(500));
        assert_eq!(transport.fade(), Fade::None);
    }

    #[test]
    fn test_ctrl_p_cancels_fade() {
        let t0 = Instant::now();
        let mut transport = Transport::new(t0);
        transport.toggle_fade(t0);
        transport.update(t0 + ms(500));

        let key = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(transport.process_key(key, t0 + ms(500)), KeyOutcome::Handled);
        assert!(transport.is_paused());
        assert_eq!(transport.fade(), Fade::None);
        assert_eq!(transport.level(), FADE_STEPS);
    }

    #[test]
    fn test_restart_keeps_pause() {
        let t0 = Instant::now();
        let mut transport = Transport::new(t0);
        transport.toggle_pause(t0 + ms(100));
        transport.restart(t0 + ms(200));
        assert!(transport.is_paused());
        assert_eq!(transport.play_time(t0 + ms(900)), Duration::ZERO);
    }

    #[test]
    fn test_other_keys_unhandled() {
        let mut transport = Transport::new(Instant::now());
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(transport.process_key(key, Instant::now()), KeyOutcome::Unhandled);
    }
}
