//! Buzzer and LED policy.
//!
//! The confirmation chirp is a fixed sequence of (tone, duration) steps played
//! back against elapsed time, so the control cycle never blocks on it. The
//! siren is a four-phase high/low pattern re-derived every tick from the time
//! since the trigger episode began.

use crate::intent::SoundCue;

pub const SIREN_HIGH_HZ: u32 = 2500;
pub const SIREN_LOW_HZ: u32 = 1500;
pub const SIREN_PHASE_MS: u64 = 200;

pub const SELF_TEST_HZ: u32 = 2000;
pub const SELF_TEST_MS: u64 = 100;

/// Arm confirmation: beep, gap, beep, gap, long high beep.
pub const CHIRP_STEPS: [(Option<u32>, u64); 5] = [
    (Some(2000), 200),
    (None, 200),
    (Some(2000), 200),
    (None, 200),
    (Some(2500), 400),
];

/// Total chirp length in ms.
pub fn chirp_len_ms() -> u64 {
    CHIRP_STEPS.iter().map(|(_, d)| d).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerOutput {
    Off,
    Tone(u32),
}

/// Siren frequency for a point in the episode: phases 0 and 2 high, 1 and 3 low.
#[inline]
pub fn siren_tone(elapsed_ms: u64) -> u32 {
    match (elapsed_ms / SIREN_PHASE_MS) % 4 {
        0 | 2 => SIREN_HIGH_HZ,
        _ => SIREN_LOW_HZ,
    }
}

/// Chirp output `elapsed_ms` after it started, or `None` once finished.
pub fn chirp_output(elapsed_ms: u64) -> Option<BuzzerOutput> {
    let mut edge = 0u64;
    for (tone, dur) in CHIRP_STEPS {
        edge += dur;
        if elapsed_ms < edge {
            return Some(tone.map_or(BuzzerOutput::Off, BuzzerOutput::Tone));
        }
    }
    None
}

#[derive(Debug, Default, Clone)]
pub struct Annunciator {
    chirp_started_ms: Option<u64>,
    siren_elapsed_ms: Option<u64>,
    led: bool,
}

impl Annunciator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one sound cue emitted during the current tick.
    pub fn cue(&mut self, cue: SoundCue, now_ms: u64) {
        match cue {
            SoundCue::Chirp => {
                self.chirp_started_ms = Some(now_ms);
            }
            SoundCue::Siren { elapsed_ms } => {
                self.chirp_started_ms = None;
                self.siren_elapsed_ms = Some(elapsed_ms);
            }
            SoundCue::Silence => {
                self.chirp_started_ms = None;
                self.siren_elapsed_ms = None;
            }
        }
    }

    pub fn set_led(&mut self, on: bool) {
        self.led = on;
    }

    pub fn led(&self) -> bool {
        self.led
    }

    pub fn chirp_active(&self) -> bool {
        self.chirp_started_ms.is_some()
    }

    /// Buzzer output for this tick. Siren cues only last one tick.
    pub fn resolve(&mut self, now_ms: u64) -> BuzzerOutput {
        if let Some(elapsed) = self.siren_elapsed_ms.take() {
            return BuzzerOutput::Tone(siren_tone(elapsed));
        }
        if let Some(started) = self.chirp_started_ms {
            match chirp_output(now_ms.saturating_sub(started)) {
                Some(out) => return out,
                None => {
                    tracing::debug!("confirmation chirp finished");
                    self.chirp_started_ms = None;
                }
            }
        }
        BuzzerOutput::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siren_alternates_high_low() {
        let tones: Vec<u32> = (0..8).map(|i| siren_tone(i * SIREN_PHASE_MS)).collect();
        assert_eq!(
            tones,
            vec![2500, 1500, 2500, 1500, 2500, 1500, 2500, 1500]
        );
        assert_eq!(siren_tone(199), SIREN_HIGH_HZ);
        assert_eq!(siren_tone(200), SIREN_LOW_HZ);
    }

    #[test]
    fn chirp_sequence_timing() {
        assert_eq!(chirp_len_ms(), 1200);
        assert_eq!(chirp_output(0), Some(BuzzerOutput::Tone(2000)));
        assert_eq!(chirp_output(250), Some(BuzzerOutput::Off));
        assert_eq!(chirp_output(450), Some(BuzzerOutput::Tone(2000)));
        assert_eq!(chirp_output(700), Some(BuzzerOutput::Off));
        assert_eq!(chirp_output(900), Some(BuzzerOutput::Tone(2500)));
        assert_eq!(chirp_output(1199), Some(BuzzerOutput::Tone(2500)));
        assert_eq!(chirp_output(1200), None);
    }

    #[test]
    fn chirp_plays_out_then_stops() {
        let mut a = Annunciator::new();
        a.cue(SoundCue::Chirp, 1000);
        assert_eq!(a.resolve(1000), BuzzerOutput::Tone(2000));
        assert_eq!(a.resolve(1300), BuzzerOutput::Off);
        assert!(a.chirp_active());
        assert_eq!(a.resolve(2300), BuzzerOutput::Off);
        assert!(!a.chirp_active());
    }

    #[test]
    fn siren_preempts_chirp_and_lasts_one_tick() {
        let mut a = Annunciator::new();
        a.cue(SoundCue::Chirp, 0);
        a.cue(SoundCue::Siren { elapsed_ms: 250 }, 100);
        assert_eq!(a.resolve(100), BuzzerOutput::Tone(SIREN_LOW_HZ));
        assert!(!a.chirp_active());
        assert_eq!(a.resolve(200), BuzzerOutput::Off);
    }

    #[test]
    fn silence_cancels_everything() {
        let mut a = Annunciator::new();
        a.cue(SoundCue::Chirp, 0);
        a.cue(SoundCue::Silence, 50);
        assert_eq!(a.resolve(50), BuzzerOutput::Off);
        assert!(!a.chirp_active());
    }
}
