//! Tempo conversion and transport tracking for tempo-synced rates.
//!
//! [`milliseconds_for`] is the single conversion every synced control goes
//! through. It rejects non-positive tempi; [`TempoClock`] wraps it and holds
//! on to the last valid BPM so that a bad transport value never turns into a
//! zero or negative delay time.

use libm::floorf;

use crate::error::TempoError;
use crate::param_info::ParamEnum;

/// Musical note divisions for tempo sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoteDivision {
    /// Whole note (4 beats)
    Whole,
    /// Half note (2 beats)
    Half,
    /// Quarter note (1 beat)
    #[default]
    Quarter,
    /// Eighth note (1/2 beat)
    Eighth,
    /// Sixteenth note (1/4 beat)
    Sixteenth,
    /// Thirty-second note (1/8 beat)
    ThirtySecond,
    /// Dotted half note (3 beats)
    DottedHalf,
    /// Dotted quarter note (1.5 beats)
    DottedQuarter,
    /// Dotted eighth note (3/4 beat)
    DottedEighth,
    /// Triplet quarter note (2/3 beat), also called a sixth
    TripletQuarter,
    /// Triplet eighth note (1/3 beat)
    TripletEighth,
    /// Triplet sixteenth note (1/6 beat)
    TripletSixteenth,
}

impl NoteDivision {
    /// Length in quarter-note beats.
    pub fn beats(self) -> f32 {
        match self {
            NoteDivision::Whole => 4.0,
            NoteDivision::Half => 2.0,
            NoteDivision::Quarter => 1.0,
            NoteDivision::Eighth => 0.5,
            NoteDivision::Sixteenth => 0.25,
            NoteDivision::ThirtySecond => 0.125,
            NoteDivision::DottedHalf => 3.0,
            NoteDivision::DottedQuarter => 1.5,
            NoteDivision::DottedEighth => 0.75,
            NoteDivision::TripletQuarter => 2.0 / 3.0,
            NoteDivision::TripletEighth => 1.0 / 3.0,
            NoteDivision::TripletSixteenth => 1.0 / 6.0,
        }
    }

    /// Rate in Hz of one cycle per division at `bpm`.
    ///
    /// ```rust
    /// use echoform_core::NoteDivision;
    ///
    /// // At 120 BPM an eighth note repeats at 4 Hz
    /// let hz = NoteDivision::Eighth.hz_for(120.0).unwrap();
    /// assert!((hz - 4.0).abs() < 1e-4);
    /// ```
    pub fn hz_for(self, bpm: f32) -> Result<f32, TempoError> {
        milliseconds_for(self, bpm).map(|ms| 1000.0 / ms)
    }
}

impl ParamEnum for NoteDivision {
    const LABELS: &'static [&'static str] = &[
        "1/1", "1/2", "1/4", "1/8", "1/16", "1/32", "1/2.", "1/4.", "1/8.", "1/4T", "1/8T", "1/16T",
    ];

    fn from_index(index: usize) -> Option<Self> {
        const ALL: [NoteDivision; 12] = [
            NoteDivision::Whole,
            NoteDivision::Half,
            NoteDivision::Quarter,
            NoteDivision::Eighth,
            NoteDivision::Sixteenth,
            NoteDivision::ThirtySecond,
            NoteDivision::DottedHalf,
            NoteDivision::DottedQuarter,
            NoteDivision::DottedEighth,
            NoteDivision::TripletQuarter,
            NoteDivision::TripletEighth,
            NoteDivision::TripletSixteenth,
        ];
        ALL.get(index).copied()
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Duration of `division` at `bpm`, in milliseconds.
///
/// A quarter note lasts `60000 / bpm`; every other division is an exact
/// multiple of that. Non-positive or non-finite tempi are rejected.
///
/// ```rust
/// use echoform_core::{milliseconds_for, NoteDivision, TempoError};
///
/// assert_eq!(milliseconds_for(NoteDivision::Quarter, 120.0), Ok(500.0));
/// assert_eq!(milliseconds_for(NoteDivision::DottedEighth, 120.0), Ok(375.0));
/// assert_eq!(
///     milliseconds_for(NoteDivision::Quarter, 0.0),
///     Err(TempoError::InvalidTempo(0.0))
/// );
/// ```
pub fn milliseconds_for(division: NoteDivision, bpm: f32) -> Result<f32, TempoError> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(TempoError::InvalidTempo(bpm));
    }
    let quarter = 60000.0 / bpm;
    Ok(quarter * division.beats())
}

/// Host transport snapshot, refreshed once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportInfo {
    /// Tempo in beats per minute. May be fractional.
    pub bpm: f32,
    /// Song position in samples.
    pub position_samples: u64,
    /// Whether the host transport is running.
    pub playing: bool,
}

impl TransportInfo {
    /// A stopped transport at `bpm`, position zero.
    pub fn at_bpm(bpm: f32) -> Self {
        Self {
            bpm,
            ..Self::default()
        }
    }
}

impl Default for TransportInfo {
    fn default() -> Self {
        Self {
            bpm: TempoClock::DEFAULT_BPM,
            position_samples: 0,
            playing: false,
        }
    }
}

/// Tempo state for synced oscillators and delays.
///
/// Always answers with the last valid tempo, so its durations are strictly
/// positive.
///
/// # Example
///
/// ```rust
/// use echoform_core::{NoteDivision, TempoClock, TransportInfo};
///
/// let mut clock = TempoClock::new(48000.0);
/// assert_eq!(clock.update(&TransportInfo::at_bpm(90.0)), Ok(true));
///
/// // A zero tempo is rejected and 90 BPM is kept.
/// assert!(clock.update(&TransportInfo::at_bpm(0.0)).is_err());
/// assert!((clock.duration_ms(NoteDivision::Quarter) - 666.667).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct TempoClock {
    bpm: f32,
    sample_rate: f32,
    position: u64,
}

impl TempoClock {
    /// Tempo assumed until the host reports one.
    pub const DEFAULT_BPM: f32 = 120.0;

    /// Create a clock at the default tempo.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            bpm: Self::DEFAULT_BPM,
            sample_rate,
            position: 0,
        }
    }

    /// Record the transport for the current frame.
    ///
    /// Returns `Ok(true)` when the tempo changed. An invalid tempo is
    /// rejected and the previous one stays in effect; the position is still
    /// taken from the transport.
    pub fn update(&mut self, transport: &TransportInfo) -> Result<bool, TempoError> {
        self.position = transport.position_samples;
        milliseconds_for(NoteDivision::Quarter, transport.bpm)?;
        let changed = transport.bpm != self.bpm;
        self.bpm = transport.bpm;
        Ok(changed)
    }

    /// Set the sample rate and rewind.
    pub fn reset(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.position = 0;
    }

    /// Last valid tempo.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Duration of `division` at the last valid tempo.
    pub fn duration_ms(&self, division: NoteDivision) -> f32 {
        60000.0 / self.bpm * division.beats()
    }

    /// Rate in Hz of `division` at the last valid tempo.
    pub fn rate_hz(&self, division: NoteDivision) -> f32 {
        1000.0 / self.duration_ms(division)
    }

    /// Duration of `division` in samples.
    pub fn duration_samples(&self, division: NoteDivision) -> f32 {
        self.duration_ms(division) * self.sample_rate / 1000.0
    }

    /// Song position in beats.
    pub fn beat_position(&self) -> f32 {
        let samples_per_beat = self.sample_rate * 60.0 / self.bpm;
        self.position as f32 / samples_per_beat
    }

    /// Fractional position inside the current beat, 0.0 to 1.0.
    pub fn beat_phase(&self) -> f32 {
        let pos = self.beat_position();
        pos - floorf(pos)
    }
}

impl Default for TempoClock {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_at_common_tempi() {
        assert_eq!(milliseconds_for(NoteDivision::Quarter, 120.0), Ok(500.0));
        assert_eq!(milliseconds_for(NoteDivision::Quarter, 60.0), Ok(1000.0));
        let ms = milliseconds_for(NoteDivision::Quarter, 93.5).unwrap();
        assert!((ms - 641.711).abs() < 0.01);
    }

    #[test]
    fn derived_divisions_at_120() {
        let ms = |d| milliseconds_for(d, 120.0).unwrap();
        assert_eq!(ms(NoteDivision::Eighth), 250.0);
        assert_eq!(ms(NoteDivision::Sixteenth), 125.0);
        assert_eq!(ms(NoteDivision::DottedQuarter), 750.0);
        assert!((ms(NoteDivision::TripletEighth) - 166.667).abs() < 0.01);
        assert!((ms(NoteDivision::TripletQuarter) - 333.333).abs() < 0.01);
    }

    #[test]
    fn invalid_tempi_rejected() {
        for bpm in [0.0, -10.0, f32::NAN, f32::INFINITY] {
            assert!(milliseconds_for(NoteDivision::Quarter, bpm).is_err(), "{bpm}");
        }
    }

    #[test]
    fn rate_is_inverse_of_duration() {
        assert!((NoteDivision::Quarter.hz_for(120.0).unwrap() - 2.0).abs() < 1e-5);
        assert!((NoteDivision::Sixteenth.hz_for(120.0).unwrap() - 8.0).abs() < 1e-5);
    }

    #[test]
    fn clock_keeps_last_valid_bpm() {
        let mut clock = TempoClock::new(48000.0);
        assert_eq!(clock.update(&TransportInfo::at_bpm(140.0)), Ok(true));
        assert_eq!(clock.update(&TransportInfo::at_bpm(140.0)), Ok(false));
        assert_eq!(
            clock.update(&TransportInfo::at_bpm(-1.0)),
            Err(TempoError::InvalidTempo(-1.0))
        );
        assert_eq!(clock.bpm(), 140.0);
        assert!(clock.duration_ms(NoteDivision::Eighth) > 0.0);
    }

    #[test]
    fn clock_quarter_in_samples() {
        let clock = TempoClock::new(48000.0);
        assert!((clock.duration_samples(NoteDivision::Quarter) - 24000.0).abs() < 0.01);
    }

    #[test]
    fn beat_position_follows_transport() {
        let mut clock = TempoClock::new(48000.0);
        let transport = TransportInfo {
            bpm: 120.0,
            position_samples: 36000,
            playing: true,
        };
        clock.update(&transport).unwrap();
        assert!((clock.beat_position() - 1.5).abs() < 1e-4);
        assert!((clock.beat_phase() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn division_labels_cover_every_variant() {
        assert_eq!(NoteDivision::LABELS.len(), 12);
        for i in 0..NoteDivision::LABELS.len() {
            let div = NoteDivision::from_index(i).unwrap();
            assert_eq!(div.index(), i);
        }
        assert_eq!(NoteDivision::from_value(2.0), NoteDivision::Quarter);
    }
}
