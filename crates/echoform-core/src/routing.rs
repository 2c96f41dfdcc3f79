//! Branch selection and parallel mixing.
//!
//! Mute and bypass never stop a stage. Both branches are computed every
//! sample and [`select_branch`] picks one, so the muted stage's state stays
//! current for when it comes back.
//!
//! [`ParallelMix`] sums a dry tap and `N` wet returns with independent
//! gains. The gains are applied literally: they may sum past unity and are
//! never normalized.

use crate::frame::Frame;

/// Pick `bypass` when `muted`, otherwise `active`.
#[inline]
pub fn select_branch(active: f32, bypass: f32, muted: bool) -> f32 {
    if muted { bypass } else { active }
}

/// Frame version of [`select_branch`].
#[inline]
pub fn select_frame(active: Frame, bypass: Frame, muted: bool) -> Frame {
    if muted { bypass } else { active }
}

/// Weighted sum of a dry signal and `N` wet returns.
///
/// ```rust
/// use echoform_core::ParallelMix;
///
/// let mix = ParallelMix { dry: 0.6, wet: [0.6, 0.6] };
/// // 0.6 + 0.6·0.5 + 0.6·0.25, gains sum to 1.8 and stay that way
/// assert!((mix.mix(1.0, [0.5, 0.25]) - 1.05).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallelMix<const N: usize> {
    /// Dry gain.
    pub dry: f32,
    /// One gain per wet return.
    pub wet: [f32; N],
}

impl<const N: usize> ParallelMix<N> {
    /// Unity dry, silent returns.
    pub const fn dry_only() -> Self {
        Self {
            dry: 1.0,
            wet: [0.0; N],
        }
    }

    /// `dry·g_dry + Σ wet_i·g_i`.
    #[inline]
    pub fn mix(&self, dry: f32, wet: [f32; N]) -> f32 {
        let mut sum = dry * self.dry;
        for (x, g) in wet.iter().zip(&self.wet) {
            sum += x * g;
        }
        sum
    }

    /// [`mix`](Self::mix) applied per channel.
    #[inline]
    pub fn mix_frame(&self, dry: Frame, wet: [Frame; N]) -> Frame {
        Frame::new(
            self.mix(dry.left, wet.map(|f| f.left)),
            self.mix(dry.right, wet.map(|f| f.right)),
        )
    }
}

impl<const N: usize> Default for ParallelMix<N> {
    fn default() -> Self {
        Self::dry_only()
    }
}
