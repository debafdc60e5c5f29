//! Post-processing filter state.
//!
//! The renderer applies one colour filter over the scene, blended in by a
//! mix ratio, followed by a white-out/black-out fade. This module keeps the
//! values the directing code sets.

use crate::sinks::{FilterKind, FilterSink};

#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    kind: FilterKind,
    /// `[0, 1]` blend of the filtered image.
    mix_ratio: f32,
    /// `[-1, 1]`: positive fades to white, negative to black.
    white_out_intensity: f32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            kind: FilterKind::None,
            mix_ratio: 0.0,
            white_out_intensity: 0.0,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn mix_ratio(&self) -> f32 {
        self.mix_ratio
    }

    pub fn white_out_intensity(&self) -> f32 {
        self.white_out_intensity
    }

    /// Back to the unfiltered image.
    pub fn reset(&mut self) {
        *self = FilterState::default();
    }
}

impl FilterSink for FilterState {
    fn set_filter_kind(&mut self, kind: FilterKind) {
        if self.kind != kind {
            log::debug!("Filter {:?} -> {:?}", self.kind, kind);
            self.kind = kind;
        }
    }

    fn set_filter_mix_ratio(&mut self, ratio: f32) {
        self.mix_ratio = ratio.clamp(0.0, 1.0);
    }

    fn set_white_out_intensity(&mut self, intensity: f32) {
        self.white_out_intensity = intensity.clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_clamped() {
        let mut filter = FilterState::new();
        filter.set_filter_mix_ratio(1.05);
        assert_eq!(filter.mix_ratio(), 1.0);
        filter.set_white_out_intensity(-2.0);
        assert_eq!(filter.white_out_intensity(), -1.0);
    }

    #[test]
    fn test_reset() {
        let mut filter = FilterState::new();
        filter.set_filter_kind(FilterKind::Sepia);
        filter.set_filter_mix_ratio(0.5);
        filter.set_white_out_intensity(-0.25);

        filter.reset();
        assert_eq!(filter, FilterState::default());
        assert_eq!(filter.kind(), FilterKind::None);
    }
}
