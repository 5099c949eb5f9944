//! Magnitude-frequency distributions (C2).
//!
//! Every MFD family ultimately produces an ordered `Vec<(magnitude, rate)>`
//! pair sequence with strictly increasing magnitudes; rate-zero bins are
//! retained because downstream floating/rupture-building loops rely on
//! index alignment with the bin edges.

use crate::error::{HazardError, HazardResult};

/// A single (magnitude, annual-rate) bin.
pub type MfdBin = (f64, f64);

/// Common contract for all magnitude-frequency distribution families.
pub trait Mfd: Send + Sync {
    /// The ordered (M, rate) sequence this MFD represents. Magnitudes are
    /// strictly increasing; rate may be zero but never negative.
    fn bins(&self) -> Vec<MfdBin>;

    /// Total annual rate across all bins (Σ rate).
    fn total_rate(&self) -> f64 {
        self.bins().iter().map(|(_, r)| r).sum()
    }
}

/// Explicit (M, rate) pairs — the identity MFD.
#[derive(Debug, Clone)]
pub struct IncrementalMfd {
    bins: Vec<MfdBin>,
}

impl IncrementalMfd {
    pub fn try_new(bins: Vec<MfdBin>) -> HazardResult<Self> {
        validate_bins(&bins)?;
        Ok(Self { bins })
    }
}

impl Mfd for IncrementalMfd {
    fn bins(&self) -> Vec<MfdBin> {
        self.bins.clone()
    }
}

fn validate_bins(bins: &[MfdBin]) -> HazardResult<()> {
    if bins.is_empty() {
        return Err(HazardError::InputValidation(
            "MFD must have at least one bin".to_string(),
        ));
    }
    if bins.windows(2).any(|w| w[1].0 <= w[0].0) {
        return Err(HazardError::InputValidation(
            "MFD magnitudes must be strictly increasing".to_string(),
        ));
    }
    if bins.iter().any(|(_, r)| *r < 0.0) {
        return Err(HazardError::InputValidation(
            "MFD rates must be non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Truncated Gutenberg-Richter: `log10(rate) = a - b*M`, binned at
/// `bin_width` from `m_min` to `m_max` inclusive, clipped at `m_max`.
#[derive(Debug, Clone, Copy)]
pub struct GutenbergRichterMfd {
    pub a: f64,
    pub b: f64,
    pub m_min: f64,
    pub m_max: f64,
    pub bin_width: f64,
}

impl Mfd for GutenbergRichterMfd {
    fn bins(&self) -> Vec<MfdBin> {
        if self.bin_width <= 0.0 || self.m_max <= self.m_min {
            return Vec::new();
        }
        let n_bins = (((self.m_max - self.m_min) / self.bin_width).round() as usize).max(1);
        let mut bins = Vec::with_capacity(n_bins);
        for i in 0..n_bins {
            let m_lo = self.m_min + i as f64 * self.bin_width;
            let m_hi = (m_lo + self.bin_width).min(self.m_max);
            let m_center = (m_lo + m_hi) / 2.0;
            // Rate for this bin = cumulative rate at m_lo minus cumulative
            // rate at m_hi (the standard truncated-exponential binning).
            let rate_lo = 10f64.powf(self.a - self.b * m_lo);
            let rate_hi = 10f64.powf(self.a - self.b * m_hi);
            let rate = (rate_lo - rate_hi).max(0.0);
            bins.push((m_center, rate));
        }
        bins
    }
}

/// A single characteristic-magnitude bin: all the MFD's moment release
/// happens at one magnitude. The rate may come directly or be derived
/// moment-balance elsewhere (that derivation is a model-loading concern,
/// out of scope per §1; this type just carries the resolved rate).
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicMfd {
    pub magnitude: f64,
    pub rate: f64,
}

impl Mfd for CharacteristicMfd {
    fn bins(&self) -> Vec<MfdBin> {
        vec![(self.magnitude, self.rate.max(0.0))]
    }
}

/// Youngs & Coppersmith (1985) characteristic + exponential-tail MFD.
///
/// `b_value`/`a_value` describe the exponential tail from `m_min` to
/// `m_char - delta_m1`; the characteristic "box" spans
/// `[m_char - delta_m1, m_char + delta_m2]` at a uniform rate-density
/// chosen so the box absorbs `char_rate` total events/yr.
#[derive(Debug, Clone, Copy)]
pub struct YoungsCoppersmithMfd {
    pub a_value: f64,
    pub b_value: f64,
    pub m_min: f64,
    pub m_char: f64,
    pub delta_m1: f64,
    pub delta_m2: f64,
    pub char_rate: f64,
    pub bin_width: f64,
}

impl Mfd for YoungsCoppersmithMfd {
    fn bins(&self) -> Vec<MfdBin> {
        let mut bins = Vec::new();
        let tail_max = self.m_char - self.delta_m1;
        if self.bin_width <= 0.0 {
            return bins;
        }

        if tail_max > self.m_min {
            let tail = GutenbergRichterMfd {
                a: self.a_value,
                b: self.b_value,
                m_min: self.m_min,
                m_max: tail_max,
                bin_width: self.bin_width,
            };
            bins.extend(tail.bins());
        }

        let box_lo = self.m_char - self.delta_m1;
        let box_hi = self.m_char + self.delta_m2;
        let n_box_bins = (((box_hi - box_lo) / self.bin_width).round() as usize).max(1);
        let rate_per_bin = self.char_rate / n_box_bins as f64;
        for i in 0..n_box_bins {
            let m_lo = box_lo + i as f64 * self.bin_width;
            let m_hi = (m_lo + self.bin_width).min(box_hi);
            bins.push(((m_lo + m_hi) / 2.0, rate_per_bin));
        }
        bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auxilary::approx_equal;

    #[test]
    fn incremental_preserves_pairs() {
        let mfd = IncrementalMfd::try_new(vec![(5.0, 0.01), (6.0, 0.0), (7.0, 0.001)]).unwrap();
        assert_eq!(mfd.bins().len(), 3);
        assert!(approx_equal(mfd.total_rate(), 0.011, 1e-12));
    }

    #[test]
    fn incremental_rejects_non_monotonic_magnitudes() {
        assert!(IncrementalMfd::try_new(vec![(6.0, 0.01), (5.0, 0.01)]).is_err());
    }

    #[test]
    fn gr_bins_sum_to_cumulative_difference() {
        let gr = GutenbergRichterMfd {
            a: 4.0,
            b: 1.0,
            m_min: 5.0,
            m_max: 7.0,
            bin_width: 0.1,
        };
        let bins = gr.bins();
        assert_eq!(bins.len(), 20);
        let total: f64 = bins.iter().map(|(_, r)| r).sum();
        let expected = 10f64.powf(4.0 - 5.0) - 10f64.powf(4.0 - 7.0);
        assert!(approx_equal(total, expected, 1e-9));
    }

    #[test]
    fn gr_rates_are_decreasing() {
        let gr = GutenbergRichterMfd {
            a: 4.0,
            b: 1.0,
            m_min: 5.0,
            m_max: 7.0,
            bin_width: 0.1,
        };
        let bins = gr.bins();
        assert!(bins.windows(2).all(|w| w[1].1 <= w[0].1));
    }

    #[test]
    fn youngs_coppersmith_box_absorbs_char_rate() {
        let yc = YoungsCoppersmithMfd {
            a_value: 3.0,
            b_value: 0.9,
            m_min: 5.0,
            m_char: 7.0,
            delta_m1: 0.5,
            delta_m2: 0.25,
            char_rate: 0.01,
            bin_width: 0.1,
        };
        let bins = yc.bins();
        let box_total: f64 = bins
            .iter()
            .filter(|(m, _)| *m >= yc.m_char - yc.delta_m1)
            .map(|(_, r)| r)
            .sum();
        assert!(approx_equal(box_total, 0.01, 1e-9));
    }

    #[test]
    fn characteristic_single_bin() {
        let c = CharacteristicMfd {
            magnitude: 7.5,
            rate: 5e-4,
        };
        assert_eq!(c.bins(), vec![(7.5, 5e-4)]);
    }
}
