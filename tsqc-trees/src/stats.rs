//! Site-based population genetic statistics.
//!
//! All statistics are computed from the allele counts of each site among the
//! samples, as in tskit's `mode="site"`. Windowed statistics are normalized by
//! window span, except for Tajima's D which is a ratio.

use crate::{Error, TreeSequence};
use std::collections::BTreeMap;

/// Allele counts among the samples at one site.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteAlleles {
    pub site: usize,
    pub position: f64,
    /// Number of samples carrying the ancestral state.
    pub ancestral: u32,
    /// Number of samples carrying each derived state, by state.
    pub derived: BTreeMap<String, u32>,
}

impl SiteAlleles {
    /// Returns `true` if more than one allele is present among the samples.
    pub fn is_segregating(&self) -> bool {
        let present = (self.ancestral > 0) as usize + self.derived.values().filter(|c| **c > 0).count();
        present > 1
    }

    /// Probability that two samples drawn without replacement differ at this site.
    pub fn pairwise_diversity(&self, num_samples: u32) -> f64 {
        let n = num_samples as f64;
        if num_samples < 2 {
            return f64::NAN;
        }
        let squares: f64 = std::iter::once(self.ancestral)
            .chain(self.derived.values().copied())
            .map(|c| (c as f64).powi(2))
            .sum();
        (n * n - squares) / (n * (n - 1.0))
    }
}

impl TreeSequence {
    /// Allele counts of every site.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// let alleles = ts.site_alleles();
    /// // the second mutation at the last site reverts to the ancestral state
    /// assert_eq!(alleles[3].ancestral, 3);
    /// assert_eq!(alleles[3].derived["C"], 1);
    /// ```
    pub fn site_alleles(&self) -> Vec<SiteAlleles> {
        self.site_alleles_from(&self.mutation_sample_counts())
    }

    /// Allele counts of every site, given the number of samples inheriting each mutation.
    pub fn site_alleles_from(&self, counts: &[u32]) -> Vec<SiteAlleles> {
        let tables = self.tables();
        let num_samples = self.num_samples() as u32;

        (0..self.num_sites())
            .map(|site| {
                let ancestral_state = tables.sites.ancestral_state.get_str(site).unwrap_or_default();
                let mutated: u32 = self.site_mutations(site).map(|m| counts[m]).sum();
                let mut ancestral = num_samples.saturating_sub(mutated);
                let mut derived: BTreeMap<String, u32> = BTreeMap::new();
                for m in self.site_mutations(site) {
                    let state = tables.mutations.derived_state.get_str(m).unwrap_or_default();
                    // a reversion hands its samples back to the ancestral allele
                    match state == ancestral_state {
                        true => ancestral += counts[m],
                        false => *derived.entry(state.into_owned()).or_default() += counts[m],
                    }
                }
                SiteAlleles { site, position: tables.sites.position[site], ancestral, derived }
            })
            .collect()
    }

    /// Site statistics over the allele counts of every site, traversing the trees once.
    pub fn site_stats(&self) -> SiteStats {
        self.site_stats_from(&self.mutation_sample_counts())
    }

    /// Site statistics from precomputed per-mutation sample counts.
    pub fn site_stats_from(&self, counts: &[u32]) -> SiteStats {
        SiteStats {
            alleles: self.site_alleles_from(counts),
            num_samples: self.num_samples() as u32,
            sequence_length: self.sequence_length(),
        }
    }

    /// Mean pairwise sequence diversity in each window, per unit of sequence length.
    ///
    /// ## Arguments
    ///
    /// - `windows` - Window breakpoints, from `0` to the sequence length.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// let pi = ts.diversity(&[0.0, 10.0])?;
    /// assert!((pi[0] - 13.0 / 60.0).abs() < 1e-12);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn diversity(&self, windows: &[f64]) -> Result<Vec<f64>, Error> {
        self.site_stats().diversity(windows)
    }

    /// Density of segregating sites in each window, per unit of sequence length.
    pub fn segregating_sites(&self, windows: &[f64]) -> Result<Vec<f64>, Error> {
        self.site_stats().segregating_sites(windows)
    }

    /// Tajima's D in each window, NaN where it is undefined.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// let d = ts.tajimas_d(&[0.0, 10.0])?;
    /// assert!((d[0] - -0.06501024948259031).abs() < 1e-9);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn tajimas_d(&self, windows: &[f64]) -> Result<Vec<f64>, Error> {
        self.site_stats().tajimas_d(windows)
    }

    /// Unfolded allele frequency spectrum: element `k` counts derived alleles carried by `k` samples.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// assert_eq!(ts.allele_frequency_spectrum(), [0, 2, 1, 1, 0]);
    /// ```
    pub fn allele_frequency_spectrum(&self) -> Vec<u64> {
        self.site_stats().allele_frequency_spectrum()
    }

    /// Returns `count` equal windows covering the genome.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// assert_eq!(ts.equal_windows(2), [0.0, 5.0, 10.0]);
    /// ```
    pub fn equal_windows(&self, count: usize) -> Vec<f64> {
        let count = count.max(1);
        let length = self.sequence_length();
        (0..=count)
            .map(|i| match i == count {
                true => length,
                false => length * i as f64 / count as f64,
            })
            .collect()
    }
}

/// Allele counts of every site, ready for any number of windowed statistics.
///
/// ## Examples
///
/// ```rust
/// let ts = tsqc_trees::examples::example_1();
/// let stats = ts.site_stats();
/// let windows = ts.equal_windows(2);
/// assert_eq!(stats.diversity(&windows)?.len(), 2);
/// assert_eq!(stats.allele_frequency_spectrum(), [0, 2, 1, 1, 0]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SiteStats {
    pub alleles: Vec<SiteAlleles>,
    pub num_samples: u32,
    pub sequence_length: f64,
}

impl SiteStats {
    /// Mean pairwise sequence diversity in each window, per unit of sequence length.
    pub fn diversity(&self, windows: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_windows(windows)?;
        let n = self.num_samples;
        Ok(self
            .window_sums(windows, |a| a.pairwise_diversity(n))
            .into_iter()
            .zip(spans(windows))
            .map(|(sum, span)| sum / span)
            .collect())
    }

    /// Density of segregating sites in each window, per unit of sequence length.
    pub fn segregating_sites(&self, windows: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_windows(windows)?;
        Ok(self
            .window_sums(windows, |a| a.is_segregating() as u32 as f64)
            .into_iter()
            .zip(spans(windows))
            .map(|(sum, span)| sum / span)
            .collect())
    }

    /// Tajima's D in each window, NaN where it is undefined.
    pub fn tajimas_d(&self, windows: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_windows(windows)?;
        let n = self.num_samples;
        let pi = self.window_sums(windows, |a| a.pairwise_diversity(n));
        let segregating = self.window_sums(windows, |a| a.is_segregating() as u32 as f64);
        Ok(pi.into_iter().zip(segregating).map(|(t, s)| tajimas_d(n, t, s)).collect())
    }

    /// Unfolded allele frequency spectrum: element `k` counts derived alleles carried by `k` samples.
    pub fn allele_frequency_spectrum(&self) -> Vec<u64> {
        let n = self.num_samples as usize;
        let mut spectrum: Vec<u64> = vec![0; n + 1];
        for alleles in &self.alleles {
            alleles
                .derived
                .values()
                .map(|c| *c as usize)
                .filter(|c| *c > 0 && *c < n)
                .for_each(|c| spectrum[c] += 1);
        }
        spectrum
    }

    fn check_windows(&self, windows: &[f64]) -> Result<(), Error> {
        if windows.len() < 2 {
            return Err(Error::BadWindows("at least one window is required".to_string()));
        }
        if windows[0] != 0.0 || windows[windows.len() - 1] != self.sequence_length {
            return Err(Error::BadWindows(format!(
                "windows must start at 0 and end at {}",
                self.sequence_length
            )));
        }
        if windows.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::BadWindows("breakpoints must be strictly increasing".to_string()));
        }
        Ok(())
    }

    fn window_sums<F>(&self, windows: &[f64], value: F) -> Vec<f64>
    where
        F: Fn(&SiteAlleles) -> f64,
    {
        let last = windows.len() - 2;
        let mut sums: Vec<f64> = vec![0.0; last + 1];
        for a in &self.alleles {
            // windows are half-open, the last breakpoint is the sequence length
            let w = windows.partition_point(|b| *b <= a.position).saturating_sub(1).min(last);
            let v = value(a);
            if !v.is_nan() {
                sums[w] += v;
            }
        }
        sums
    }
}

fn spans(windows: &[f64]) -> impl Iterator<Item = f64> + '_ {
    windows.windows(2).map(|w| w[1] - w[0])
}

/// Tajima's D from the summed pairwise diversity `t` and the number of segregating sites `s`.
fn tajimas_d(n: u32, t: f64, s: f64) -> f64 {
    if n < 2 || s == 0.0 {
        return f64::NAN;
    }
    let n = n as f64;
    let (mut a1, mut a2) = (0.0, 0.0);
    for i in 1..(n as u64) {
        a1 += 1.0 / i as f64;
        a2 += 1.0 / (i as f64).powi(2);
    }
    let b1 = (n + 1.0) / (3.0 * (n - 1.0));
    let b2 = 2.0 * (n * n + n + 3.0) / (9.0 * n * (n - 1.0));
    let c1 = b1 - 1.0 / a1;
    let c2 = b2 - (n + 2.0) / (a1 * n) + a2 / (a1 * a1);
    let e1 = c1 / a1;
    let e2 = c2 / (a1 * a1 + a2);
    let denominator = (e1 * s + e2 * s * (s - 1.0)).sqrt();
    match denominator > 0.0 {
        true => (t - s / a1) / denominator,
        false => f64::NAN,
    }
}
