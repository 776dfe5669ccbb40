// Copyright 2025 Webmobix Solutions AG
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUTHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Price-competitiveness tiers relative to a reference market average.

use google_sheets4::api::{Color, ColorStyle};
use tracing::warn;

/// A coarse price bucket, A (cheapest) through F (most expensive), each bound
/// to a fixed background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceTier {
    A,
    B,
    C,
    D,
    F,
}

impl PriceTier {
    /// Buckets a price against a reference average.
    ///
    /// Half-open boundaries, evaluated in order, first match wins:
    /// below avg-50% -> A, below avg-20% -> B, below avg+20% -> C,
    /// below avg+50% -> D, otherwise F. A price sitting exactly on a
    /// boundary falls through to the next bucket.
    pub fn classify(price: f64, reference_avg: f64) -> Self {
        if price < reference_avg - 0.5 * reference_avg {
            PriceTier::A
        } else if price < reference_avg - 0.2 * reference_avg {
            PriceTier::B
        } else if price < reference_avg + 0.2 * reference_avg {
            PriceTier::C
        } else if price < reference_avg + 0.5 * reference_avg {
            PriceTier::D
        } else {
            PriceTier::F
        }
    }

    /// Fixed display color for the tier's cell background.
    pub fn color(&self) -> Color {
        let (red, green, blue) = match self {
            PriceTier::A => (0.22, 0.66, 0.33),
            PriceTier::B => (0.58, 0.77, 0.49),
            PriceTier::C => (1.0, 0.85, 0.4),
            PriceTier::D => (0.96, 0.6, 0.3),
            PriceTier::F => (0.88, 0.3, 0.25),
        };
        Color {
            red: Some(red),
            green: Some(green),
            blue: Some(blue),
            alpha: Some(1.0),
        }
    }

    pub fn color_style(&self) -> ColorStyle {
        ColorStyle {
            rgb_color: Some(self.color()),
            ..Default::default()
        }
    }
}

/// Classifies a list of observed prices, returning a parallel tier list.
///
/// A non-positive reference average runs the same comparisons unconditionally
/// (everything lands in F when the average is 0); the resulting tiers are
/// misleading when reference data is missing, so that case is logged.
pub fn classify_prices(prices: &[f64], reference_avg: f64) -> Vec<PriceTier> {
    if reference_avg <= 0.0 && !prices.is_empty() {
        warn!(
            "⚠️  Classifying {} prices against non-positive reference average {}",
            prices.len(),
            reference_avg
        );
    }

    prices
        .iter()
        .map(|&price| PriceTier::classify(price, reference_avg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_prices_around_the_average() {
        assert_eq!(PriceTier::classify(40.0, 100.0), PriceTier::A);
        assert_eq!(PriceTier::classify(65.0, 100.0), PriceTier::B);
        assert_eq!(PriceTier::classify(100.0, 100.0), PriceTier::C);
        assert_eq!(PriceTier::classify(140.0, 100.0), PriceTier::D);
        assert_eq!(PriceTier::classify(200.0, 100.0), PriceTier::F);
    }

    #[test]
    fn boundary_prices_fall_to_the_next_bucket() {
        // Exactly avg-50% is not < avg-50%, so it lands in B.
        assert_eq!(PriceTier::classify(50.0, 100.0), PriceTier::B);
        assert_eq!(PriceTier::classify(80.0, 100.0), PriceTier::C);
        assert_eq!(PriceTier::classify(120.0, 100.0), PriceTier::D);
        assert_eq!(PriceTier::classify(150.0, 100.0), PriceTier::F);
    }

    #[test]
    fn classifies_lists_in_parallel() {
        let tiers = classify_prices(&[40.0, 65.0, 100.0, 140.0, 200.0], 100.0);
        assert_eq!(
            tiers,
            vec![
                PriceTier::A,
                PriceTier::B,
                PriceTier::C,
                PriceTier::D,
                PriceTier::F
            ]
        );
    }

    #[test]
    fn zero_average_applies_thresholds_unchanged() {
        // No special-casing: every non-negative price fails all the strict
        // comparisons against 0 and lands in F.
        let tiers = classify_prices(&[0.0, 10.0, 1000.0], 0.0);
        assert_eq!(tiers, vec![PriceTier::F, PriceTier::F, PriceTier::F]);
    }

    #[test]
    fn tier_colors_are_distinct() {
        let tiers = [
            PriceTier::A,
            PriceTier::B,
            PriceTier::C,
            PriceTier::D,
            PriceTier::F,
        ];
        for (i, a) in tiers.iter().enumerate() {
            for b in tiers.iter().skip(i + 1) {
                assert_ne!(a.color().red, b.color().red);
            }
        }
    }
}
