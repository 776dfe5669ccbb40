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

//! Sequential spreadsheet column labels (A, B, ..., Z, AA, AB, ...).
//!
//! This is a bijective base-N counter, not standard base-N: there is no zero
//! digit that doubles as a leading blank, so after Z comes AA. The position is
//! kept as an explicit digit-index array (least-significant first) with carry
//! propagation, which avoids the off-by-one traps of character-code
//! arithmetic at alphabet boundaries.

const DEFAULT_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Stateful column label generator over a fixed alphabet.
///
/// Labels produced across one generator's lifetime form a strictly increasing
/// sequence with no duplicates.
#[derive(Debug, Clone)]
pub struct ColumnLabels {
    alphabet: Vec<char>,
    /// Digit indices, least-significant first.
    digits: Vec<usize>,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnLabels {
    /// Creates a generator positioned at "A" over the 26-letter alphabet.
    pub fn new() -> Self {
        Self::with_alphabet(DEFAULT_ALPHABET)
    }

    /// Creates a generator over a custom, non-empty alphabet.
    pub fn with_alphabet(alphabet: &str) -> Self {
        let alphabet: Vec<char> = alphabet.chars().collect();
        assert!(!alphabet.is_empty(), "column alphabet cannot be empty");
        Self {
            alphabet,
            digits: vec![0],
        }
    }

    /// Returns the label for the present position without advancing.
    pub fn current(&self) -> String {
        // Digits are little-endian; render most-significant first.
        self.digits
            .iter()
            .rev()
            .map(|&digit| self.alphabet[digit])
            .collect()
    }

    /// Steps forward `steps` positions and returns the new label.
    ///
    /// `advance(0)` performs no increment and returns the current label.
    pub fn advance(&mut self, steps: usize) -> String {
        for _ in 0..steps {
            self.increment();
        }
        self.current()
    }

    fn increment(&mut self) {
        for digit in self.digits.iter_mut() {
            *digit += 1;
            if *digit < self.alphabet.len() {
                return;
            }
            *digit = 0;
        }
        // Carry propagated past the top digit: grow the label (Z -> AA).
        self.digits.push(0);
    }
}
