//! Scoring of candidate pairs.
//!
//! The engine maximizes the sum of scores returned by a [`ScoreProvider`]. Any
//! `Fn(&A, &B) -> T` closure is a provider; [`SuitabilityScore`] is the
//! address/driver score used by the command-line tool.

/// Pure, deterministic score of pairing `a` with `b`. Larger is better.
///
/// Implementations must return finite values and must not depend on mutable
/// state: the engine calls them more than once for the same pair.
pub trait ScoreProvider<A: ?Sized, B: ?Sized, T> {
    fn score(&self, a: &A, b: &B) -> T;
}

impl<A, B, T, F> ScoreProvider<A, B, T> for F
where
    A: ?Sized,
    B: ?Sized,
    F: Fn(&A, &B) -> T,
{
    fn score(&self, a: &A, b: &B) -> T {
        self(a, b)
    }
}

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Suitability of a driver for an address.
///
/// - Even-length address (the empty address included): `1.5 *` the number of
///   vowels in the driver's name.
/// - Odd-length address: the number of consonants in the driver's name.
/// - If the two lengths share a factor greater than 1 the result is scaled by `1.5`.
///
/// Letters are compared case-insensitively, `y` counts as a consonant and anything
/// that is not an ASCII letter counts as neither.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuitabilityScore;

impl SuitabilityScore {
    pub fn suitability(address: &str, driver: &str) -> f64 {
        let address_len = address.chars().count();
        let driver_len = driver.chars().count();

        let mut score = if address_len % 2 == 0 {
            1.5 * vowels(driver) as f64
        } else {
            consonants(driver) as f64
        };

        if has_common_factor(address_len, driver_len) {
            score *= 1.5;
        }
        score
    }
}

impl<A, B> ScoreProvider<A, B, f64> for SuitabilityScore
where
    A: AsRef<str> + ?Sized,
    B: AsRef<str> + ?Sized,
{
    fn score(&self, address: &A, driver: &B) -> f64 {
        Self::suitability(address.as_ref(), driver.as_ref())
    }
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c.to_ascii_lowercase())
}

fn vowels(s: &str) -> usize {
    s.chars().filter(|&c| is_vowel(c)).count()
}

fn consonants(s: &str) -> usize {
    s.chars()
        .filter(|&c| c.is_ascii_alphabetic() && !is_vowel(c))
        .count()
}

// lengths below 2 have no factor other than 1
fn has_common_factor(a: usize, b: usize) -> bool {
    a.min(b) >= 2 && gcd(a, b) > 1
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
