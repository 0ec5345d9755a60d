//! Challenge (scramble) generation.

use rand::Rng;

/// Length of the MySQL 4.1 scramble in bytes.
pub const SCRAMBLE_LENGTH: usize = 20;

/// Source of challenge bytes.
///
/// Implementations must return exactly `len` unpredictable bytes.
pub trait ChallengeSource {
    fn generate(&mut self, len: usize) -> Vec<u8>;
}

/// Thread-local CSPRNG source.
///
/// Bytes are drawn from `1..=127` and never `'$'`, so the scramble can travel
/// inside NUL-terminated and `$`-delimited encodings unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomChallengeSource;

/// Map `1..=126` one-to-one onto `1..=127` without `'$'`.
fn skip_dollar(n: u8) -> u8 {
    if n >= b'$' { n + 1 } else { n }
}

impl ChallengeSource for RandomChallengeSource {
    fn generate(&mut self, len: usize) -> Vec<u8> {
        let mut rng = rand::rng();
        (0..len)
            .map(|_| skip_dollar(rng.random_range(1..127)))
            .collect()
    }
}

impl<S: ChallengeSource + ?Sized> ChallengeSource for &mut S {
    fn generate(&mut self, len: usize) -> Vec<u8> {
        (**self).generate(len)
    }
}

impl<S: ChallengeSource + ?Sized> ChallengeSource for Box<S> {
    fn generate(&mut self, len: usize) -> Vec<u8> {
        (**self).generate(len)
    }
}

/// The salt issued to one client. Immutable once created.
#[derive(Clone, PartialEq, Eq)]
pub struct Challenge(Box<[u8]>);

impl Challenge {
    /// Draw a new challenge of [`SCRAMBLE_LENGTH`] bytes from `source`.
    pub fn generate<S: ChallengeSource + ?Sized>(source: &mut S) -> Self {
        Self(source.generate(SCRAMBLE_LENGTH).into_boxed_slice())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Challenge {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

// Keep the salt out of logs.
impl std::fmt::Debug for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Challenge(<{} bytes>)", self.0.len())
    }
}
