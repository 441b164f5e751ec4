use crate::phrase::Phrase;
use chrono::{Datelike, NaiveDate};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Number of phrases in one day's puzzle.
pub const DAILY_PHRASES: usize = 5;

/// Seed for a calendar day: year*10000 + month*100 + day, month 1-indexed.
/// Every player on the same UTC day derives the same seed.
pub fn date_seed(date: NaiveDate) -> u64 {
    let year = date.year() as u64;
    year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
}

/// Deterministically pick the day's ordered phrase selection.
///
/// Strategy: shuffle-and-take. A copy of the pool is Fisher-Yates shuffled
/// with a generator seeded from the date, then the first `DAILY_PHRASES`
/// entries are taken. Guarantees no duplicate phrases whenever the pool has
/// at least `DAILY_PHRASES` entries. An empty pool yields an empty
/// selection; a smaller pool yields the whole pool in shuffled order.
pub fn select_daily(pool: &[Phrase], date: NaiveDate) -> Vec<Phrase> {
    let mut shuffled = pool.to_vec();
    let mut rng = StdRng::seed_from_u64(date_seed(date));
    shuffled.shuffle(&mut rng);
    shuffled.truncate(DAILY_PHRASES);
    shuffled
}
