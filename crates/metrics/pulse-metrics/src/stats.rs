//! Derived figures shared by the engine's breakdowns

use pulse_store::ReplacementTally;

/// Mean response time of a group, rounded half up
pub(crate) fn avg_response_ms(tally: &ReplacementTally) -> u64 {
    rounded_mean(tally.response_total_ms, tally.count)
}

/// Share of a group's events that succeeded, in percent
pub(crate) fn success_rate(tally: &ReplacementTally) -> f64 {
    percentage(tally.successes, tally.count)
}

/// Mean rounded half up; 0 for an empty set
pub(crate) fn rounded_mean(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let (total, count) = (u128::from(total), u128::from(count));
    u64::try_from((2 * total + count) / (2 * count)).unwrap_or(u64::MAX)
}

/// `part` as a percentage of `whole`; 0 when `whole` is 0
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Sort groups by count descending. The sort is stable, so groups the store
/// returned in ascending key order keep that order on ties.
pub(crate) fn by_count_desc<T>(rows: &mut [T], count: impl Fn(&T) -> u64) {
    rows.sort_by(|a, b| count(b).cmp(&count(a)));
}
