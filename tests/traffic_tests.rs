use std::collections::HashMap;

use rand::{SeedableRng, rngs::StdRng};
use rpc_loadgen::{
    traffic::{random_block_number, random_block_range},
    *,
};

fn table(weights: &[(TrafficPattern, u32)]) -> PatternTable {
    PatternTable::new(
        weights
            .iter()
            .map(|&(pattern, weight)| PatternWeight { pattern, weight })
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_pick_follows_cumulative_weights() {
    let t = PatternTable::default();
    assert_eq!(t.pick(0.0), TrafficPattern::RandomHistoricalBlocks);
    assert_eq!(t.pick(15.0), TrafficPattern::RandomHistoricalBlocks);
    assert_eq!(t.pick(15.5), TrafficPattern::LatestBlockWithLogs);
    assert_eq!(t.pick(35.0), TrafficPattern::LatestBlockWithLogs);
    assert_eq!(t.pick(50.0), TrafficPattern::RandomLogRanges);
    assert_eq!(t.pick(65.0), TrafficPattern::RandomHistoricalReceipts);
    assert_eq!(t.pick(79.9), TrafficPattern::LatestBlockReceipts);
    assert_eq!(t.pick(85.0), TrafficPattern::RandomAccountBalances);
    assert_eq!(t.pick(99.99), TrafficPattern::TraceRandomTransactions);
}

#[test]
fn test_last_pattern_absorbs_remainder() {
    let t = table(&[(TrafficPattern::RandomLogRanges, 30), (TrafficPattern::RandomAccountBalances, 20)]);
    assert_eq!(t.pick(29.0), TrafficPattern::RandomLogRanges);
    assert_eq!(t.pick(45.0), TrafficPattern::RandomAccountBalances);
    assert_eq!(t.pick(99.0), TrafficPattern::RandomAccountBalances);
}

#[test]
fn test_weight_past_hundred_is_unreachable() {
    let t = table(&[(TrafficPattern::RandomLogRanges, 100), (TrafficPattern::RandomAccountBalances, 50)]);
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..1000 {
        assert_eq!(t.sample(&mut rng), TrafficPattern::RandomLogRanges);
    }
}

#[test]
fn test_sampling_approximates_weights() {
    let t = PatternTable::default();
    let mut rng = StdRng::seed_from_u64(42);
    let draws = 100_000;
    let mut counts: HashMap<TrafficPattern, u32> = HashMap::new();
    for _ in 0..draws {
        *counts.entry(t.sample(&mut rng)).or_default() += 1;
    }

    for entry in t.entries() {
        let observed = counts[&entry.pattern] as f64 / draws as f64 * 100.0;
        assert!(
            (observed - entry.weight as f64).abs() < 1.0,
            "{} observed {observed:.2}% expected {}%",
            entry.pattern,
            entry.weight
        );
    }
}

#[test]
fn test_zero_weight_entries_are_skipped() {
    let t = table(&[
        (TrafficPattern::RandomLogRanges, 0),
        (TrafficPattern::RandomAccountBalances, 100),
    ]);
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..1000 {
        assert_eq!(t.sample(&mut rng), TrafficPattern::RandomAccountBalances);
    }
}

#[test]
fn test_block_sampling_bounds() {
    let mut rng = StdRng::seed_from_u64(9);
    let (min, max) = (0x20D9900, 0x40D9900);
    let mut saw_min_half = false;
    let mut saw_max_half = false;
    for _ in 0..5000 {
        let n = random_block_number(&mut rng, min, max);
        assert!((min..=max).contains(&n));
        saw_min_half |= n < (min + max) / 2;
        saw_max_half |= n >= (min + max) / 2;

        let range = random_block_range(&mut rng, min, max, 1, 100);
        assert!((min..=max).contains(&range.from_block));
        assert!((1..=100).contains(&range.width()));
    }
    assert!(saw_min_half && saw_max_half);
}
