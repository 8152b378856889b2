#![forbid(unsafe_code)]

use analysis::{
    Aggregate, ChampionKey, DefaultReducer, FoldOutcome, Reducer, ResultTable, RoundKey,
    ShapedRecord,
};
use proptest::prelude::*;

const CHAMPIONS: [&str; 8] = ["Ashe", "Jinx", "Vi", "Lux", "Zed", "Ezreal", "Ahri", "Shen"];

fn record_strategy() -> impl Strategy<Value = ShapedRecord> {
    (
        1u32..40,
        1u32..=8,
        prop::collection::vec(0usize..CHAMPIONS.len(), 1..8),
    )
        .prop_map(|(round, placement, picks)| {
            ShapedRecord::new(round, placement, picks.into_iter().map(|i| CHAMPIONS[i]))
        })
}

fn batch_strategy() -> impl Strategy<Value = Vec<ShapedRecord>> {
    prop::collection::vec(record_strategy(), 0..60)
}

fn fold_all(table: &mut ResultTable, records: &[ShapedRecord]) {
    for record in records {
        DefaultReducer.fold(table, record);
    }
}

fn has_duplicates(record: &ShapedRecord) -> bool {
    let mut units = record.units.clone();
    units.sort();
    units.dedup();
    units.len() != record.num_units
}

proptest! {
    #[test]
    fn fold_order_and_partials_agree(a in batch_strategy(), b in batch_strategy()) {
        let mut ab = ResultTable::new();
        fold_all(&mut ab, &a);
        fold_all(&mut ab, &b);

        let mut ba = ResultTable::new();
        fold_all(&mut ba, &b);
        fold_all(&mut ba, &a);

        let mut merged = ResultTable::new();
        fold_all(&mut merged, &a);
        let mut partial = ResultTable::new();
        fold_all(&mut partial, &b);
        merged.merge(partial);

        // Placements are integers, so the sums are exact in any order.
        prop_assert_eq!(&ab, &ba);
        prop_assert_eq!(&ab, &merged);
        prop_assert_eq!(ab.finalize(), merged.finalize());
    }

    #[test]
    fn counts_are_conserved(records in batch_strategy()) {
        let mut table = ResultTable::new();
        let mut accepted = Vec::new();
        for record in &records {
            match DefaultReducer.fold(&mut table, record) {
                FoldOutcome::Applied => accepted.push(record),
                FoldOutcome::DuplicateUnits => prop_assert!(has_duplicates(record)),
            }
        }
        let table = table.finalize();

        prop_assert_eq!(table.grand_total().count, accepted.len() as u64);
        for (round, champion, summary) in table.entries() {
            let expected = accepted
                .iter()
                .filter(|record| match round {
                    RoundKey::Round(r) => record.last_round == r,
                    RoundKey::Total => true,
                })
                .filter(|record| match champion {
                    ChampionKey::Champion(name) => record.units.contains(name),
                    ChampionKey::Total => true,
                })
                .count() as u64;
            prop_assert_eq!(summary.count, expected, "{:?}/{:?}", round, champion);
        }
    }

    #[test]
    fn averages_stay_in_placement_range(records in batch_strategy()) {
        let mut table = ResultTable::new();
        fold_all(&mut table, &records);
        let table = table.finalize();

        for (round, champion, summary) in table.entries() {
            if summary.count == 0 {
                // Only the grand rollup of an empty run.
                prop_assert_eq!((round, champion), (RoundKey::Total, &ChampionKey::Total));
                continue;
            }
            prop_assert!(
                (1.0..=8.0).contains(&summary.avg_place),
                "{:?}/{:?} = {}", round, champion, summary.avg_place
            );
        }
    }
}

#[test]
fn duplicate_roster_contributes_nothing() {
    let mut table = ResultTable::new();
    let record = ShapedRecord::new(5, 1, ["Ashe", "Ashe", "Jinx"]);
    assert_eq!(record.num_units, 3);
    assert_eq!(
        DefaultReducer.fold(&mut table, &record),
        FoldOutcome::DuplicateUnits
    );
    assert_eq!(table, ResultTable::new());
}

#[test]
fn averaging_a_finalized_value_again_would_be_wrong() {
    // Finalizing consumes the table; the only way to average twice is to
    // divide a summary by hand, which visibly breaks the result.
    let mut agg = Aggregate::first(2.0);
    agg.observe(4.0);
    let once = agg.summarize();
    let twice = Aggregate {
        count: once.count,
        placement_sum: once.avg_place,
    }
    .summarize();
    assert_eq!(once.avg_place, 3.0);
    assert_eq!(twice.avg_place, 1.5);
}
