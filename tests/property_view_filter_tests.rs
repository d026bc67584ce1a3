use std::collections::BTreeSet;

use chart_scene::core::{CdsView, Column, ColumnDataSource, Filter, ModelId};
use chart_scene::core::view::NoOperands;
use proptest::prelude::*;

fn source(rows: usize) -> ColumnDataSource {
    let kinds: Vec<String> = (0..rows).map(|row| format!("k{}", row % 3)).collect();
    ColumnDataSource::from_columns([
        ("x", Column::from((0..rows).map(|row| row as f64).collect::<Vec<_>>())),
        ("kind", Column::from(kinds)),
    ])
    .expect("source")
}

proptest! {
    #[test]
    fn view_rows_are_the_intersection_of_its_filters(
        rows in 1usize..64,
        left in prop::collection::vec(0usize..80, 0..40),
        right in prop::collection::vec(0usize..80, 0..40)
    ) {
        let filters = vec![
            (ModelId::from("left"), Filter::index(left.clone())),
            (ModelId::from("right"), Filter::index(right.clone())),
        ];
        let view = CdsView::new(vec![ModelId::from("left"), ModelId::from("right")]);

        let indices = view.compute_indices(&source(rows), &filters);

        let left: BTreeSet<usize> = left.into_iter().filter(|row| *row < rows).collect();
        let right: BTreeSet<usize> = right.into_iter().filter(|row| *row < rows).collect();
        let expected: Vec<usize> = left.intersection(&right).copied().collect();
        prop_assert_eq!(indices, expected);
    }

    #[test]
    fn group_filter_selects_exactly_the_matching_rows(rows in 1usize..64, group in 0usize..3) {
        let label = format!("k{group}");
        let mask = Filter::group("kind", label.as_str()).compute_mask(&source(rows), &NoOperands);

        prop_assert_eq!(mask.len(), rows);
        for (row, keep) in mask.iter().enumerate() {
            prop_assert_eq!(*keep, row % 3 == group);
        }
    }

    #[test]
    fn group_without_matches_selects_nothing(rows in 1usize..64) {
        let view = CdsView::new(vec![ModelId::from("none")]);
        let filters = vec![(ModelId::from("none"), Filter::group("kind", "absent"))];

        prop_assert!(view.compute_indices(&source(rows), &filters).is_empty());
    }
}
