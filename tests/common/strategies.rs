use proptest::prelude::*;

/// Strictly increasing, gapped record ids
pub fn id_sequence_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..50, 0..40).prop_map(|gaps| {
        let mut id = 0;
        gaps.into_iter()
            .map(|gap| {
                id += gap;
                id
            })
            .collect()
    })
}

/// Valid `YYYY-MM-DD HH:MM:SS` local times
pub fn local_time_strategy() -> impl Strategy<Value = String> {
    (2000i32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}"),
    )
}
