use crate::{check_batch_dimension, check_query_dimension, rank_neighbors, DistanceMetric, StoreError, StoredSituation};

fn record(id: usize, text: &str, embedding: Vec<f32>) -> StoredSituation {
    StoredSituation::new(id.to_string(), text, format!("advice for {text}"), embedding)
}

#[test]
fn test_batch_dimension_fixed_by_first_record() {
    let records = vec![record(0, "a", vec![1.0, 0.0]), record(1, "b", vec![0.0, 1.0])];
    assert_eq!(check_batch_dimension(None, &records), Ok(Some(2)));
    assert_eq!(check_batch_dimension(Some(2), &records), Ok(Some(2)));
    assert_eq!(check_batch_dimension(Some(3), &[]), Ok(Some(3)));
    assert_eq!(check_batch_dimension(None, &[]), Ok(None));
}

#[test]
fn test_batch_dimension_mismatch() {
    let mixed = vec![record(0, "a", vec![1.0, 0.0]), record(1, "b", vec![1.0, 0.0, 0.0])];
    assert_eq!(
        check_batch_dimension(None, &mixed),
        Err(StoreError::DimensionMismatch { expected: 2, actual: 3 })
    );

    let single = vec![record(0, "a", vec![1.0])];
    assert_eq!(
        check_batch_dimension(Some(4), &single),
        Err(StoreError::DimensionMismatch { expected: 4, actual: 1 })
    );
}

#[test]
fn test_query_dimension() {
    assert!(check_query_dimension(None, &[1.0, 2.0, 3.0]).is_ok());
    assert!(check_query_dimension(Some(3), &[1.0, 2.0, 3.0]).is_ok());
    assert_eq!(
        check_query_dimension(Some(3), &[1.0]),
        Err(StoreError::DimensionMismatch { expected: 3, actual: 1 })
    );
}

#[test]
fn test_rank_neighbors_orders_nearest_first_and_caps() {
    let records = vec![
        record(0, "far", vec![0.0, 1.0, 0.0]),
        record(1, "exact", vec![1.0, 0.0, 0.0]),
        record(2, "close", vec![0.9, 0.1, 0.0]),
    ];

    let neighbors = rank_neighbors(DistanceMetric::Cosine, &[1.0, 0.0, 0.0], &records, 2);
    assert_eq!(neighbors.len(), 2);
    assert_eq!(neighbors[0].text, "exact");
    assert_eq!(neighbors[1].text, "close");
    assert!(neighbors[0].distance <= neighbors[1].distance);
    assert_eq!(neighbors[0].recommendation, "advice for exact");
}

#[test]
fn test_rank_neighbors_small_store_and_zero_k() {
    let records = vec![record(0, "only", vec![1.0, 0.0])];
    assert_eq!(rank_neighbors(DistanceMetric::Cosine, &[1.0, 0.0], &records, 5).len(), 1);
    assert!(rank_neighbors(DistanceMetric::Cosine, &[1.0, 0.0], &records, 0).is_empty());
    assert!(rank_neighbors(DistanceMetric::Cosine, &[1.0, 0.0], &Vec::<StoredSituation>::new(), 3).is_empty());
}

#[test]
fn test_rank_neighbors_ties_keep_insertion_order() {
    let records = vec![
        record(0, "first", vec![1.0, 0.0]),
        record(1, "second", vec![2.0, 0.0]),
    ];
    let neighbors = rank_neighbors(DistanceMetric::Cosine, &[3.0, 0.0], &records, 2);
    assert_eq!(neighbors[0].text, "first");
    assert_eq!(neighbors[1].text, "second");
}

#[test]
fn test_rank_neighbors_euclidean() {
    let records = vec![
        record(0, "origin", vec![0.0, 0.0]),
        record(1, "unit", vec![1.0, 0.0]),
    ];
    let neighbors = rank_neighbors(DistanceMetric::Euclidean, &[0.9, 0.0], &records, 2);
    assert_eq!(neighbors[0].text, "unit");
    assert!((neighbors[0].distance - 0.1).abs() < 1e-5);
}

#[test]
fn test_rank_neighbors_nan_distances_rank_last() {
    let records = vec![
        record(0, "nan-first", vec![f32::NAN, 0.0]),
        record(1, "exact", vec![1.0, 0.0]),
        record(2, "orthogonal", vec![0.0, 1.0]),
        record(3, "all-nan", vec![f32::NAN, f32::NAN]),
        record(4, "near", vec![0.9, 0.1]),
    ];

    for metric in [DistanceMetric::Cosine, DistanceMetric::Euclidean] {
        let neighbors = rank_neighbors(metric, &[1.0, 0.0], &records, 5);
        let texts: Vec<&str> = neighbors.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["exact", "near", "orthogonal", "nan-first", "all-nan"], "{metric:?}");
        assert!(neighbors[..3].iter().all(|n| n.distance.is_finite()));

        let top = rank_neighbors(metric, &[1.0, 0.0], &records, 2);
        assert!(top.iter().all(|n| !n.distance.is_nan()));
    }
}
