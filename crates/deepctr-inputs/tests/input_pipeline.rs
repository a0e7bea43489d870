use deepctr_core::{
    build_input_features, get_feature_names, Combiner, CoreError, DenseFeat, EmbeddingDim,
    EmbeddingMatrixConfig, FeatureColumn, FeatureConfig, FeatureRange, SparseFeat,
    VarLenSparseFeat,
};
use deepctr_inputs::{
    create_embedding_matrix, embedding_lookup, get_varlen_pooling_list, InputEmbedder, InputError,
};
use deepctr_layers::Tensor;

fn seeded() -> EmbeddingMatrixConfig {
    EmbeddingMatrixConfig::default()
        .with_init_std(0.1)
        .with_seed(1024)
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
    }
}

fn hist_feature(maxlen: usize, combiner: Combiner) -> VarLenSparseFeat {
    VarLenSparseFeat::new(SparseFeat::new("hist", 100, 8).unwrap(), maxlen, combiner, None)
        .unwrap()
}

#[test]
fn sparse_and_dense_row_is_embedding_then_value() {
    let columns: Vec<FeatureColumn> = vec![
        SparseFeat::new("gender", 2, 4).unwrap().into(),
        DenseFeat::new("age", 1).unwrap().into(),
    ];
    let embedder = InputEmbedder::new(columns, &seeded()).unwrap();

    let index = embedder.feature_index();
    assert_eq!(index.get("gender"), Some(FeatureRange::new(0, 1)));
    assert_eq!(index.get("age"), Some(FeatureRange::new(1, 2)));

    let x = Tensor::from_data(&[1, 2], vec![1.0, 0.5]);
    let out = embedder.dnn_input(&x).unwrap();
    assert_eq!(out.shape(), &[1, 5]);

    let gender = embedder.embedding_dict().get("gender").unwrap();
    assert_close(&out.data()[..4], gender.row(1).unwrap());
    assert_eq!(out.data()[4], 0.5);
}

#[test]
fn sum_pooling_adds_non_padded_positions() {
    let hist = hist_feature(5, Combiner::Sum);
    let columns: Vec<FeatureColumn> = vec![hist.clone().into()];
    let index = build_input_features(&columns);
    let dict = create_embedding_matrix(&columns, &seeded()).unwrap();

    let x = Tensor::from_data(&[1, 5], vec![3.0, 7.0, 0.0, 0.0, 0.0]);
    let pooled = get_varlen_pooling_list(&dict, &x, &index, &[&hist]).unwrap();
    assert_eq!(pooled.len(), 1);
    assert_eq!(pooled[0].shape(), &[1, 8]);

    let table = dict.get("hist").unwrap();
    let expected: Vec<f32> = table
        .row(3)
        .unwrap()
        .iter()
        .zip(table.row(7).unwrap())
        .map(|(a, b)| a + b)
        .collect();
    assert_close(pooled[0].data(), &expected);
}

#[test]
fn auto_embedding_dim_follows_vocabulary_size() {
    let feat = SparseFeat::new("city", 1000, EmbeddingDim::Auto).unwrap();
    assert_eq!(feat.embedding_dim(), 33);

    let columns: Vec<FeatureColumn> = vec![feat.into()];
    let dict = create_embedding_matrix(&columns, &seeded()).unwrap();
    assert_eq!(dict.get("city").unwrap().weight().shape(), &[1000, 33]);
}

#[test]
fn shared_embedding_name_ties_parameters() {
    let item = SparseFeat::new("item", 50, 4).unwrap();
    let hist = VarLenSparseFeat::new(
        SparseFeat::builder("hist_item", 50)
            .embedding_dim(4)
            .embedding_name("item")
            .build()
            .unwrap(),
        3,
        Combiner::Sum,
        None,
    )
    .unwrap();
    let columns: Vec<FeatureColumn> = vec![item.clone().into(), hist.clone().into()];
    let mut embedder = InputEmbedder::new(columns, &seeded()).unwrap();
    assert_eq!(embedder.embedding_dict().len(), 1);

    let x = Tensor::from_data(&[1, 4], vec![9.0, 9.0, 0.0, 0.0]);
    let before = embedder.dnn_input(&x).unwrap();

    embedder
        .embedding_dict_mut()
        .get_mut("item")
        .unwrap()
        .set_row(9, &[1.0, 2.0, 3.0, 4.0])
        .unwrap();
    let after = embedder.dnn_input(&x).unwrap();

    assert_ne!(before, after);
    assert_close(&after.data()[..4], &[1.0, 2.0, 3.0, 4.0]);
    assert_close(&after.data()[4..], &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn fully_padded_mean_and_max_pool_to_zero() {
    for combiner in [Combiner::Mean, Combiner::Max] {
        let hist = hist_feature(4, combiner);
        let columns: Vec<FeatureColumn> = vec![hist.clone().into()];
        let index = build_input_features(&columns);
        let dict = create_embedding_matrix(&columns, &seeded()).unwrap();

        let x = Tensor::from_data(&[2, 4], vec![0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0]);
        let pooled = get_varlen_pooling_list(&dict, &x, &index, &[&hist]).unwrap();
        let out = &pooled[0];
        assert_eq!(out.row(0).unwrap(), &[0.0; 8], "combiner {combiner}");
        assert_close(out.row(1).unwrap(), dict.get("hist").unwrap().row(5).unwrap());
    }
}

#[test]
fn mean_over_single_valid_position_with_length_field() {
    let hist = VarLenSparseFeat::new(
        SparseFeat::new("hist", 100, 8).unwrap(),
        4,
        Combiner::Mean,
        Some("hist_len".to_string()),
    )
    .unwrap();
    let columns: Vec<FeatureColumn> = vec![hist.clone().into()];
    let index = build_input_features(&columns);
    assert_eq!(index.get("hist_len"), Some(FeatureRange::new(4, 5)));
    let dict = create_embedding_matrix(&columns, &seeded()).unwrap();

    // non-zero ids past the length must be ignored
    let x = Tensor::from_data(&[1, 5], vec![42.0, 11.0, 12.0, 13.0, 1.0]);
    let pooled = get_varlen_pooling_list(&dict, &x, &index, &[&hist]).unwrap();
    assert_close(pooled[0].data(), dict.get("hist").unwrap().row(42).unwrap());
}

#[test]
fn layout_covers_batch_without_gaps() {
    let columns: Vec<FeatureColumn> = vec![
        SparseFeat::new("a", 10, 4).unwrap().into(),
        DenseFeat::new("b", 3).unwrap().into(),
        VarLenSparseFeat::new(
            SparseFeat::new("c", 10, 4).unwrap(),
            6,
            Combiner::Sum,
            Some("c_len".to_string()),
        )
        .unwrap()
        .into(),
        DenseFeat::new("d", 1).unwrap().into(),
    ];
    let index = build_input_features(&columns);

    let mut next = 0;
    for (_, range) in index.iter() {
        assert_eq!(range.start, next);
        assert!(range.end > range.start);
        next = range.end;
    }
    assert_eq!(next, index.total_width());
    assert_eq!(index.total_width(), 1 + 3 + 6 + 1 + 1);
    assert_eq!(
        get_feature_names(&columns),
        vec!["a", "b", "c", "c_len", "d"]
    );
}

#[test]
fn duplicate_names_keep_first_declaration() {
    let columns: Vec<FeatureColumn> = vec![
        SparseFeat::new("user", 10, 4).unwrap().into(),
        DenseFeat::new("user", 7).unwrap().into(),
        DenseFeat::new("score", 1).unwrap().into(),
    ];
    let embedder = InputEmbedder::new(columns, &seeded()).unwrap();
    let index = embedder.feature_index();
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("score"), Some(FeatureRange::new(1, 2)));

    let out = embedder
        .dnn_input(&Tensor::from_data(&[1, 2], vec![3.0, 0.75]))
        .unwrap();
    assert_eq!(out.shape(), &[1, 5]);
}

#[test]
fn groups_follow_first_insertion_order() {
    let columns: Vec<FeatureColumn> = vec![
        SparseFeat::builder("u", 10).group_name("user").build().unwrap().into(),
        SparseFeat::builder("i", 10).group_name("item").build().unwrap().into(),
        SparseFeat::builder("u2", 10).group_name("user").build().unwrap().into(),
    ];
    let index = build_input_features(&columns);
    let dict = create_embedding_matrix(&columns, &seeded()).unwrap();
    let sparse: Vec<&SparseFeat> = columns.iter().filter_map(|c| c.as_sparse()).collect();

    let x = Tensor::from_data(&[1, 3], vec![1.0, 2.0, 3.0]);
    let grouped = embedding_lookup(&x, &dict, &index, &sparse, &[]).unwrap();
    assert_eq!(grouped.group_names().collect::<Vec<_>>(), vec!["user", "item"]);
    assert_eq!(grouped.get("user").unwrap().len(), 2);

    let list = grouped.into_list();
    assert_close(list[1].data(), dict.get("u2").unwrap().row(3).unwrap());
    assert_close(list[2].data(), dict.get("i").unwrap().row(2).unwrap());
}

#[test]
fn hashed_features_are_rejected_at_lookup() {
    let columns: Vec<FeatureColumn> = vec![SparseFeat::builder("query", 1000)
        .use_hash(true)
        .build()
        .unwrap()
        .into()];
    let embedder = InputEmbedder::new(columns, &seeded()).unwrap();
    let err = embedder
        .dnn_input(&Tensor::from_data(&[1, 1], vec![5.0]))
        .unwrap_err();
    assert!(matches!(err, InputError::UnsupportedFeature { name } if name == "query"));
}

#[test]
fn json_config_builds_the_same_pipeline() {
    let json = r#"{
        "features": [
            {"type": "sparse", "name": "gender", "vocabulary_size": 2, "embedding_dim": 4},
            {"type": "dense", "name": "age"},
            {"type": "varlen_sparse", "maxlen": 5, "combiner": "sum",
             "sparsefeat": {"name": "hist", "vocabulary_size": 1000, "embedding_dim": "auto"}}
        ],
        "embedding": {"init_std": 0.01, "seed": 3}
    }"#;
    let config = FeatureConfig::from_json_str(json).unwrap();
    let embedder = InputEmbedder::from_config(&config).unwrap();
    assert_eq!(embedder.feature_index().total_width(), 7);
    assert_eq!(embedder.compute_input_dim(true, true, false), 4 + 33 + 1);

    let x = Tensor::from_data(&[1, 7], vec![1.0, 0.3, 4.0, 2.0, 0.0, 0.0, 0.0]);
    assert_eq!(embedder.dnn_input(&x).unwrap().shape(), &[1, 38]);

    let bad = r#"{"features": [{"type": "bucketized", "name": "x"}]}"#;
    assert!(matches!(
        FeatureConfig::from_json_str(bad),
        Err(CoreError::InvalidFeatureKind { kind }) if kind == "bucketized"
    ));
}
