use super::*;

fn table() -> EmbeddingTable {
    EmbeddingTable::from_entries(
        [
            ("cat", vec![1.0, 2.0, 3.0]),
            ("sat", vec![-1.0, 0.5, 0.0]),
            ("mat", vec![0.25, 0.25, 0.25]),
        ],
        3,
        1234,
    )
    .unwrap()
}

fn columns(seq: &PaddedSequence) -> Vec<Vec<f32>> {
    seq.tensor().t().unwrap().to_vec2().unwrap()
}

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("the cat  sat\t on\r\n"), vec!["the", "cat", "sat", "on"]);
    assert!(tokenize("").is_empty());
    assert!(tokenize("   \t ").is_empty());
}

#[test]
fn test_padding_invariant() {
    let table = table();
    for padding in [0, 1, 4] {
        let encoder = SequenceEncoder::new(ArchConfig::new(3, padding, 10));
        let line = "cat dog sat mat";
        let seq = encoder.encode(&table, line, &Device::Cpu).unwrap();
        let tokens = tokenize(line);

        assert_eq!(seq.token_count(), 4);
        assert_eq!(seq.padding(), padding);
        assert_eq!(seq.columns(), 4 + 2 * padding);
        assert_eq!(seq.tensor().dims(), &[3, 4 + 2 * padding]);

        let cols = columns(&seq);
        for col in cols.iter().take(padding) {
            assert_eq!(col, &vec![0.0; 3]);
        }
        for col in cols.iter().skip(4 + padding) {
            assert_eq!(col, &vec![0.0; 3]);
        }
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(cols[padding + i].as_slice(), table.lookup(token));
        }
    }
}

#[test]
fn test_unknown_token_uses_fallback_column() {
    let table = table();
    let encoder = SequenceEncoder::new(ArchConfig::new(3, 2, 10));
    let seq = encoder.encode(&table, "zebra", &Device::Cpu).unwrap();

    let cols = columns(&seq);
    assert_eq!(cols[2].as_slice(), table.unknown_vector());
}

#[test]
fn test_max_length_accepted_and_exceeded() {
    let table = table();
    let encoder = SequenceEncoder::new(ArchConfig::new(3, 1, 3));

    assert!(encoder.encode(&table, "cat sat mat", &Device::Cpu).is_ok());

    let err = encoder
        .encode(&table, "cat sat mat cat", &Device::Cpu)
        .unwrap_err();
    assert!(matches!(
        err,
        InferenceError::SequenceTooLong { tokens: 4, max: 3 }
    ));
    assert!(err.is_recoverable());
}

#[test]
fn test_empty_line_rejected() {
    let encoder = SequenceEncoder::new(ArchConfig::new(3, 1, 3));
    let err = encoder.encode(&table(), "  ", &Device::Cpu).unwrap_err();
    assert!(matches!(err, InferenceError::EmptySequence));
    assert!(err.is_recoverable());
}

#[test]
fn test_table_width_must_match() {
    let encoder = SequenceEncoder::new(ArchConfig::new(4, 1, 3));
    let err = encoder.encode(&table(), "cat", &Device::Cpu).unwrap_err();
    assert!(matches!(
        err,
        InferenceError::EmbeddingWidth {
            expected: 4,
            actual: 3
        }
    ));
    assert!(!err.is_recoverable());
}
