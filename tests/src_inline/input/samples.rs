use super::*;

use std::io::Cursor;

const HEADER: &str = "sample_id\tp_normal\tp_viral\tp_bacterial\tlabel\n";

fn parse(body: &str) -> Result<Vec<ScoredSample>, TriageError> {
    parse_samples(Cursor::new(format!("{HEADER}{body}")))
}

#[test]
fn test_parse_happy_path() {
    let samples = parse(
        "img_0001\t0.7\t0.2\t0.1\tnormal\n\
         img_0002\t0.1\t0.6\t0.3\tviral\n\
         img_0003\t0.05\t0.15\t0.8\tbacterial\n",
    )
    .unwrap();

    assert_eq!(samples.len(), 3);
    assert_eq!(samples[0].id, "img_0001");
    assert_eq!(samples[0].actual, Label::Normal);
    assert_eq!(samples[1].scores.get(Label::Viral), 0.6);
    assert_eq!(samples[2].actual, Label::Bacterial);
}

#[test]
fn test_columns_located_by_name_not_position() {
    let body = "label\tp_bacterial\tsample_id\tp_viral\tp_normal\n\
                bacteria\t0.8\timg_1\t0.15\t0.05\n";
    let samples = parse_samples(Cursor::new(body)).unwrap();
    assert_eq!(samples[0].id, "img_1");
    assert_eq!(samples[0].actual, Label::Bacterial);
    assert_eq!(samples[0].scores.get(Label::Bacterial), 0.8);
}

#[test]
fn test_blank_lines_skipped() {
    let samples = parse("img_1\t1.0\t0.0\t0.0\tnormal\n\n\nimg_2\t0.0\t1.0\t0.0\tvirus\n").unwrap();
    assert_eq!(samples.len(), 2);
}

#[test]
fn test_duplicate_id_keeps_first() {
    let samples = parse(
        "img_1\t1.0\t0.0\t0.0\tnormal\n\
         img_1\t0.0\t1.0\t0.0\tviral\n",
    )
    .unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].actual, Label::Normal);
}

#[test]
fn test_missing_column_is_rejected() {
    let body = "sample_id\tp_normal\tp_viral\tlabel\nimg_1\t1.0\t0.0\tnormal\n";
    let err = parse_samples(Cursor::new(body)).unwrap_err();
    assert!(matches!(err, TriageError::Parse(_)));
    assert!(err.to_string().contains("p_bacterial"));
}

#[test]
fn test_bad_score_sum_rejects_the_load() {
    let err = parse("img_1\t0.5\t0.3\t0.1\tnormal\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("line 2"));
    assert!(msg.contains("img_1"));
}

#[test]
fn test_unknown_label_rejects_the_load() {
    let err = parse("img_1\t0.5\t0.3\t0.2\tcovid\n").unwrap_err();
    assert!(err.to_string().contains("unknown label"));
}

#[test]
fn test_non_numeric_score_rejects_the_load() {
    let err = parse("img_1\tabc\t0.3\t0.2\tnormal\n").unwrap_err();
    assert!(err.to_string().contains("p_normal"));
}

#[test]
fn test_empty_and_header_only_files_rejected() {
    assert!(parse_samples(Cursor::new("")).is_err());
    assert!(parse_samples(Cursor::new(HEADER)).is_err());
}

#[test]
fn test_gzipped_file_round_trip() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write as _;

    let dir = std::env::temp_dir().join(format!("cxr-triage-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("samples.tsv.gz");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(format!("{HEADER}img_1\t0.2\t0.3\t0.5\tbacterial\n").as_bytes())
        .unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let samples = load_samples(&path).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].actual, Label::Bacterial);

    std::fs::remove_dir_all(&dir).unwrap();
}
