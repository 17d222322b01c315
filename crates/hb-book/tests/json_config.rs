//! Integration tests: books and batches described as JSON.

use approx::assert_relative_eq;
use hb_book::{Batch, Book, Category, CountType, Error, Hist};
use serde_json::json;

fn events() -> Batch {
    Batch::from_json(&json!({
        "channel": ["ee", "mm", "ee", "em", "ee"],
        "pt": [12.0, 55.0, 31.0, 8.0, 240.0],
        "eta": [0.1, -1.2, 2.6, 0.0, -0.4],
        "w": [1.0, 0.5, 2.0, 1.5, 1.0]
    }))
    .unwrap()
}

fn book() -> Book {
    Book::from_json(&json!({
        "pt": {
            "axes": [{"type": "split", "expr": "pt", "edges": [0, 20, 50, 100], "nanflow": false}],
            "weight": "w"
        },
        "by_channel": {
            "axes": [
                {"type": "groupby", "expr": "channel"},
                {"type": "cut", "expr": "central"},
                {"type": "profile", "expr": "pt"}
            ],
            "defs": {"central": "abs(eta) < 2.4"}
        },
        "f32": {
            "book": {
                "ptf": {
                    "axes": [{"type": "bin", "expr": "pt", "numbins": 4, "low": 0, "high": 100}],
                    "weight": "w * 0.1",
                    "count_type": "f32"
                }
            }
        }
    }))
    .unwrap()
}

#[test]
fn book_from_json_fills() {
    let mut book = book();
    assert_eq!(book.keys().collect::<Vec<_>>(), vec!["by_channel", "f32/ptf", "pt"]);
    assert_eq!(book.fields(), vec!["channel", "eta", "pt", "w"]);

    let report = book.fill(&events()).unwrap();
    assert_eq!(report.entries, 5);

    // split: [under] [0,20) [20,50) [50,100) [over]
    let pt = book.get("pt").unwrap().content().unwrap().as_dense().unwrap();
    assert_eq!(pt.shape(), &[5, 2]);
    assert_eq!(pt.bin(1).unwrap(), &[2.5, 3.25]);
    assert_eq!(pt.bin(2).unwrap(), &[2.0, 4.0]);
    assert_eq!(pt.bin(3).unwrap(), &[0.5, 0.25]);
    assert_eq!(pt.bin(4).unwrap(), &[1.0, 1.0]);

    let by_channel = book.get("by_channel").unwrap().content().unwrap();
    let ee = by_channel.get(&Category::from("ee")).unwrap().as_dense().unwrap();
    // [Σpt, Σpt², count] for central == false, then central == true
    assert_eq!(ee.bin(0).unwrap(), &[31.0, 961.0, 1.0]);
    assert_eq!(ee.bin(1).unwrap(), &[252.0, 144.0 + 57600.0, 2.0]);
    assert_eq!(by_channel.leaves().len(), 3);

    let ptf = book.get("f32/ptf").unwrap();
    assert_eq!(ptf.config().count_type, CountType::F32);
    let sums = ptf.content().unwrap().as_dense().unwrap();
    assert!(sums.as_slice().iter().all(|&v| v == v as f32 as f64));
    assert_relative_eq!(sums.total(0), 0.6, epsilon = 1e-6);
}

#[test]
fn filling_twice_doubles() {
    let mut book = book();
    book.fill(&events()).unwrap();
    let first = book.get("pt").unwrap().content().unwrap().clone();
    book.fill(&events()).unwrap();
    let second = book.get("pt").unwrap().content().unwrap().as_dense().unwrap();
    for (a, b) in first.as_dense().unwrap().as_slice().iter().zip(second.as_slice()) {
        assert_eq!(2.0 * a, *b);
    }
}

#[test]
fn missing_column_reported() {
    let mut book = book();
    let batch = Batch::from_json(&json!({"pt": [1.0], "w": [1.0]})).unwrap();
    match book.fill(&batch) {
        Err(Error::MissingColumn(c)) => assert!(c == "channel" || c == "eta", "{c}"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(book.iter().all(|(_, h)| h.content().is_none()));
}

#[test]
fn json_errors() {
    let err = Hist::from_json(&json!({"axes": [{"type": "cut", "expr": "x"}], "bins": 3})).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedOption(ref k) if k == "bins"));

    let err = Hist::from_json(&json!({"axes": []})).unwrap_err();
    assert!(matches!(err, Error::EmptyHistogram));

    let err = Book::from_json(&json!({"h": {"weight": "w"}})).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)));

    let err = Batch::from_json(&json!({"x": [1.0, 2.0], "y": [1.0, 2.0, 3.0]})).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { .. }));
}
