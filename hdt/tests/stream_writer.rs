use hdt::{Hdt, StreamingWriter, Term, Triple, TripleOrder, TriplesFormat, WriterOptions};

#[test]
fn streaming_writer_roundtrip_interleaved_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stream.hdt");
    let mut w = StreamingWriter::new(&path, WriterOptions::default());

    let s1 = Term::iri("http://ex/s1");
    let s2 = Term::iri("http://ex/s2");
    let p1 = Term::iri("http://ex/p1");
    let p2 = Term::iri("http://ex/p2");
    let o1 = Term::literal("v1");
    let o2 = Term::lang_literal("v2", "en");
    let o3 = Term::bnode("b3");

    // deliberately out of SPO order
    let input = vec![
        Triple::new(s2.clone(), p1.clone(), o3),
        Triple::new(s1.clone(), p2, o2),
        Triple::new(s1.clone(), p1.clone(), o1),
        Triple::new(s2, p1, s1),
    ];
    for t in &input {
        w.add(t.clone()).unwrap();
    }
    assert_eq!(w.len(), 4);
    w.finalize().expect("finalize");

    let f = Hdt::open(&path).expect("open");
    let mut got: Vec<Triple> = f.triples().unwrap().collect::<hdt::Result<_>>().unwrap();
    got.sort();
    let mut want = input;
    want.sort();
    assert_eq!(got, want);
}

#[test]
fn streaming_empty_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.hdt");
    StreamingWriter::new(&path, WriterOptions::default())
        .finalize()
        .expect("finalize empty");
    let f = Hdt::open(&path).expect("open");
    assert!(f.is_empty());
}

#[test]
fn streaming_writer_honours_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.hdt");
    let opts = WriterOptions {
        order: TripleOrder::PSO,
        format: TriplesFormat::List,
        ..Default::default()
    };
    let mut w = StreamingWriter::new(&path, opts);
    w.add(Triple::new(
        Term::iri("http://ex/s"),
        Term::iri("http://ex/p"),
        Term::literal("o"),
    ))
    .unwrap();
    w.finalize().unwrap();
    let f = Hdt::open(&path).unwrap();
    assert_eq!(f.order(), TripleOrder::PSO);
    assert_eq!(f.triples_section().metadata().format, TriplesFormat::List);
    assert_eq!(f.triples_section().metadata().num_triples, Some(1));
}

#[test]
fn options_loaded_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("writer.json");
    std::fs::write(&cfg, r#"{ "order": "OSP", "block_size": 2 }"#).unwrap();
    let opts = WriterOptions::from_file(&cfg).unwrap();
    let path = dir.path().join("cfg.hdt");
    let t = Triple::new(
        Term::iri("http://ex/s"),
        Term::iri("http://ex/p"),
        Term::iri("http://ex/o"),
    );
    hdt::write_file_with_options(&path, std::slice::from_ref(&t), opts).unwrap();
    let f = Hdt::open(&path).unwrap();
    assert_eq!(f.order(), TripleOrder::OSP);
    assert_eq!(f.triples().unwrap().collect::<hdt::Result<Vec<_>>>().unwrap(), vec![t]);
}
