#![cfg(feature = "oxigraph")]
use hdt::{Hdt, StreamingWriter, Term, Triple, WriterOptions, write_file};
use oxigraph::model as ox;

#[test]
fn to_oxigraph_graph_basic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ox.hdt");
    let t = Triple::new(
        Term::iri("http://ex/s1"),
        Term::iri("http://ex/p1"),
        Term::lang_literal("v1", "en"),
    );
    write_file(&path, std::slice::from_ref(&t)).unwrap();
    let f = Hdt::open(&path).unwrap();
    let g = f.to_oxigraph_graph().unwrap();
    assert_eq!(g.iter().count(), 1);
    let expected = ox::Triple::try_from(&t).unwrap();
    assert!(g.contains(&expected));
}

#[test]
fn oxigraph_graph_roundtrip() {
    let mut g = ox::Graph::new();
    let s = ox::NamedNode::new("http://ex/s").unwrap();
    let p = ox::NamedNode::new("http://ex/p").unwrap();
    let b = ox::BlankNode::new("n1").unwrap();
    g.insert(&ox::Triple::new(s.clone(), p.clone(), b.clone()));
    g.insert(&ox::Triple::new(
        b,
        p.clone(),
        ox::Literal::new_simple_literal("plain"),
    ));
    g.insert(&ox::Triple::new(
        s,
        p,
        ox::Literal::new_typed_literal("7", ox::NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap()),
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.hdt");
    let mut w = StreamingWriter::new(&path, WriterOptions::default());
    w.add_oxigraph_graph(&g).unwrap();
    w.finalize().unwrap();

    let back = Hdt::open(&path).unwrap().to_oxigraph_graph().unwrap();
    assert_eq!(back.len(), 3);
    for t in g.iter() {
        assert!(back.contains(t), "missing {t}");
    }
}
