use hdt::triples::TriplesIndex;
use hdt::{Hdt, Term, Triple, TripleOrder, TriplesFormat, WriterOptions, serialize_with_options};

fn dataset() -> Vec<Triple> {
    let mut out = Vec::new();
    for s in 0..5 {
        for p in 0..3 {
            for o in 0..4 {
                if (s + p + o) % 3 == 0 {
                    continue;
                }
                let object = if o % 2 == 0 {
                    Term::iri(format!("http://ex.org/node{o}"))
                } else {
                    Term::literal(format!("value {o}"))
                };
                out.push(Triple::new(
                    Term::iri(format!("http://ex.org/node{s}")),
                    Term::iri(format!("http://ex.org/pred{p}")),
                    object,
                ));
            }
        }
    }
    out
}

fn decoded(order: TripleOrder, format: TriplesFormat) -> Vec<Triple> {
    let opts = WriterOptions {
        order,
        format,
        block_size: 4,
        ..Default::default()
    };
    let hdt = Hdt::from_bytes(serialize_with_options(&dataset(), &opts).unwrap()).unwrap();
    assert_eq!(hdt.order(), order);
    let mut v = hdt
        .triples()
        .unwrap()
        .collect::<hdt::Result<Vec<_>>>()
        .unwrap();
    v.sort();
    v
}

#[test]
fn all_orderings_decode_to_the_same_set() {
    let mut want = dataset();
    want.sort();
    for format in [TriplesFormat::Bitmap, TriplesFormat::List] {
        for order in TripleOrder::ALL {
            assert_eq!(decoded(order, format), want, "{order} {format:?}");
        }
    }
}

#[test]
fn adjacency_cardinality_per_ordering() {
    for order in TripleOrder::ALL {
        let opts = WriterOptions {
            order,
            ..Default::default()
        };
        let hdt = Hdt::from_bytes(serialize_with_options(&dataset(), &opts).unwrap()).unwrap();
        let TriplesIndex::Bitmap(bt) = hdt.triples_section().index() else {
            panic!("expected a bitmap index");
        };
        let roots = hdt.dictionary().id_sequence(order.levels()[0]).len();
        assert_eq!(bt.bitmap_y().count_ones(), roots, "{order}");
        assert_eq!(bt.bitmap_z().count_ones(), bt.array_y().len(), "{order}");
        assert_eq!(bt.array_z().len(), dataset().len(), "{order}");
    }
}
