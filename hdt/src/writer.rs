//! Writer for HDT files.
//!
//! Terms are partitioned into the four dictionary sections, each sorted in
//! byte order of its HDT string, and the ID triples are encoded in the
//! ordering and format chosen in [`WriterOptions`].
//!
//! ```no_run
//! use hdt::{Term, Triple, write_file};
//!
//! let t = Triple::new(
//!     Term::iri("http://example.org/Alice"),
//!     Term::iri("http://xmlns.com/foaf/0.1/name"),
//!     Term::literal("Alice"),
//! );
//! write_file("example.hdt", &[t]).unwrap();
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::control_info::{ControlInfo, ControlType, HDT_V1, HEADER_NTRIPLES};
use crate::dictionary::{Dictionary, Position};
use crate::error::HdtError;
use crate::options::WriterOptions;
use crate::term::{Term, Triple};
use crate::triples::{IdTriple, TriplesSection};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const HDT_DATASET: &str = "http://purl.org/HDT/hdt#Dataset";
const VOID: &str = "http://rdfs.org/ns/void#";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// Encode `triples` as a complete HDT file with default options.
pub fn serialize(triples: &[Triple]) -> Result<Vec<u8>> {
    serialize_with_options(triples, &WriterOptions::default())
}

/// Encode `triples` as a complete HDT file.
///
/// Duplicate triples are kept; decoding returns the same multiset.
pub fn serialize_with_options(triples: &[Triple], opts: &WriterOptions) -> Result<Vec<u8>> {
    triples.iter().try_for_each(check_predicate)?;
    let mut subjects = BTreeSet::new();
    let mut predicates = BTreeSet::new();
    let mut objects = BTreeSet::new();
    let encoded: Vec<[String; 3]> = triples
        .iter()
        .map(|t| {
            [
                t.subject.to_hdt_string(),
                t.predicate.to_hdt_string(),
                t.object.to_hdt_string(),
            ]
        })
        .collect();
    for [s, p, o] in &encoded {
        subjects.insert(s.as_str());
        predicates.insert(p.as_str());
        objects.insert(o.as_str());
    }
    let shared: Vec<&str> = subjects.intersection(&objects).copied().collect();
    let subjects: Vec<&str> = subjects.difference(&objects).copied().collect();
    let objects: Vec<&str> = objects
        .into_iter()
        .filter(|o| shared.binary_search(o).is_err())
        .collect();
    let predicates: Vec<&str> = predicates.into_iter().collect();

    let ids = IdAssignment::new(&shared, &subjects, &predicates, &objects);
    let mut id_triples = Vec::with_capacity(encoded.len());
    for [s, p, o] in &encoded {
        id_triples.push(ids.resolve(s, p, o)?);
    }

    let roots = match opts.order.levels()[0] {
        Position::Subject => shared.len() + subjects.len(),
        Position::Predicate => predicates.len(),
        Position::Object => shared.len() + objects.len(),
    };

    let mut out = Vec::new();
    ControlInfo::new(ControlType::Global, HDT_V1).encode(&mut out);
    let header = header_text(opts, triples.len(), &shared, &subjects, &predicates, &objects);
    ControlInfo::new(ControlType::Header, HEADER_NTRIPLES)
        .with_property("length", header.len())
        .encode(&mut out);
    out.extend_from_slice(header.as_bytes());
    let dict_len = Dictionary::encode(
        &shared,
        &subjects,
        &predicates,
        &objects,
        opts.block_size,
        &mut out,
    )?;
    let triples_len =
        TriplesSection::encode(&id_triples, opts.order, opts.format, roots, &mut out)?;
    log::info!(
        "serialized {} triples ({:?} {}): dictionary {dict_len} bytes, triples {triples_len} bytes",
        id_triples.len(),
        opts.format,
        opts.order
    );
    Ok(out)
}

fn check_predicate(t: &Triple) -> Result<()> {
    if t.predicate.is_literal() {
        return Err(HdtError::Invalid(format!(
            "literal predicate {}",
            t.predicate
        )));
    }
    Ok(())
}

/// String to ID maps for the subject and object positions (shared strings
/// appear in both) and for predicates.
struct IdAssignment<'a> {
    subject: HashMap<&'a str, u64>,
    predicate: HashMap<&'a str, u64>,
    object: HashMap<&'a str, u64>,
}

impl<'a> IdAssignment<'a> {
    fn new(
        shared: &[&'a str],
        subjects: &[&'a str],
        predicates: &[&'a str],
        objects: &[&'a str],
    ) -> Self {
        fn numbered<'s>(strings: &[&'s str], first: u64) -> Vec<(&'s str, u64)> {
            strings
                .iter()
                .enumerate()
                .map(|(i, s)| (*s, first + i as u64))
                .collect()
        }
        let sh = shared.len() as u64;
        let su = subjects.len() as u64;
        let shared_ids = numbered(shared, 1);
        let subject = shared_ids
            .iter()
            .copied()
            .chain(numbered(subjects, sh + 1))
            .collect();
        let object = shared_ids
            .into_iter()
            .chain(numbered(objects, sh + su + 1))
            .collect();
        let predicate = numbered(predicates, 1).into_iter().collect();
        IdAssignment {
            subject,
            predicate,
            object,
        }
    }

    fn resolve(&self, s: &str, p: &str, o: &str) -> Result<IdTriple> {
        Ok((
            lookup(&self.subject, s, Position::Subject)?,
            lookup(&self.predicate, p, Position::Predicate)?,
            lookup(&self.object, o, Position::Object)?,
        ))
    }
}

fn lookup(map: &HashMap<&str, u64>, v: &str, position: Position) -> Result<u64> {
    map.get(v)
        .copied()
        .ok_or_else(|| HdtError::Invalid(format!("{position} {v} missing from dictionary")))
}

/// N-Triples dataset description stored in the header section.
fn header_text(
    opts: &WriterOptions,
    num_triples: usize,
    shared: &[&str],
    subjects: &[&str],
    predicates: &[&str],
    objects: &[&str],
) -> String {
    let base = Term::iri(opts.base_iri.as_str());
    let count = |n: usize| Term::typed_literal(n.to_string(), XSD_INTEGER);
    let stats = [
        (Term::iri(RDF_TYPE), Term::iri(HDT_DATASET)),
        (Term::iri(format!("{VOID}triples")), count(num_triples)),
        (Term::iri(format!("{VOID}properties")), count(predicates.len())),
        (
            Term::iri(format!("{VOID}distinctSubjects")),
            count(shared.len() + subjects.len()),
        ),
        (
            Term::iri(format!("{VOID}distinctObjects")),
            count(shared.len() + objects.len()),
        ),
    ];
    let mut text = String::new();
    for (p, o) in stats {
        text.push_str(&Triple::new(base.clone(), p, o).to_string());
        text.push('\n');
    }
    text
}

/// Write an HDT file with default options.
pub fn write_file<P: AsRef<Path>>(path: P, triples: &[Triple]) -> Result<()> {
    write_file_with_options(path, triples, WriterOptions::default())
}

/// Write an HDT file with explicit [`WriterOptions`].
///
/// The bytes go to a temporary file next to `path` that is then renamed
/// over it. The temporary file is removed if the rename fails.
pub fn write_file_with_options<P: AsRef<Path>>(
    path: P,
    triples: &[Triple],
    opts: WriterOptions,
) -> Result<()> {
    let bytes = serialize_with_options(triples, &opts)?;
    let tmp_path = path.as_ref().with_extension("hdt.tmp");
    fs::write(&tmp_path, &bytes)?;
    if let Err(e) = fs::rename(&tmp_path, path.as_ref()) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            log::warn!("could not remove {}: {cleanup}", tmp_path.display());
        }
        return Err(e.into());
    }
    Ok(())
}

// ---------------- Streaming writer ----------------

/// Incremental builder for datasets assembled one triple at a time.
///
/// Use [`StreamingWriter::add`] to append triples, then
/// [`StreamingWriter::finalize`] to write the file atomically.
#[derive(Debug)]
pub struct StreamingWriter {
    opts: WriterOptions,
    path: PathBuf,
    triples: Vec<Triple>,
}

impl StreamingWriter {
    /// Create a streaming writer targeting `path` with `opts`.
    pub fn new<P: Into<PathBuf>>(path: P, opts: WriterOptions) -> Self {
        Self {
            opts,
            path: path.into(),
            triples: Vec::new(),
        }
    }

    /// Add one triple to the in-memory builder.
    pub fn add(&mut self, t: Triple) -> Result<()> {
        check_predicate(&t)?;
        self.triples.push(t);
        Ok(())
    }

    /// Number of triples added so far.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Finish building and write the file to disk.
    pub fn finalize(self) -> Result<()> {
        write_file_with_options(&self.path, &self.triples, self.opts)
    }
}

// ---------------- Oxigraph helpers ----------------

#[cfg(feature = "oxigraph")]
impl StreamingWriter {
    pub fn add_oxigraph_graph(&mut self, graph: &oxigraph::model::Graph) -> Result<()> {
        for t in graph.iter() {
            self.add(Triple::try_from(t.into_owned())?)?;
        }
        Ok(())
    }
}

#[cfg(feature = "oxigraph")]
pub fn write_graph_from_oxigraph<P: AsRef<Path>>(
    path: P,
    graph: &oxigraph::model::Graph,
    opts: WriterOptions,
) -> Result<()> {
    let mut w = StreamingWriter::new(path.as_ref(), opts);
    w.add_oxigraph_graph(graph)?;
    w.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_partition_scenario() {
        let x = Term::iri("x");
        let y = Term::iri("y");
        let p = Term::iri("p");
        let triples = vec![
            Triple::new(x.clone(), p.clone(), y.clone()),
            Triple::new(y.clone(), p.clone(), x.clone()),
        ];
        let hdt = crate::Hdt::from_bytes(serialize(&triples).unwrap()).unwrap();
        let dict = hdt.dictionary();
        assert_eq!(dict.num_shared(), 2);
        assert_eq!(dict.num_subjects(), 0);
        assert_eq!(dict.num_objects(), 0);
        assert_eq!(hdt.id(&x, Position::Subject).unwrap(), Some(1));
        assert_eq!(hdt.id(&y, Position::Object).unwrap(), Some(2));

        let (n, ids) = hdt.id_triples(crate::Restriction::S(1)).unwrap();
        assert_eq!(n, 1);
        let ids: Vec<IdTriple> = ids.collect::<Result<_>>().unwrap();
        assert_eq!(ids, vec![(1, 1, 2)]);
        assert_eq!(hdt.triple(ids[0]).unwrap(), triples[0]);
    }

    #[test]
    fn header_describes_dataset() {
        let t = Triple::new(Term::iri("s"), Term::iri("p"), Term::literal("o"));
        let opts = WriterOptions {
            base_iri: "http://example.org/mine".into(),
            ..Default::default()
        };
        let hdt = crate::Hdt::from_bytes(serialize_with_options(&[t], &opts).unwrap()).unwrap();
        let header = hdt.header();
        assert!(header.starts_with(
            "<http://example.org/mine> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> \
             <http://purl.org/HDT/hdt#Dataset> .\n"
        ));
        assert!(header.contains(
            "<http://rdfs.org/ns/void#triples> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        ));
    }

    #[test]
    fn nul_in_term_is_invalid() {
        let t = Triple::new(Term::iri("s"), Term::iri("p"), Term::literal("a\0b"));
        assert!(matches!(serialize(&[t]), Err(HdtError::Invalid(_))));
    }

    #[test]
    fn serialize_rejects_literal_predicate() {
        let t = Triple::new(Term::iri("s"), Term::literal("p"), Term::iri("o"));
        assert!(matches!(serialize(&[t]), Err(HdtError::Invalid(_))));
    }

    #[test]
    fn failed_rename_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let target = dir.path().join("taken.hdt");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();
        let t = Triple::new(Term::iri("s"), Term::iri("p"), Term::iri("o"));
        assert!(matches!(write_file(&target, &[t]), Err(HdtError::Io(_))));
        assert!(!target.with_extension("hdt.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn streaming_rejects_literal_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = StreamingWriter::new(dir.path().join("x.hdt"), WriterOptions::default());
        let t = Triple::new(Term::iri("s"), Term::literal("p"), Term::iri("o"));
        assert!(matches!(w.add(t), Err(HdtError::Invalid(_))));
        assert!(w.is_empty());
    }
}
