//! Reader for HDT files: open, inspect sections, and match triple patterns.
//!
//! The primary entry point is [`Hdt`]. It owns the file bytes (or a memory
//! map with the `mmap` feature) and every parsed section borrows from them
//! only while a lookup or iterator is alive.
//!
//! ```no_run
//! use hdt::{Hdt, Term};
//! use std::path::Path;
//!
//! let hdt = Hdt::open(Path::new("data.hdt")).expect("open");
//! let s = Term::iri("http://example.org/alice");
//! for t in hdt.triples_matching(Some(&s), None, None).unwrap() {
//!     println!("{}", t.unwrap());
//! }
//! ```

use std::fs;
use std::path::Path;

use crate::Result;
use crate::control_info::{ControlInfo, ControlType, HDT_V1, HEADER_NTRIPLES};
use crate::cursor::ByteReader;
use crate::dictionary::{Dictionary, Position};
use crate::error::HdtError;
use crate::options::ReaderOptions;
use crate::term::{Term, Triple};
use crate::triples::{IdTriple, IdTripleIter, Restriction, TripleOrder, TriplesSection};

#[derive(Debug)]
enum Backing {
    Owned(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mmap(memmap2::Mmap),
}

impl Backing {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v.as_slice(),
            #[cfg(feature = "mmap")]
            Backing::Mmap(m) => m,
        }
    }
}

/// An opened HDT file.
#[derive(Debug)]
pub struct Hdt {
    backing: Backing,
    global: ControlInfo,
    header_control: ControlInfo,
    header: String,
    dictionary: Dictionary,
    triples: TriplesSection,
}

impl Hdt {
    #[inline]
    fn bytes(&self) -> &[u8] {
        self.backing.as_bytes()
    }

    /// Read `path` into memory and parse it with default options.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_options(path, &ReaderOptions::default())
    }

    pub fn open_with_options(path: &Path, opts: &ReaderOptions) -> Result<Self> {
        let data = fs::read(path)?;
        log::debug!("read {} bytes from {}", data.len(), path.display());
        Self::load(Backing::Owned(data), opts)
    }

    #[cfg(feature = "mmap")]
    /// Open an HDT file through `memmap2` without copying it.
    ///
    /// Enabled with the `mmap` feature. The file must not be modified while
    /// the returned value is alive.
    pub fn open_mmap(path: &Path) -> Result<Self> {
        Self::open_mmap_with_options(path, &ReaderOptions::default())
    }

    #[cfg(feature = "mmap")]
    pub fn open_mmap_with_options(path: &Path, opts: &ReaderOptions) -> Result<Self> {
        let f = fs::File::open(path)?;
        let mmap = unsafe { memmap2::MmapOptions::new().map(&f) }?;
        log::debug!("mapped {} bytes from {}", mmap.len(), path.display());
        Self::load(Backing::Mmap(mmap), opts)
    }

    /// Parse an HDT file already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(data, &ReaderOptions::default())
    }

    pub fn from_bytes_with_options(data: Vec<u8>, opts: &ReaderOptions) -> Result<Self> {
        Self::load(Backing::Owned(data), opts)
    }

    fn load(backing: Backing, opts: &ReaderOptions) -> Result<Self> {
        let data = backing.as_bytes();

        let (global, mut pos) = ControlInfo::decode(data, 0)?;
        if global.kind != ControlType::Global || !global.format_is(HDT_V1) {
            return Err(HdtError::format(format!(
                "not an HDT file: global control information is {:?} {}",
                global.kind, global.format
            )));
        }

        let (header_control, n) = ControlInfo::decode(data, pos)?;
        if header_control.kind != ControlType::Header {
            return Err(HdtError::format(format!(
                "expected header control information at offset {pos}, found {:?}",
                header_control.kind
            )));
        }
        if !header_control.format_is(HEADER_NTRIPLES) {
            return Err(HdtError::format(format!(
                "unsupported header format {}",
                header_control.format
            )));
        }
        pos += n;
        let length = header_control
            .get_u64("length")?
            .ok_or_else(|| HdtError::format("header control information has no length"))?;
        let length = usize::try_from(length)
            .map_err(|_| HdtError::decode(format!("header length {length} too large")))?;
        let mut r = ByteReader::new(data, pos);
        let header = std::str::from_utf8(r.read_bytes(length)?)
            .map_err(|e| HdtError::decode(format!("header is not UTF-8: {e}")))?
            .to_string();
        pos = r.pos();
        log::debug!("header: {length} bytes, dictionary at {pos}");

        let (dictionary, n) = Dictionary::parse(data, pos, opts)?;
        pos += n;
        log::debug!("dictionary: {n} bytes, triples at {pos}");

        let (triples, n) = TriplesSection::parse(data, pos, &dictionary)?;
        pos += n;
        if pos < data.len() {
            log::debug!("ignoring {} trailing bytes after triples", data.len() - pos);
        }
        log::info!(
            "opened HDT: {} triples ({}), {} dictionary strings",
            triples.len(),
            triples.order(),
            dictionary.len()
        );

        Ok(Hdt {
            backing,
            global,
            header_control,
            header,
            dictionary,
            triples,
        })
    }

    /// Header section text (N-Triples describing the dataset).
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn global_control_info(&self) -> &ControlInfo {
        &self.global
    }

    pub fn header_control_info(&self) -> &ControlInfo {
        &self.header_control
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn triples_section(&self) -> &TriplesSection {
        &self.triples
    }

    pub fn order(&self) -> TripleOrder {
        self.triples.order()
    }

    /// Number of stored triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Term for `id` at `position`.
    pub fn term(&self, id: u64, position: Position) -> Result<Term> {
        self.dictionary.term(self.bytes(), id, position)
    }

    /// ID of `term` at `position`, if the dictionary holds it there.
    pub fn id(&self, term: &Term, position: Position) -> Result<Option<u64>> {
        self.dictionary.id(self.bytes(), term, position)
    }

    /// Resolve an `(s, p, o)` ID triple to terms.
    pub fn triple(&self, (s, p, o): IdTriple) -> Result<Triple> {
        Ok(Triple::new(
            self.term(s, Position::Subject)?,
            self.term(p, Position::Predicate)?,
            self.term(o, Position::Object)?,
        ))
    }

    /// Exact match count and ID stream for a restriction on the index.
    pub fn id_triples(&self, restriction: Restriction) -> Result<(u64, IdTripleIter<'_>)> {
        self.triples.id_triples(self.bytes(), restriction)
    }

    /// Every stored triple.
    pub fn triples(&self) -> Result<TripleIter<'_>> {
        self.triples_matching(None, None, None)
    }

    /// Triples matching a pattern; `None` positions are variables.
    ///
    /// A bound term that is not in the dictionary yields an empty result.
    /// Any bound term on an index that is not SPO ordered fails with
    /// [`HdtError::UnsupportedOrdering`].
    pub fn triples_matching(
        &self,
        s: Option<&Term>,
        p: Option<&Term>,
        o: Option<&Term>,
    ) -> Result<TripleIter<'_>> {
        Ok(match self.plan(s, p, o)? {
            Some((restriction, pattern)) => {
                let (_, inner) = self.id_triples(restriction)?;
                TripleIter {
                    hdt: self,
                    inner: Some(inner),
                    pattern,
                }
            }
            None => TripleIter {
                hdt: self,
                inner: None,
                pattern: (None, None, None),
            },
        })
    }

    /// Number of triples [`Hdt::triples_matching`] would yield, counting
    /// those whose terms fail to resolve.
    pub fn count_matching(
        &self,
        s: Option<&Term>,
        p: Option<&Term>,
        o: Option<&Term>,
    ) -> Result<u64> {
        let Some((restriction, pattern)) = self.plan(s, p, o)? else {
            return Ok(0);
        };
        let (count, ids) = self.id_triples(restriction)?;
        if covers(restriction, pattern) {
            return Ok(count);
        }
        let mut n = 0;
        for t in ids {
            n += u64::from(matches_pattern(pattern, t?));
        }
        Ok(n)
    }

    /// Resolve bound terms and pick the longest restriction prefix. `None`
    /// when a bound term is absent from the dictionary.
    fn plan(
        &self,
        s: Option<&Term>,
        p: Option<&Term>,
        o: Option<&Term>,
    ) -> Result<Option<(Restriction, IdPattern)>> {
        if (s.is_some() || p.is_some() || o.is_some()) && self.order() != TripleOrder::SPO {
            return Err(HdtError::UnsupportedOrdering(self.order()));
        }
        let mut ids = [None; 3];
        for (slot, (term, position)) in ids.iter_mut().zip([
            (s, Position::Subject),
            (p, Position::Predicate),
            (o, Position::Object),
        ]) {
            let Some(term) = term else { continue };
            match self.id(term, position)? {
                Some(id) => *slot = Some(id),
                None => {
                    log::debug!("{position} {term} is not in the dictionary");
                    return Ok(None);
                }
            }
        }
        let pattern = (ids[0], ids[1], ids[2]);
        let restriction = match pattern {
            (Some(s), Some(p), Some(o)) => Restriction::SPO(s, p, o),
            (Some(s), Some(p), None) => Restriction::SP(s, p),
            (Some(s), None, _) => Restriction::S(s),
            (None, _, _) => Restriction::All,
        };
        Ok(Some((restriction, pattern)))
    }

    #[cfg(feature = "oxigraph")]
    /// Decode every triple into an in-memory `oxigraph` graph.
    pub fn to_oxigraph_graph(&self) -> Result<oxigraph::model::Graph> {
        let mut g = oxigraph::model::Graph::new();
        for t in self.triples()? {
            g.insert(&oxigraph::model::Triple::try_from(&t?)?);
        }
        Ok(g)
    }
}

type IdPattern = (Option<u64>, Option<u64>, Option<u64>);

fn matches_pattern((ps, pp, po): IdPattern, (s, p, o): IdTriple) -> bool {
    ps.is_none_or(|v| v == s) && pp.is_none_or(|v| v == p) && po.is_none_or(|v| v == o)
}

/// True when `restriction` already enforces every bound position.
fn covers(restriction: Restriction, pattern: IdPattern) -> bool {
    match restriction {
        Restriction::All => pattern == (None, None, None),
        Restriction::S(_) => pattern.1.is_none() && pattern.2.is_none(),
        Restriction::SP(..) => pattern.2.is_none(),
        Restriction::SPO(..) => true,
    }
}

/// Lazy stream of matching triples.
///
/// Triples whose IDs fail to resolve to terms are logged and skipped. Decode
/// errors from the index are yielded where they occur.
#[derive(Debug)]
pub struct TripleIter<'a> {
    hdt: &'a Hdt,
    inner: Option<IdTripleIter<'a>>,
    pattern: IdPattern,
}

impl Iterator for TripleIter<'_> {
    type Item = Result<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;
        loop {
            let ids = match inner.next()? {
                Ok(t) => t,
                Err(e) => return Some(Err(e)),
            };
            if !matches_pattern(self.pattern, ids) {
                continue;
            }
            match self.hdt.triple(ids) {
                Ok(t) => return Some(Ok(t)),
                Err(HdtError::LookupMiss { id, position }) => {
                    log::warn!("dropping triple {ids:?}: no term for {position} id {id}");
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::serialize;

    fn iri(s: &str) -> Term {
        Term::iri(format!("http://ex.org/{s}"))
    }

    fn sample() -> Vec<Triple> {
        vec![
            Triple::new(iri("a"), iri("p"), iri("b")),
            Triple::new(iri("a"), iri("q"), Term::literal("x")),
            Triple::new(iri("b"), iri("p"), iri("a")),
        ]
    }

    #[test]
    fn rejects_bad_cookie() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[0] = b'#';
        assert!(matches!(Hdt::from_bytes(bytes), Err(HdtError::Format(_))));
        assert!(matches!(Hdt::from_bytes(Vec::new()), Err(HdtError::Format(_))));
    }

    #[test]
    fn header_and_controls() {
        let hdt = Hdt::from_bytes(serialize(&sample()).unwrap()).unwrap();
        assert!(hdt.global_control_info().format_is(HDT_V1));
        assert!(hdt.header().contains("<http://purl.org/HDT/hdt#Dataset>"));
        let len = hdt.header_control_info().get_u64("length").unwrap();
        assert_eq!(len, Some(hdt.header().len() as u64));
        assert_eq!(hdt.len(), 3);
        assert_eq!(hdt.order(), TripleOrder::SPO);
    }

    #[test]
    fn residual_filter_on_predicate_only() {
        let hdt = Hdt::from_bytes(serialize(&sample()).unwrap()).unwrap();
        let p = iri("p");
        let got: Vec<Triple> = hdt
            .triples_matching(None, Some(&p), None)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|t| t.predicate == p));
        assert_eq!(hdt.count_matching(None, Some(&p), None).unwrap(), 2);
        let a = iri("a");
        assert_eq!(hdt.count_matching(Some(&a), None, None).unwrap(), 2);
        assert_eq!(hdt.count_matching(Some(&a), None, Some(&iri("b"))).unwrap(), 1);
    }

    #[test]
    fn unknown_term_matches_nothing() {
        let hdt = Hdt::from_bytes(serialize(&sample()).unwrap()).unwrap();
        let nope = iri("nope");
        assert_eq!(hdt.triples_matching(Some(&nope), None, None).unwrap().count(), 0);
        assert_eq!(hdt.count_matching(None, None, Some(&nope)).unwrap(), 0);
        // an object-only term asked for as subject
        let lit = Term::literal("x");
        assert_eq!(hdt.count_matching(Some(&lit), None, None).unwrap(), 0);
    }
}
