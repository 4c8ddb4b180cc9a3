//! Four-section dictionary: shared, subjects, predicates, objects.
//!
//! Term IDs are 1-based and scoped by position:
//!
//! | position  | IDs                                                    |
//! |-----------|--------------------------------------------------------|
//! | subject   | `1..=S` shared, then `S+1..=S+N_s` subject-only          |
//! | predicate | `1..=N_p`                                              |
//! | object    | `1..=S` shared, then `S+N_s+1..=S+N_s+N_o` object-only   |

use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::Result;
use crate::control_info::{ControlInfo, ControlType, DICTIONARY_FOUR};
use crate::dict_section::DictSection;
use crate::error::HdtError;
use crate::options::ReaderOptions;
use crate::term::{Term, classify};

/// Role a term ID plays in a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Subject => "subject",
            Position::Predicate => "predicate",
            Position::Object => "object",
        })
    }
}

/// The ordered IDs valid for one position: at most two contiguous runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequence {
    head: (u64, u64),
    tail: (u64, u64),
}

impl IdSequence {
    /// `1..=n`.
    pub fn contiguous(n: u64) -> Self {
        IdSequence {
            head: (1, n),
            tail: (0, 0),
        }
    }

    fn split(head_len: u64, tail_first: u64, tail_len: u64) -> Self {
        IdSequence {
            head: (1, head_len),
            tail: (tail_first, tail_len),
        }
    }

    pub fn len(&self) -> usize {
        (self.head.1 + self.tail.1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ID at 0-based position `k`.
    pub fn get(&self, k: usize) -> Option<u64> {
        let k = k as u64;
        if k < self.head.1 {
            Some(self.head.0 + k)
        } else if k - self.head.1 < self.tail.1 {
            Some(self.tail.0 + (k - self.head.1))
        } else {
            None
        }
    }

    /// 0-based position of `id`.
    pub fn position(&self, id: u64) -> Option<usize> {
        if id >= self.head.0 && id - self.head.0 < self.head.1 {
            Some((id - self.head.0) as usize)
        } else if self.tail.1 > 0 && id >= self.tail.0 && id - self.tail.0 < self.tail.1 {
            Some((self.head.1 + id - self.tail.0) as usize)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + use<> {
        let (h, t) = (self.head, self.tail);
        (h.0..h.0 + h.1).chain(t.0..t.0 + t.1)
    }
}

/// Parsed four-section dictionary with a bounded term cache.
///
/// The cache lives in a `RefCell`, so a `Dictionary` is not `Sync`.
pub struct Dictionary {
    control: ControlInfo,
    shared: DictSection,
    subjects: DictSection,
    predicates: DictSection,
    objects: DictSection,
    simplify_blank_nodes: bool,
    cache: Option<RefCell<LruCache<(Position, u64), Term>>>,
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("shared", &self.shared.len())
            .field("subjects", &self.subjects.len())
            .field("predicates", &self.predicates.len())
            .field("objects", &self.objects.len())
            .field("simplify_blank_nodes", &self.simplify_blank_nodes)
            .finish_non_exhaustive()
    }
}

impl Dictionary {
    /// Parse the dictionary block (control information plus four sections)
    /// at `offset`; returns it with the number of bytes consumed.
    pub fn parse(bytes: &[u8], offset: usize, opts: &ReaderOptions) -> Result<(Self, usize)> {
        let (control, mut used) = ControlInfo::decode(bytes, offset)?;
        if control.kind != ControlType::Dictionary {
            return Err(HdtError::format(format!(
                "expected dictionary control information at offset {offset}, found {:?}",
                control.kind
            )));
        }
        if !control.format_is(DICTIONARY_FOUR) {
            return Err(HdtError::format(format!(
                "unsupported dictionary format {}",
                control.format
            )));
        }
        if let Some(mapping) = control.get_u64("mapping")? {
            log::debug!("dictionary mapping {mapping}");
        }
        let mut next = || -> Result<DictSection> {
            let (sec, n) = DictSection::parse(bytes, offset + used)?;
            used += n;
            Ok(sec)
        };
        let shared = next()?;
        let subjects = next()?;
        let predicates = next()?;
        let objects = next()?;

        let dict = Dictionary {
            control,
            shared,
            subjects,
            predicates,
            objects,
            simplify_blank_nodes: opts.simplify_blank_nodes,
            cache: NonZeroUsize::new(opts.cache_capacity).map(|c| RefCell::new(LruCache::new(c))),
        };
        if let Some(elements) = dict.control.get_u64("elements")?
            && elements as usize != dict.len()
        {
            log::warn!(
                "dictionary declares {elements} elements but holds {}",
                dict.len()
            );
        }
        log::debug!(
            "dictionary at {offset}: {} shared, {} subjects, {} predicates, {} objects",
            dict.shared.len(),
            dict.subjects.len(),
            dict.predicates.len(),
            dict.objects.len()
        );
        Ok((dict, used))
    }

    pub fn control_info(&self) -> &ControlInfo {
        &self.control
    }

    /// Total number of strings across all sections.
    pub fn len(&self) -> usize {
        self.shared.len() + self.subjects.len() + self.predicates.len() + self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_shared(&self) -> usize {
        self.shared.len()
    }

    /// Subject-only strings.
    pub fn num_subjects(&self) -> usize {
        self.subjects.len()
    }

    pub fn num_predicates(&self) -> usize {
        self.predicates.len()
    }

    /// Object-only strings.
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn simplify_blank_nodes(&self) -> bool {
        self.simplify_blank_nodes
    }

    pub fn id_sequence(&self, position: Position) -> IdSequence {
        let shared = self.shared.len() as u64;
        let subjects = self.subjects.len() as u64;
        match position {
            Position::Subject => IdSequence::contiguous(shared + subjects),
            Position::Predicate => IdSequence::contiguous(self.predicates.len() as u64),
            Position::Object => {
                IdSequence::split(shared, shared + subjects + 1, self.objects.len() as u64)
            }
        }
    }

    /// Section holding `id` at `position`, the 0-based index within it, and
    /// the first ID the section covers.
    fn locate(&self, id: u64, position: Position) -> Option<(&DictSection, usize, u64)> {
        if id == 0 {
            return None;
        }
        let shared = self.shared.len() as u64;
        let subjects = self.subjects.len() as u64;
        let (sec, first) = match position {
            Position::Predicate => (&self.predicates, 1),
            _ if id <= shared => (&self.shared, 1),
            Position::Subject => (&self.subjects, shared + 1),
            Position::Object => (&self.objects, shared + subjects + 1),
        };
        if id < first {
            return None;
        }
        let index = usize::try_from(id - first).ok()?;
        (index < sec.len()).then_some((sec, index, first))
    }

    /// Resolve `id` at `position` to a term.
    ///
    /// Subject and predicate lookups go through the LRU cache; every string
    /// decoded on the way to `id` is cached too. Object lookups bypass it.
    pub fn term(&self, bytes: &[u8], id: u64, position: Position) -> Result<Term> {
        let (sec, index, first) = self
            .locate(id, position)
            .ok_or(HdtError::LookupMiss { id, position })?;
        let cache = self.cache.as_ref().filter(|_| position != Position::Object);
        let Some(cache) = cache else {
            let s = sec.string(bytes, index)?;
            return Ok(classify(&s, id, self.simplify_blank_nodes));
        };
        if let Some(t) = cache.borrow_mut().get(&(position, id)) {
            return Ok(t.clone());
        }
        let mut found = None;
        let mut cache = cache.borrow_mut();
        let block = index / sec.block_size();
        sec.scan_block(bytes, block, Some(index), |i, s| {
            let gid = first + i as u64;
            let term = classify(s, gid, self.simplify_blank_nodes);
            if i == index {
                found = Some(term.clone());
            }
            cache.put((position, gid), term);
        })?;
        found.ok_or(HdtError::LookupMiss { id, position })
    }

    /// Resolve a term to its ID at `position`, or `None` if it is absent.
    ///
    /// Tries a binary search on the term's dictionary string first, then falls
    /// back to a sequential scan that compares decoded terms. Neither path
    /// touches the cache.
    pub fn id(&self, bytes: &[u8], term: &Term, position: Position) -> Result<Option<u64>> {
        let shared = self.shared.len() as u64;
        let subjects = self.subjects.len() as u64;
        let sections: Vec<(&DictSection, u64)> = match position {
            Position::Subject => vec![(&self.shared, 1), (&self.subjects, shared + 1)],
            Position::Predicate => vec![(&self.predicates, 1)],
            Position::Object => vec![(&self.shared, 1), (&self.objects, shared + subjects + 1)],
        };
        if !self.simplify_blank_nodes {
            let raw = term.to_hdt_string();
            for &(sec, first) in &sections {
                if let Some(i) = sec.locate(bytes, &raw)? {
                    return Ok(Some(first + i as u64));
                }
            }
        }
        for (sec, first) in sections {
            for (i, s) in sec.iter(bytes).enumerate() {
                let gid = first + i as u64;
                if classify(&s?, gid, self.simplify_blank_nodes) == *term {
                    return Ok(Some(gid));
                }
            }
        }
        Ok(None)
    }

    /// Encode a dictionary block. Each section must already be sorted in
    /// byte order; returns the bytes written.
    pub fn encode<S: AsRef<str>>(
        shared: &[S],
        subjects: &[S],
        predicates: &[S],
        objects: &[S],
        block_size: usize,
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        let start = out.len();
        let elements = shared.len() + subjects.len() + predicates.len() + objects.len();
        ControlInfo::new(ControlType::Dictionary, DICTIONARY_FOUR)
            .with_property("mapping", 1)
            .with_property("elements", elements)
            .encode(out);
        for sec in [shared, subjects, predicates, objects] {
            DictSection::encode(sec, block_size, out)?;
        }
        Ok(out.len() - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED: [&str; 2] = ["http://ex.org/x", "http://ex.org/y"];
    const SUBJECTS: [&str; 3] = ["_:b1", "http://ex.org/a", "http://ex.org/b"];
    const PREDICATES: [&str; 2] = ["http://ex.org/p", "http://ex.org/q"];
    const OBJECTS: [&str; 3] = ["\"lit\"", "\"lit\"@en", "http://ex.org/z"];

    fn build(opts: &ReaderOptions) -> (Vec<u8>, Dictionary) {
        let mut buf = Vec::new();
        Dictionary::encode(&SHARED, &SUBJECTS, &PREDICATES, &OBJECTS, 2, &mut buf).unwrap();
        let (dict, used) = Dictionary::parse(&buf, 0, opts).unwrap();
        assert_eq!(used, buf.len());
        (buf, dict)
    }

    #[test]
    fn id_ranges_per_position() {
        let (_, d) = build(&ReaderOptions::default());
        assert_eq!(d.len(), 10);
        let subj: Vec<u64> = d.id_sequence(Position::Subject).iter().collect();
        assert_eq!(subj, vec![1, 2, 3, 4, 5]);
        let pred: Vec<u64> = d.id_sequence(Position::Predicate).iter().collect();
        assert_eq!(pred, vec![1, 2]);
        let obj: Vec<u64> = d.id_sequence(Position::Object).iter().collect();
        assert_eq!(obj, vec![1, 2, 6, 7, 8]);
        let seq = d.id_sequence(Position::Object);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.get(2), Some(6));
        assert_eq!(seq.get(5), None);
        assert_eq!(seq.position(7), Some(3));
        assert_eq!(seq.position(3), None);
    }

    #[test]
    fn term_lookup_by_position() {
        let (buf, d) = build(&ReaderOptions::default());
        assert_eq!(d.term(&buf, 1, Position::Subject).unwrap(), Term::iri(SHARED[0]));
        assert_eq!(d.term(&buf, 2, Position::Object).unwrap(), Term::iri(SHARED[1]));
        assert_eq!(d.term(&buf, 3, Position::Subject).unwrap(), Term::bnode("b1"));
        assert_eq!(d.term(&buf, 2, Position::Predicate).unwrap(), Term::iri(PREDICATES[1]));
        assert_eq!(d.term(&buf, 6, Position::Object).unwrap(), Term::literal("lit"));
        assert_eq!(
            d.term(&buf, 7, Position::Object).unwrap(),
            Term::lang_literal("lit", "en")
        );
        for (id, pos) in [
            (0, Position::Subject),
            (6, Position::Subject),
            (3, Position::Object),
            (9, Position::Object),
            (3, Position::Predicate),
        ] {
            match d.term(&buf, id, pos) {
                Err(HdtError::LookupMiss { id: got, position }) => {
                    assert_eq!((got, position), (id, pos));
                }
                other => panic!("expected lookup miss for {id} {pos}, got {other:?}"),
            }
        }
    }

    #[test]
    fn id_is_inverse_of_term() {
        for opts in [
            ReaderOptions::default(),
            ReaderOptions {
                cache_capacity: 0,
                ..Default::default()
            },
            ReaderOptions {
                cache_capacity: 1,
                ..Default::default()
            },
        ] {
            let (buf, d) = build(&opts);
            for pos in [Position::Subject, Position::Predicate, Position::Object] {
                for id in d.id_sequence(pos).iter() {
                    let t = d.term(&buf, id, pos).unwrap();
                    assert_eq!(d.id(&buf, &t, pos).unwrap(), Some(id), "{pos} {id}");
                }
            }
            assert_eq!(
                d.id(&buf, &Term::iri("http://ex.org/z"), Position::Subject).unwrap(),
                None
            );
            assert_eq!(
                d.id(&buf, &Term::literal("missing"), Position::Object).unwrap(),
                None
            );
        }
    }

    #[test]
    fn simplified_blank_nodes_use_ids() {
        let opts = ReaderOptions {
            simplify_blank_nodes: true,
            ..Default::default()
        };
        let (buf, d) = build(&opts);
        assert_eq!(d.term(&buf, 3, Position::Subject).unwrap(), Term::BNode("b3".into()));
        assert_eq!(
            d.id(&buf, &Term::BNode("b3".into()), Position::Subject).unwrap(),
            Some(3)
        );
        assert_eq!(
            d.id(&buf, &Term::bnode("b1"), Position::Subject).unwrap(),
            None
        );
    }

    #[test]
    fn cached_lookups_agree_with_uncached() {
        let (buf, cached) = build(&ReaderOptions::default());
        let (_, plain) = build(&ReaderOptions {
            cache_capacity: 0,
            ..Default::default()
        });
        // twice, so the second pass is served from the cache
        for _ in 0..2 {
            for id in 1..=5 {
                assert_eq!(
                    cached.term(&buf, id, Position::Subject).unwrap(),
                    plain.term(&buf, id, Position::Subject).unwrap()
                );
            }
        }
    }

    #[test]
    fn rejects_wrong_block_kind_and_format() {
        let mut buf = Vec::new();
        ControlInfo::new(ControlType::Triples, DICTIONARY_FOUR).encode(&mut buf);
        assert!(matches!(
            Dictionary::parse(&buf, 0, &ReaderOptions::default()),
            Err(HdtError::Format(_))
        ));
        buf.clear();
        ControlInfo::new(ControlType::Dictionary, "<http://purl.org/HDT/hdt#dictionaryLiterals>")
            .encode(&mut buf);
        assert!(matches!(
            Dictionary::parse(&buf, 0, &ReaderOptions::default()),
            Err(HdtError::Format(_))
        ));
    }
}
