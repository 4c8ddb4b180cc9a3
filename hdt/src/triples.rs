//! Triples section: bitmap adjacency trees and flat lists.
//!
//! A bitmap section stores a three-level tree. The roots are the IDs of the
//! ordering's first position (`IdSequence` of that position), `arrayY` holds
//! their children and `arrayZ` the grandchildren. `bitmapY`/`bitmapZ` mark the
//! last child of each parent with a set bit:
//!
//! ```text
//! roots     1         2
//! bitmapY   0 1       1
//! arrayY    p1 p2     p1
//! bitmapZ   1  0 1    1
//! arrayZ    o1 o2 o3  o1
//! ```
//!
//! Decoding pairs each parent with the run of children up to and including
//! the next set bit, once for the roots and again for the level-1 pairs.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::bitmap::Bitmap;
use crate::control_info::{ControlInfo, ControlType, TRIPLES_BITMAP, TRIPLES_LIST};
use crate::crc::crc32;
use crate::cursor::ByteReader;
use crate::dictionary::{Dictionary, IdSequence, Position};
use crate::error::HdtError;
use crate::log_array::LogArray;

/// `(subject, predicate, object)` IDs, or the three physical levels before
/// remapping.
pub type IdTriple = (u64, u64, u64);

/// Physical nesting order of a triples section.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripleOrder {
    SPO = 1,
    SOP = 2,
    PSO = 3,
    POS = 4,
    OSP = 5,
    OPS = 6,
}

impl TripleOrder {
    pub const ALL: [TripleOrder; 6] = [
        TripleOrder::SPO,
        TripleOrder::SOP,
        TripleOrder::PSO,
        TripleOrder::POS,
        TripleOrder::OSP,
        TripleOrder::OPS,
    ];

    /// Ordering for the `order` control property.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|o| *o as u64 == code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Position held by each physical level.
    pub fn levels(self) -> [Position; 3] {
        use Position::{Object as O, Predicate as P, Subject as S};
        match self {
            Self::SPO => [S, P, O],
            Self::SOP => [S, O, P],
            Self::PSO => [P, S, O],
            Self::POS => [P, O, S],
            Self::OSP => [O, S, P],
            Self::OPS => [O, P, S],
        }
    }

    /// Physical `(level0, level1, level2)` to `(s, p, o)`.
    #[inline]
    pub fn to_spo(self, (a, b, c): IdTriple) -> IdTriple {
        match self {
            Self::SPO => (a, b, c),
            Self::SOP => (a, c, b),
            Self::PSO => (b, a, c),
            Self::POS => (c, a, b),
            Self::OSP => (b, c, a),
            Self::OPS => (c, b, a),
        }
    }

    /// `(s, p, o)` to physical `(level0, level1, level2)`.
    #[inline]
    pub fn from_spo(self, (s, p, o): IdTriple) -> IdTriple {
        match self {
            Self::SPO => (s, p, o),
            Self::SOP => (s, o, p),
            Self::PSO => (p, s, o),
            Self::POS => (p, o, s),
            Self::OSP => (o, s, p),
            Self::OPS => (o, p, s),
        }
    }
}

impl fmt::Display for TripleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Encoding of the triples payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriplesFormat {
    Bitmap,
    List,
}

impl TriplesFormat {
    pub fn control_format(self) -> &'static str {
        match self {
            TriplesFormat::Bitmap => TRIPLES_BITMAP,
            TriplesFormat::List => TRIPLES_LIST,
        }
    }
}

/// What the triples control information says about its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriplesMetadata {
    pub format: TriplesFormat,
    pub order: TripleOrder,
    pub num_triples: Option<u64>,
    /// Byte offset of the payload, just past the control information.
    pub offset: usize,
}

/// Bound positions of a pattern, as a prefix of SPO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Restriction {
    #[default]
    All,
    S(u64),
    SP(u64, u64),
    SPO(u64, u64, u64),
}

impl Restriction {
    pub fn matches(&self, (s, p, o): IdTriple) -> bool {
        match *self {
            Restriction::All => true,
            Restriction::S(rs) => s == rs,
            Restriction::SP(rs, rp) => s == rs && p == rp,
            Restriction::SPO(rs, rp, ro) => s == rs && p == rp && o == ro,
        }
    }
}

/// A parsed triples section.
#[derive(Debug, Clone)]
pub struct TriplesSection {
    control: ControlInfo,
    meta: TriplesMetadata,
    index: TriplesIndex,
}

/// The payload, dispatched on the control information's format.
#[derive(Debug, Clone)]
pub enum TriplesIndex {
    Bitmap(BitmapTriples),
    List(ListTriples),
}

impl TriplesSection {
    /// Parse the triples block at `offset`. The dictionary supplies the root
    /// ID sequence of a bitmap index.
    pub fn parse(bytes: &[u8], offset: usize, dict: &Dictionary) -> Result<(Self, usize)> {
        let (control, ci_len) = ControlInfo::decode(bytes, offset)?;
        if control.kind != ControlType::Triples {
            return Err(HdtError::format(format!(
                "expected triples control information at offset {offset}, found {:?}",
                control.kind
            )));
        }
        let code = control
            .get_u64("order")?
            .ok_or_else(|| HdtError::format("triples control information has no order"))?;
        let order = TripleOrder::from_code(code)
            .ok_or_else(|| HdtError::format(format!("unknown triple order {code}")))?;
        let num_triples = control.get_u64("numTriples")?;
        let payload = offset + ci_len;

        let (index, format, used) = if control.format_is(TRIPLES_BITMAP) {
            let top = dict.id_sequence(order.levels()[0]);
            let (bt, used) = BitmapTriples::parse(bytes, payload, order, top)?;
            if let Some(n) = num_triples
                && n != bt.len() as u64
            {
                return Err(HdtError::decode(format!(
                    "numTriples is {n} but arrayZ holds {}",
                    bt.len()
                )));
            }
            (TriplesIndex::Bitmap(bt), TriplesFormat::Bitmap, used)
        } else if control.format_is(TRIPLES_LIST) {
            let n = num_triples
                .ok_or_else(|| HdtError::format("list triples without numTriples"))?;
            let n = usize::try_from(n)
                .map_err(|_| HdtError::decode(format!("numTriples {n} does not fit in usize")))?;
            let (lt, used) = ListTriples::parse(bytes, payload, order, n)?;
            (TriplesIndex::List(lt), TriplesFormat::List, used)
        } else {
            return Err(HdtError::format(format!(
                "unsupported triples format {}",
                control.format
            )));
        };
        log::debug!("triples at {offset}: {format:?} {order}, {used} payload bytes");
        let meta = TriplesMetadata {
            format,
            order,
            num_triples,
            offset: payload,
        };
        Ok((
            TriplesSection {
                control,
                meta,
                index,
            },
            ci_len + used,
        ))
    }

    pub fn control_info(&self) -> &ControlInfo {
        &self.control
    }

    pub fn metadata(&self) -> &TriplesMetadata {
        &self.meta
    }

    pub fn index(&self) -> &TriplesIndex {
        &self.index
    }

    pub fn order(&self) -> TripleOrder {
        self.meta.order
    }

    /// Number of stored triples.
    pub fn len(&self) -> usize {
        match &self.index {
            TriplesIndex::Bitmap(b) => b.len(),
            TriplesIndex::List(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact number of matches and a lazy stream of `(s, p, o)` IDs.
    ///
    /// Anything but [`Restriction::All`] requires SPO order.
    pub fn id_triples<'a>(
        &'a self,
        bytes: &'a [u8],
        restriction: Restriction,
    ) -> Result<(u64, IdTripleIter<'a>)> {
        Ok(match &self.index {
            TriplesIndex::Bitmap(b) => {
                let (n, it) = b.id_triples(bytes, restriction)?;
                (n, IdTripleIter::Bitmap(it))
            }
            TriplesIndex::List(l) => {
                let (n, it) = l.id_triples(bytes, restriction)?;
                (n, IdTripleIter::List(it))
            }
        })
    }

    /// Encode `triples` (in SPO IDs) as a complete triples block.
    ///
    /// `roots` is the length of the ID sequence of the order's first
    /// position; every ID in it must occur in that position.
    pub fn encode(
        triples: &[IdTriple],
        order: TripleOrder,
        format: TriplesFormat,
        roots: usize,
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        let start = out.len();
        let mut physical: Vec<IdTriple> = triples.iter().map(|t| order.from_spo(*t)).collect();
        physical.sort_unstable();
        ControlInfo::new(ControlType::Triples, format.control_format())
            .with_property("order", order.code())
            .with_property("numTriples", physical.len())
            .encode(out);
        match format {
            TriplesFormat::Bitmap => BitmapTriples::encode(&physical, roots, out)?,
            TriplesFormat::List => ListTriples::encode(&physical, out)?,
        }
        Ok(out.len() - start)
    }
}

/// Lazy stream of `(s, p, o)` IDs from either index kind.
#[derive(Debug)]
pub enum IdTripleIter<'a> {
    Bitmap(BitmapIter<'a>),
    List(ListIter<'a>),
}

impl Iterator for IdTripleIter<'_> {
    type Item = Result<IdTriple>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            IdTripleIter::Bitmap(it) => it.next(),
            IdTripleIter::List(it) => it.next(),
        }
    }
}

// ---------------- Bitmap triples ----------------

#[derive(Debug, Clone)]
pub struct BitmapTriples {
    order: TripleOrder,
    top: IdSequence,
    bitmap_y: Bitmap,
    bitmap_z: Bitmap,
    array_y: LogArray,
    array_z: LogArray,
}

impl BitmapTriples {
    /// Parse `bitmapY | bitmapZ | arrayY | arrayZ` at `offset` and check that
    /// the tree is consistent with `top`, the root ID sequence.
    pub fn parse(
        bytes: &[u8],
        offset: usize,
        order: TripleOrder,
        top: IdSequence,
    ) -> Result<(Self, usize)> {
        let mut pos = offset;
        let (bitmap_y, n) = Bitmap::parse(bytes, pos)?;
        pos += n;
        let (bitmap_z, n) = Bitmap::parse(bytes, pos)?;
        pos += n;
        let (array_y, n) = LogArray::parse(bytes, pos)?;
        pos += n;
        let (array_z, n) = LogArray::parse(bytes, pos)?;
        pos += n;

        if bitmap_y.len() != array_y.len() || bitmap_z.len() != array_z.len() {
            return Err(HdtError::decode(format!(
                "bitmap/array length mismatch: Y {}/{}, Z {}/{}",
                bitmap_y.len(),
                array_y.len(),
                bitmap_z.len(),
                array_z.len()
            )));
        }
        if bitmap_y.count_ones() != top.len() {
            return Err(HdtError::decode(format!(
                "bitmapY has {} runs for {} root IDs",
                bitmap_y.count_ones(),
                top.len()
            )));
        }
        if bitmap_z.count_ones() != array_y.len() {
            return Err(HdtError::decode(format!(
                "bitmapZ has {} runs for {} level-1 entries",
                bitmap_z.count_ones(),
                array_y.len()
            )));
        }
        for (name, bm) in [("bitmapY", &bitmap_y), ("bitmapZ", &bitmap_z)] {
            if !bm.is_empty() && bm.get(bytes, bm.len() - 1) != Some(true) {
                return Err(HdtError::decode(format!("{name} does not end a run")));
            }
        }
        let bt = BitmapTriples {
            order,
            top,
            bitmap_y,
            bitmap_z,
            array_y,
            array_z,
        };
        Ok((bt, pos - offset))
    }

    pub fn len(&self) -> usize {
        self.array_z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array_z.is_empty()
    }

    pub fn order(&self) -> TripleOrder {
        self.order
    }

    pub fn bitmap_y(&self) -> &Bitmap {
        &self.bitmap_y
    }

    pub fn bitmap_z(&self) -> &Bitmap {
        &self.bitmap_z
    }

    pub fn array_y(&self) -> &LogArray {
        &self.array_y
    }

    pub fn array_z(&self) -> &LogArray {
        &self.array_z
    }

    /// Inclusive range of `arrayY` holding the children of root `k`.
    fn y_run(&self, bytes: &[u8], k: usize) -> Result<(usize, usize)> {
        run(&self.bitmap_y, bytes, k).ok_or_else(|| HdtError::decode(format!("no bitmapY run {k}")))
    }

    /// Inclusive range of `arrayZ` holding the children of level-1 entry `j`.
    fn z_run(&self, bytes: &[u8], j: usize) -> Result<(usize, usize)> {
        run(&self.bitmap_z, bytes, j).ok_or_else(|| HdtError::decode(format!("no bitmapZ run {j}")))
    }

    fn value_y(&self, bytes: &[u8], j: usize) -> Result<u64> {
        self.array_y
            .get(bytes, j)
            .ok_or_else(|| HdtError::decode(format!("arrayY index {j} out of bounds")))
    }

    fn iter<'a>(
        &'a self,
        bytes: &'a [u8],
        roots: Range<usize>,
        ys: Range<usize>,
        zs: Range<usize>,
        object: Option<u64>,
    ) -> BitmapIter<'a> {
        let parents = TopIds {
            seq: self.top,
            next: roots.start,
            end: roots.end,
        };
        let level1 = PairGen::new(parents, &self.bitmap_y, &self.array_y, bytes, ys);
        let level2 = PairGen::new(level1, &self.bitmap_z, &self.array_z, bytes, zs);
        BitmapIter {
            pairs: level2,
            object,
            order: self.order,
        }
    }

    pub fn id_triples<'a>(
        &'a self,
        bytes: &'a [u8],
        restriction: Restriction,
    ) -> Result<(u64, BitmapIter<'a>)> {
        if restriction != Restriction::All && self.order != TripleOrder::SPO {
            return Err(HdtError::UnsupportedOrdering(self.order));
        }
        let empty = move || (0, self.iter(bytes, 0..0, 0..0, 0..0, None));
        let root = move |s: u64| self.top.position(s);
        match restriction {
            Restriction::All => {
                let it = self.iter(
                    bytes,
                    0..self.top.len(),
                    0..self.array_y.len(),
                    0..self.array_z.len(),
                    None,
                );
                Ok((self.array_z.len() as u64, it))
            }
            Restriction::S(s) => {
                let Some(k) = root(s) else {
                    return Ok(empty());
                };
                let (y0, y1) = self.y_run(bytes, k)?;
                let (z0, _) = self.z_run(bytes, y0)?;
                let (_, z1) = self.z_run(bytes, y1)?;
                let it = self.iter(bytes, k..k + 1, y0..y1 + 1, z0..z1 + 1, None);
                Ok(((z1 - z0 + 1) as u64, it))
            }
            Restriction::SP(s, p) | Restriction::SPO(s, p, _) => {
                let Some(k) = root(s) else {
                    return Ok(empty());
                };
                let (y0, y1) = self.y_run(bytes, k)?;
                let mut found = None;
                for j in y0..=y1 {
                    if self.value_y(bytes, j)? == p {
                        found = Some(j);
                        break;
                    }
                }
                let Some(j) = found else {
                    return Ok(empty());
                };
                let (z0, z1) = self.z_run(bytes, j)?;
                let object = match restriction {
                    Restriction::SPO(_, _, o) => Some(o),
                    _ => None,
                };
                let count = match object {
                    None => (z1 - z0 + 1) as u64,
                    Some(o) => {
                        let mut n = 0;
                        for z in z0..=z1 {
                            let v = self.array_z.get(bytes, z).ok_or_else(|| {
                                HdtError::decode(format!("arrayZ index {z} out of bounds"))
                            })?;
                            n += u64::from(v == o);
                        }
                        n
                    }
                };
                let it = self.iter(bytes, k..k + 1, j..j + 1, z0..z1 + 1, object);
                Ok((count, it))
            }
        }
    }

    /// Encode sorted physical triples. `roots` is the number of level-0 IDs
    /// the reader will pair with `bitmapY`.
    pub fn encode(physical: &[IdTriple], roots: usize, out: &mut Vec<u8>) -> Result<()> {
        let mut array_y = Vec::new();
        let mut bits_y = Vec::new();
        let mut array_z = Vec::with_capacity(physical.len());
        let mut bits_z = Vec::with_capacity(physical.len());
        let mut prev: Option<IdTriple> = None;
        for &(a, b, c) in physical {
            let new_root = prev.is_none_or(|p| p.0 != a);
            let new_mid = new_root || prev.is_some_and(|p| p.1 != b);
            if prev.is_some() {
                if new_root && let Some(last) = bits_y.last_mut() {
                    *last = true;
                }
                if new_mid && let Some(last) = bits_z.last_mut() {
                    *last = true;
                }
            }
            if new_mid {
                array_y.push(b);
                bits_y.push(false);
            }
            array_z.push(c);
            bits_z.push(false);
            prev = Some((a, b, c));
        }
        if let Some(last) = bits_y.last_mut() {
            *last = true;
        }
        if let Some(last) = bits_z.last_mut() {
            *last = true;
        }
        let distinct = bits_y.iter().filter(|b| **b).count();
        if distinct != roots {
            return Err(HdtError::Invalid(format!(
                "{distinct} distinct level-0 IDs but the dictionary declares {roots}"
            )));
        }
        Bitmap::encode(&bits_y, out);
        Bitmap::encode(&bits_z, out);
        LogArray::encode(&array_y, out);
        LogArray::encode(&array_z, out);
        Ok(())
    }
}

/// Inclusive span of run `k` in a demarcation bitmap.
fn run(bm: &Bitmap, bytes: &[u8], k: usize) -> Option<(usize, usize)> {
    let end = bm.select1(bytes, k)? as usize;
    let start = match k {
        0 => 0,
        _ => bm.select1(bytes, k - 1)? as usize + 1,
    };
    Some((start, end))
}

/// Root IDs `seq[next..end]`.
#[derive(Debug)]
struct TopIds {
    seq: IdSequence,
    next: usize,
    end: usize,
}

impl Iterator for TopIds {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let k = self.next;
        self.next += 1;
        Some(
            self.seq
                .get(k)
                .ok_or_else(|| HdtError::decode(format!("root index {k} out of range"))),
        )
    }
}

/// Pairs every parent from `parents` with its run of `array` values; a run
/// ends at the next set bit of `bitmap`. Only `array[range]` is visited.
#[derive(Debug)]
struct PairGen<'a, I, P> {
    parents: I,
    bitmap: &'a Bitmap,
    array: &'a LogArray,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    /// Parent being expanded and the last array index of its run.
    current: Option<(P, usize)>,
    done: bool,
}

impl<'a, I, P> PairGen<'a, I, P> {
    fn new(
        parents: I,
        bitmap: &'a Bitmap,
        array: &'a LogArray,
        bytes: &'a [u8],
        range: Range<usize>,
    ) -> Self {
        PairGen {
            parents,
            bitmap,
            array,
            bytes,
            pos: range.start,
            end: range.end,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, e: HdtError) -> Option<Result<(P, u64)>> {
        self.done = true;
        Some(Err(e))
    }
}

impl<I, P> Iterator for PairGen<'_, I, P>
where
    I: Iterator<Item = Result<P>>,
    P: Copy,
{
    type Item = Result<(P, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.pos >= self.end {
                return None;
            }
            if let Some((parent, run_end)) = self.current {
                if self.pos <= run_end {
                    let i = self.pos;
                    self.pos += 1;
                    return match self.array.get(self.bytes, i) {
                        Some(v) => Some(Ok((parent, v))),
                        None => self.fail(HdtError::decode(format!("array index {i} out of bounds"))),
                    };
                }
                self.current = None;
            }
            let parent = match self.parents.next()? {
                Ok(p) => p,
                Err(e) => return self.fail(e),
            };
            match self.bitmap.next_one(self.bytes, self.pos) {
                Some(run_end) => self.current = Some((parent, run_end as usize)),
                None => {
                    let pos = self.pos;
                    return self.fail(HdtError::decode(format!(
                        "no run boundary at or after position {pos}"
                    )));
                }
            }
        }
    }
}

/// Lazy `(s, p, o)` stream over a bitmap index.
#[derive(Debug)]
pub struct BitmapIter<'a> {
    pairs: PairGen<'a, PairGen<'a, TopIds, u64>, (u64, u64)>,
    object: Option<u64>,
    order: TripleOrder,
}

impl Iterator for BitmapIter<'_> {
    type Item = Result<IdTriple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ((a, b), c) = match self.pairs.next()? {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            if self.object.is_some_and(|o| o != c) {
                continue;
            }
            return Some(Ok(self.order.to_spo((a, b, c))));
        }
    }
}

// ---------------- List triples ----------------

const LIST_ENTRY_LEN: usize = 12;

/// Flat `N x (u32, u32, u32)` big-endian entries followed by a CRC32.
#[derive(Debug, Clone)]
pub struct ListTriples {
    order: TripleOrder,
    len: usize,
    data: Range<usize>,
}

impl ListTriples {
    pub fn parse(bytes: &[u8], offset: usize, order: TripleOrder, len: usize) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(bytes, offset);
        let nbytes = len
            .checked_mul(LIST_ENTRY_LEN)
            .ok_or_else(|| HdtError::decode(format!("{len} list triples overflow")))?;
        let data = r.read_bytes(nbytes)?;
        let stored = r.read_u32_be()?;
        let computed = crc32(data);
        if stored != computed {
            return Err(HdtError::Checksum {
                section: "list triples",
                stored,
                computed,
            });
        }
        let lt = ListTriples {
            order,
            len,
            data: offset..offset + nbytes,
        };
        Ok((lt, r.pos() - offset))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical entry `i`.
    fn entry(&self, bytes: &[u8], i: usize) -> Result<IdTriple> {
        let start = self.data.start + i * LIST_ENTRY_LEN;
        let mut r = ByteReader::new(bytes, start);
        Ok((
            u64::from(r.read_u32_be()?),
            u64::from(r.read_u32_be()?),
            u64::from(r.read_u32_be()?),
        ))
    }

    pub fn id_triples<'a>(
        &'a self,
        bytes: &'a [u8],
        restriction: Restriction,
    ) -> Result<(u64, ListIter<'a>)> {
        if restriction != Restriction::All && self.order != TripleOrder::SPO {
            return Err(HdtError::UnsupportedOrdering(self.order));
        }
        let count = match restriction {
            Restriction::All => self.len as u64,
            _ => {
                let mut n = 0;
                for i in 0..self.len {
                    n += u64::from(restriction.matches(self.entry(bytes, i)?));
                }
                n
            }
        };
        let it = ListIter {
            list: self,
            bytes,
            pos: 0,
            restriction,
            done: false,
        };
        Ok((count, it))
    }

    pub fn encode(physical: &[IdTriple], out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        for &(a, b, c) in physical {
            for id in [a, b, c] {
                let id = u32::try_from(id).map_err(|_| {
                    HdtError::Invalid(format!("ID {id} does not fit a list triples entry"))
                })?;
                out.extend_from_slice(&id.to_be_bytes());
            }
        }
        let crc = crc32(&out[start..]);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(())
    }
}

/// Lazy `(s, p, o)` stream over list triples.
#[derive(Debug)]
pub struct ListIter<'a> {
    list: &'a ListTriples,
    bytes: &'a [u8],
    pos: usize,
    restriction: Restriction,
    done: bool,
}

impl Iterator for ListIter<'_> {
    type Item = Result<IdTriple>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.pos < self.list.len {
            let i = self.pos;
            self.pos += 1;
            match self.list.entry(self.bytes, i) {
                Ok(t) => {
                    let spo = self.list.order.to_spo(t);
                    if self.restriction.matches(spo) {
                        return Some(Ok(spo));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
