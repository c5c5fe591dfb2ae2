//! Fields: named bit-slices of a message buffer, and the relational leaves
//! ([`equal_to`], [`less_than`], ...) that [`indexed`](crate::indexed) builds
//! its per-field index from.

use std::sync::Arc;

use super::algebra::{Collapsed, Evaluate, Leaf, Matcher};

/// One contiguous run of bits belonging to a [`Field`].
///
/// `word_index` is the byte offset, within the message buffer, of the first
/// storage byte this slice touches; `lsb`/`msb` are bit offsets counted from
/// that byte, little-endian, and may exceed 7 to span further bytes — e.g.
/// `{ word_index: 0, lsb: 2, msb: 17 }` reads bits 2..=17 across bytes 0, 1
/// and 2. A [`Field`] with more than one slice concatenates them MSB-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slice {
    /// Byte offset of the slice's first storage byte.
    pub word_index: usize,
    /// Most significant bit offset from `word_index`, inclusive.
    pub msb: u8,
    /// Least significant bit offset from `word_index`, inclusive.
    pub lsb: u8,
}

impl Slice {
    /// Number of bits this slice contributes.
    pub fn width(&self) -> u32 {
        (self.msb - self.lsb) as u32 + 1
    }

    fn storage_bytes(&self) -> usize {
        (self.msb / 8) as usize + 1
    }

    fn mask(&self) -> u64 {
        let width = self.width();
        if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }
}

/// A named slice (or concatenation of slices) of a message buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field {
    /// The field's diagnostic name.
    pub name: &'static str,
    /// The slices that make up this field, MSB-first.
    pub slices: Vec<Slice>,
}

impl Field {
    /// A field made of a single contiguous bit range.
    pub fn single(name: &'static str, word_index: usize, msb: u8, lsb: u8) -> Self {
        Self {
            name,
            slices: vec![Slice { word_index, msb, lsb }],
        }
    }

    /// A field made of several disjoint slices, concatenated MSB-first.
    pub fn new(name: &'static str, slices: Vec<Slice>) -> Self {
        assert!(!slices.is_empty(), "a field must have at least one slice");
        Self { name, slices }
    }

    /// Total bit width of this field across all its slices.
    pub fn width(&self) -> u32 {
        self.slices.iter().map(Slice::width).sum()
    }

    /// Read this field's value out of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is too short for any of this field's slices.
    pub fn extract(&self, buf: &[u8]) -> u64 {
        let mut value: u64 = 0;
        for slice in &self.slices {
            let bytes = slice.storage_bytes();
            let mut word: u64 = 0;
            for i in 0..bytes {
                word |= (buf[slice.word_index + i] as u64) << (8 * i);
            }
            let piece = (word >> slice.lsb) & slice.mask();
            value = (value << slice.width()) | piece;
        }
        value
    }

    /// Write `value` into `buf`'s slices, inverse of [`Field::extract`].
    ///
    /// # Panics
    ///
    /// Panics if `buf` is too short for any of this field's slices.
    pub fn insert(&self, buf: &mut [u8], value: u64) {
        // Slices were concatenated MSB-first on extract; split the value back
        // up the same way, last slice first (it holds the least-significant bits).
        let mut remaining = value;
        for slice in self.slices.iter().rev() {
            let piece = remaining & slice.mask();
            remaining >>= slice.width();

            let bytes = slice.storage_bytes();
            let mut word: u64 = 0;
            for i in 0..bytes {
                word |= (buf[slice.word_index + i] as u64) << (8 * i);
            }
            word &= !(slice.mask() << slice.lsb);
            word |= piece << slice.lsb;
            for i in 0..bytes {
                buf[slice.word_index + i] = ((word >> (8 * i)) & 0xFF) as u8;
            }
        }
    }
}

/// The relation a [`FieldLeaf`] tests between a field's runtime value and a
/// compile-time constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Relation {
    fn symbol(self) -> &'static str {
        match self {
            Relation::Eq => "==",
            Relation::Ne => "!=",
            Relation::Lt => "<",
            Relation::Gt => ">",
            Relation::Le => "<=",
            Relation::Ge => ">=",
        }
    }

    fn negated(self) -> Relation {
        match self {
            Relation::Eq => Relation::Ne,
            Relation::Ne => Relation::Eq,
            Relation::Lt => Relation::Ge,
            Relation::Ge => Relation::Lt,
            Relation::Gt => Relation::Le,
            Relation::Le => Relation::Gt,
        }
    }

    fn holds(self, field_value: u64, constant: u64) -> bool {
        match self {
            Relation::Eq => field_value == constant,
            Relation::Ne => field_value != constant,
            Relation::Lt => field_value < constant,
            Relation::Gt => field_value > constant,
            Relation::Le => field_value <= constant,
            Relation::Ge => field_value >= constant,
        }
    }
}

/// A leaf matcher: `field <relation> constant`.
///
/// Built via [`equal_to`], [`less_than`], [`greater_than`], [`less_equal`],
/// [`greater_equal`], [`not_equal_to`] and [`in_values`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldLeaf {
    pub field: Arc<Field>,
    pub relation: Relation,
    pub value: u64,
}

/// `field == value`.
pub fn equal_to(field: Arc<Field>, value: u64) -> Matcher<FieldLeaf> {
    Matcher::leaf(FieldLeaf { field, relation: Relation::Eq, value })
}

/// `field != value`.
pub fn not_equal_to(field: Arc<Field>, value: u64) -> Matcher<FieldLeaf> {
    Matcher::leaf(FieldLeaf { field, relation: Relation::Ne, value })
}

/// `field < value`.
pub fn less_than(field: Arc<Field>, value: u64) -> Matcher<FieldLeaf> {
    Matcher::leaf(FieldLeaf { field, relation: Relation::Lt, value })
}

/// `field > value`.
pub fn greater_than(field: Arc<Field>, value: u64) -> Matcher<FieldLeaf> {
    Matcher::leaf(FieldLeaf { field, relation: Relation::Gt, value })
}

/// `field <= value`.
pub fn less_equal(field: Arc<Field>, value: u64) -> Matcher<FieldLeaf> {
    Matcher::leaf(FieldLeaf { field, relation: Relation::Le, value })
}

/// `field >= value`.
pub fn greater_equal(field: Arc<Field>, value: u64) -> Matcher<FieldLeaf> {
    Matcher::leaf(FieldLeaf { field, relation: Relation::Ge, value })
}

/// `in<Field, V...>`: the disjunction of equalities on the same field.
pub fn in_values(field: Arc<Field>, values: impl IntoIterator<Item = u64>) -> Matcher<FieldLeaf> {
    let mut values = values.into_iter();
    let first = values
        .next()
        .expect("`in_values` requires at least one candidate value");
    let mut m = equal_to(Arc::clone(&field), first);
    for v in values {
        m = m.or(equal_to(Arc::clone(&field), v));
    }
    m
}

impl Leaf for FieldLeaf {
    fn negate_leaf(&self) -> Option<Self> {
        Some(FieldLeaf {
            field: Arc::clone(&self.field),
            relation: self.relation.negated(),
            value: self.value,
        })
    }

    fn conflicts_leaf(&self, other: &Self) -> bool {
        if self.field != other.field {
            return false;
        }
        matches!(self.collapse_and(other), Some(Collapsed::Never))
    }

    fn implies_leaf(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        if self.field != other.field {
            return false;
        }
        let not_other = other.negate_leaf().expect("relational leaves always negate");
        matches!(self.collapse_and(&not_other), Some(Collapsed::Never))
    }

    fn collapse_and(&self, other: &Self) -> Option<Collapsed<Self>> {
        if self.field != other.field {
            return None;
        }
        use Relation::*;
        let field = Arc::clone(&self.field);
        let (a, b) = (self.value, other.value);
        let leaf = |relation, value| FieldLeaf { field: Arc::clone(&field), relation, value };
        match (self.relation, other.relation) {
            (Eq, Eq) => Some(if a == b { Collapsed::Leaf(leaf(Eq, a)) } else { Collapsed::Never }),
            (Lt, Lt) => Some(Collapsed::Leaf(leaf(Lt, a.min(b)))),
            (Le, Le) => Some(Collapsed::Leaf(leaf(Le, a.min(b)))),
            (Gt, Gt) => Some(Collapsed::Leaf(leaf(Gt, a.max(b)))),
            (Ge, Ge) => Some(Collapsed::Leaf(leaf(Ge, a.max(b)))),
            (Eq, Lt) => Some(eq_vs_bound(a, a < b, leaf(Eq, a))),
            (Lt, Eq) => Some(eq_vs_bound(b, b < a, leaf(Eq, b))),
            (Eq, Le) => Some(eq_vs_bound(a, a <= b, leaf(Eq, a))),
            (Le, Eq) => Some(eq_vs_bound(b, b <= a, leaf(Eq, b))),
            (Eq, Gt) => Some(eq_vs_bound(a, a > b, leaf(Eq, a))),
            (Gt, Eq) => Some(eq_vs_bound(b, b > a, leaf(Eq, b))),
            (Eq, Ge) => Some(eq_vs_bound(a, a >= b, leaf(Eq, a))),
            (Ge, Eq) => Some(eq_vs_bound(b, b >= a, leaf(Eq, b))),
            (Eq, Ne) => Some(eq_vs_bound(a, a != b, leaf(Eq, a))),
            (Ne, Eq) => Some(eq_vs_bound(b, b != a, leaf(Eq, b))),
            (Lt, Gt) | (Gt, Lt) => {
                // `x < lt` and `x > gt` together require `gt + 1 <= x <= lt - 1`,
                // which is empty (for unsigned integers) whenever `lt <= gt + 1`.
                let (lt, gt) = if self.relation == Lt { (a, b) } else { (b, a) };
                if lt <= gt.saturating_add(1) {
                    Some(Collapsed::Never)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn describe(&self) -> String {
        format!("{} {} {:#x}", self.field.name, self.relation.symbol(), self.value)
    }
}

fn eq_vs_bound<L>(eq_value: u64, bound_holds_for_eq: bool, leaf: L) -> Collapsed<L> {
    let _ = eq_value;
    if bound_holds_for_eq {
        Collapsed::Leaf(leaf)
    } else {
        Collapsed::Never
    }
}

impl<C> Evaluate<C> for FieldLeaf
where
    C: AsRef<[u8]>,
{
    fn eval(&self, ctx: &C) -> bool {
        let value = self.field.extract(ctx.as_ref());
        self.relation.holds(value, self.value)
    }
}
