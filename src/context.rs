use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use log::{debug, trace};

use crate::node::{Node, NodeKind};
use crate::reference::Ref;
use crate::stats::{Stats, StatsCounters};

/// Structural keys hash as an FNV-1a fold over 64-bit words: the kind tag
/// first, then one word per argument (OR arguments after flattening and
/// sorting, so the hash sees the same multiset the matcher compares).
const KEY_HASH_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const KEY_HASH_PRIME: u64 = 0x0000_0100_0000_01b3;

fn mix(seed: u64, word: u64) -> u64 {
    (seed ^ word).wrapping_mul(KEY_HASH_PRIME)
}

/// Term tokens are opaque, so their hash word comes from `std::hash`.
fn token_hash<T: Hash>(token: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

/// An opaque term token.
///
/// The context never inspects tokens beyond equality and hashing; `Display`
/// is only needed for [`print`][Context::print]. The test harness uses
/// `String`, which is also the default.
pub trait Token: Clone + Eq + Hash + Display {}

impl<T: Clone + Eq + Hash + Display> Token for T {}

/// Default size of the node arena, as a power of two.
pub const DEFAULT_BITS: usize = 20;

/// Arena index of the constant-false sentinel node.
pub(crate) const FALSE_INDEX: u32 = 1;

/// The expression context: node store, canonical map, and statistics.
///
/// All expressions live in exactly one context. References from different
/// contexts must never be mixed; the context detects stray references on a
/// best-effort basis (bounds checks) and treats them as programmer errors.
pub struct Context<T: Token = String> {
    pub(crate) nodes: Vec<Node<T>>,
    /// Current canonical handle per entry, relative to the entry's positive
    /// polarity. Self-referential until an equivalence is discovered.
    pub(crate) canonical: Vec<Cell<Ref>>,
    buckets: Vec<u32>,
    bitmask: u64,
    capacity: usize,
    pub(crate) stats: StatsCounters,
    eqfalse: Ref,
    eqtrue: Ref,
}

impl<T: Token> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> Debug for Context<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("num_nodes", &self.num_nodes())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T: Token> Context<T> {
    /// Creates a context with the default arena capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BITS)
    }

    /// Creates a context whose arena holds up to `2^bits` nodes.
    pub fn with_capacity(bits: usize) -> Self {
        assert!(bits <= 30, "Storage bits should be in the range 0..=30");

        let capacity = 1 << bits;
        let buckets_bits = bits.min(16);
        let buckets_size = 1 << buckets_bits;

        let mut ctx = Self {
            nodes: vec![Node::sentry()],
            canonical: vec![Cell::new(Ref::UNDEF)],
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            capacity,
            stats: StatsCounters::default(),
            eqfalse: Ref::UNDEF,
            eqtrue: Ref::UNDEF,
        };

        // The sentinel term "0" is created first, so `false` gets the
        // smallest id and `true` is its inversion.
        let f = ctx.intern(Node::false_sentinel());
        assert_eq!(f.index(), FALSE_INDEX);
        ctx.eqfalse = f;
        ctx.eqtrue = -f;
        ctx
    }

    /// The constant `false`.
    pub fn get_false(&self) -> Ref {
        self.eqfalse
    }

    /// The constant `true`.
    pub fn get_true(&self) -> Ref {
        self.eqtrue
    }

    /// The constant for `b`.
    pub fn get(&self, b: bool) -> Ref {
        if b {
            self.eqtrue
        } else {
            self.eqfalse
        }
    }

    pub fn is_false(&self, h: Ref) -> bool {
        self.check(h);
        h == self.eqfalse
    }

    pub fn is_true(&self, h: Ref) -> bool {
        self.check(h);
        h == self.eqtrue
    }

    pub fn is_const(&self, h: Ref) -> bool {
        self.check(h);
        h.index() == FALSE_INDEX
    }

    /// Inverts an expression. Constant time: flips the inversion bit.
    pub fn invert(&self, h: Ref) -> Ref {
        self.check(h);
        -h
    }

    /// Interns a fresh or existing term node for `token`. Never simplifies.
    pub fn get_term(&mut self, token: T) -> Ref {
        self.intern(Node::term(token))
    }

    /// Number of interned nodes, sentinel included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Snapshot of the solver counters.
    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    #[inline]
    pub(crate) fn check(&self, h: Ref) {
        assert!(!h.is_undef(), "Undefined reference");
        assert!(
            (h.index() as usize) < self.nodes.len(),
            "Reference does not belong to this context"
        );
    }

    #[inline]
    pub(crate) fn node(&self, index: u32) -> &Node<T> {
        debug_assert_ne!(index, 0, "Index is 0");
        &self.nodes[index as usize]
    }

    /// Resolves `h` to its current canonical handle, transitively following
    /// the canonical chain and XOR-accumulating inversion bits.
    ///
    /// Chains are path-compressed when more than one link was followed,
    /// except across entries whose canonical slot is locked by an ongoing
    /// simplification pass. Canonical pointers only ever decrease ids, so
    /// both the walk and the compression terminate.
    pub fn follow(&self, h: Ref) -> Ref {
        self.check(h);

        let mut index = h.index();
        let mut inverted = h.is_inverted();
        let mut steps = 0usize;
        loop {
            let c = self.canonical[index as usize].get();
            if c.is_locked() || c.index() == index {
                break;
            }
            inverted ^= c.is_inverted();
            index = c.index();
            steps += 1;
        }

        let res = Ref::new(index, inverted);
        if steps > 1 {
            let cell = &self.canonical[h.index() as usize];
            if !cell.get().is_locked() {
                // Relative to this entry's positive polarity.
                cell.set(Ref::new(index, inverted ^ h.is_inverted()));
            }
        }
        res
    }

    /// Records `a ≡ b` by pointing `a`'s entry at `b`.
    ///
    /// Both handles are normalised to the inversion of `a`, so the stored
    /// relation is on positive polarities. Requires non-constants and
    /// `a.index() > b.index()`: canonical pointers only move to entries with
    /// strictly smaller ids.
    pub(crate) fn declare_equiv(&self, a: Ref, b: Ref) {
        self.check(a);
        self.check(b);
        assert!(
            !self.is_const(a) && !self.is_const(b),
            "Constants cannot be re-canonicalised"
        );
        assert!(a.index() > b.index(), "Canonical pointers must decrease ids");

        let (a, b) = if a.is_inverted() { (-a, -b) } else { (a, b) };
        debug!("declare_equiv: {} := {}", a, b);

        let cell = &self.canonical[a.index() as usize];
        debug_assert!(!cell.get().is_locked(), "Entry is locked");
        cell.set(b);
    }

    /// Locks an entry's canonical slot for the duration of the guard.
    ///
    /// While locked, [`follow`][Self::follow] treats the entry as its own
    /// representative and skips path compression across it.
    pub(crate) fn lock_entry(&self, h: Ref) -> EntryLock<'_> {
        self.check(h);
        let cell = &self.canonical[h.index() as usize];
        cell.set(cell.get().locked());
        EntryLock { cell }
    }

    fn add_node(&mut self, mut node: Node<T>) -> u32 {
        if self.nodes.len() >= self.capacity {
            panic!("Storage is full");
        }
        node.next = 0;
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        self.canonical.push(Cell::new(Ref::positive(index)));
        index
    }

    /// Returns the unique reference for the structural key of `node`.
    ///
    /// An existing entry is returned at its current canonical follow; a new
    /// entry is created self-canonical with the next id.
    pub(crate) fn intern(&mut self, node: Node<T>) -> Ref {
        let hash = self.key_hash(&node);
        let bucket = (hash & self.bitmask) as usize;
        let mut index = self.buckets[bucket];

        if index == 0 {
            // Create new node and put it into the bucket.
            let i = self.add_node(node);
            trace!("intern: created new node @{}", i);
            self.buckets[bucket] = i;
            return Ref::positive(i);
        }

        loop {
            debug_assert!(index > 0);

            if self.matches(index, &node) {
                // The node already exists.
                let r = Ref::positive(index);
                trace!("intern: node {} already exists", r);
                return self.follow(r);
            }

            let next = self.nodes[index as usize].next;

            if next == 0 {
                // Create new node and append it to the bucket.
                let i = self.add_node(node);
                trace!("intern: created new node @{} after @{}", i, index);
                self.nodes[index as usize].next = i;
                return Ref::positive(i);
            } else {
                // Go to the next node in the bucket.
                index = next;
            }
        }
    }

    /// Flattens positive nested-OR arguments and sorts the result, producing
    /// the multiset the structural key of an OR node is compared by. This
    /// makes `(a|b)|c` and `a|(b|c)` intern to the same entry.
    pub(crate) fn flatten_or_args(&self, args: &[Ref], out: &mut Vec<Ref>) {
        for &a in args {
            if !a.is_inverted() && !self.is_const(a) && self.node(a.index()).kind == NodeKind::Or {
                self.flatten_or_args(&self.node(a.index()).args, out);
            } else {
                out.push(a);
            }
        }
    }

    fn flattened(&self, args: &[Ref]) -> Vec<Ref> {
        let mut out = Vec::with_capacity(args.len());
        self.flatten_or_args(args, &mut out);
        out.sort();
        out
    }

    fn key_hash(&self, node: &Node<T>) -> u64 {
        let h = mix(KEY_HASH_BASIS, node.kind as u64);
        match node.kind {
            NodeKind::Term => mix(h, node.term.as_ref().map_or(0, token_hash)),
            NodeKind::Or => self
                .flattened(&node.args)
                .into_iter()
                .fold(h, |h, a| mix(h, a.raw() as u64)),
            NodeKind::Ifelse | NodeKind::Eq => node
                .args
                .iter()
                .fold(h, |h, a| mix(h, a.raw() as u64)),
        }
    }

    fn matches(&self, index: u32, node: &Node<T>) -> bool {
        let existing = self.node(index);
        if existing.kind != node.kind {
            return false;
        }
        match node.kind {
            NodeKind::Term => existing.term == node.term,
            NodeKind::Ifelse | NodeKind::Eq => existing.args == node.args,
            NodeKind::Or => self.flattened(&existing.args) == self.flattened(&node.args),
        }
    }
}

/// Guard returned by [`Context::lock_entry`]; unlocks on drop.
pub(crate) struct EntryLock<'a> {
    cell: &'a Cell<Ref>,
}

impl Drop for EntryLock<'_> {
    fn drop(&mut self) {
        self.cell.set(self.cell.get().unlocked());
    }
}
