//! The IF-THEN-ELSE constructor and EQ folding.

use log::debug;

use crate::context::{Context, Token};
use crate::node::{Node, NodeKind};
use crate::reference::Ref;

impl<T: Token> Context<T> {
    /// Returns the multiplexer `i ? t : e`.
    pub fn ifelse(&mut self, i: Ref, t: Ref, e: Ref) -> Ref {
        let mut i = self.follow(i);
        let mut t = self.follow(t);
        let mut e = self.follow(e);
        debug!("ifelse(i = {}, t = {}, e = {})", i, t, e);

        loop {
            if self.is_const(i) {
                return if self.is_true(i) { t } else { e };
            }

            let mut changed = false;

            // The branches cannot observe the condition disagreeing with
            // the branch taken.
            if t == i {
                t = self.get_true();
                changed = true;
            } else if t == -i {
                t = self.get_false();
                changed = true;
            }
            if e == i {
                e = self.get_false();
                changed = true;
            } else if e == -i {
                e = self.get_true();
                changed = true;
            }

            // Simplify each branch knowing the condition's value there.
            if !self.is_const(t) {
                let nt = {
                    let _lock = self.lock_entry(t);
                    self.simplify(&[-i], t)
                };
                if nt != t {
                    t = nt;
                    changed = true;
                }
            }
            if !self.is_const(e) {
                let ne = {
                    let _lock = self.lock_entry(e);
                    self.simplify(&[i], e)
                };
                if ne != e {
                    e = ne;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        if self.is_const(t) {
            return if self.is_true(t) {
                self.get_or([i, e])
            } else {
                self.get_and([-i, e])
            };
        }
        if self.is_const(e) {
            return if self.is_true(e) {
                self.get_or([-i, t])
            } else {
                self.get_and([i, t])
            };
        }
        if t == e {
            return t;
        }
        if t == -e {
            return self.fold_eq(i, t);
        }

        // Canonical form: the condition is never inverted, and at most one
        // branch is.
        let mut inverted = false;
        if i.is_inverted() {
            i = -i;
            std::mem::swap(&mut t, &mut e);
        }
        if t.is_inverted() && e.is_inverted() {
            t = -t;
            e = -e;
            inverted = true;
        }

        let r = self.intern(Node::ifelse(i, t, e));
        if inverted {
            -r
        } else {
            r
        }
    }

    /// Returns the biconditional `a <-> b`.
    ///
    /// XOR gates take the same number of clauses with the same number of
    /// literals as IFELSE gates, so EQ rides the IFELSE pipeline instead of
    /// having a constructor of its own.
    pub fn get_eq(&mut self, a: Ref, b: Ref) -> Ref {
        self.ifelse(a, b, -b)
    }

    /// Interns `ite(i, t, ~t)` as an EQ node.
    ///
    /// Operand inversions are lifted into an overall parity and the smaller
    /// handle goes first.
    fn fold_eq(&mut self, i: Ref, t: Ref) -> Ref {
        debug_assert!(!self.is_const(i) && !self.is_const(t));

        let mut parity = false;
        let (mut a, mut b) = (i, t);
        if a.is_inverted() {
            a = -a;
            parity = !parity;
        }
        if b.is_inverted() {
            b = -b;
            parity = !parity;
        }
        if a == b {
            return self.get(!parity);
        }
        if b < a {
            std::mem::swap(&mut a, &mut b);
        }

        // ite(a, eq(a, x), ~eq(a, x)) is x itself, whichever side of the
        // inner EQ the shared operand is on.
        if self.node(b.index()).kind == NodeKind::Eq {
            let (x, y) = {
                let n = self.node(b.index());
                (n.args[0], n.args[1])
            };
            if x == a {
                debug!("get_eq: eq({}, {}) collapses to {}", a, b, y);
                let r = self.follow(y);
                return if parity { -r } else { r };
            }
            if y == a {
                debug!("get_eq: eq({}, {}) collapses to {}", a, b, x);
                let r = self.follow(x);
                return if parity { -r } else { r };
            }
        }

        let r = self.intern(Node::eq(a, b));
        if parity {
            -r
        } else {
            r
        }
    }
}
