//! Simplification of expressions under assumed-false premises.
//!
//! The entry point is [`Context::simplify`]: given an expression `e` and
//! sibling handles that are all false in the surrounding OR context, it
//! reduces `e` as far as the local rules allow. It never interns: the result
//! is always `e` itself, a constant, or an already existing handle with a
//! smaller id, which is what makes the constructor fixpoints terminate.

use std::collections::HashMap;

use log::trace;

use crate::context::{Context, Token, FALSE_INDEX};
use crate::node::NodeKind;
use crate::reference::Ref;

/// Truth values forced by the assumption set, keyed by arena index of the
/// positive node.
struct Forced(HashMap<u32, bool>);

impl Forced {
    fn get(&self, h: Ref) -> Option<bool> {
        self.0.get(&h.index()).map(|&b| b ^ h.is_inverted())
    }
}

/// Checks whether sorted `xs` is a subset of sorted `ys`.
fn sorted_subset(xs: &[Ref], ys: &[Ref]) -> bool {
    let mut iy = 0;
    'outer: for &x in xs {
        while iy < ys.len() {
            if ys[iy] == x {
                iy += 1;
                continue 'outer;
            }
            if ys[iy] > x {
                return false;
            }
            iy += 1;
        }
        return false;
    }
    true
}

impl<T: Token> Context<T> {
    /// Attempts to simplify `e` given that all of `falses` are false.
    ///
    /// Returns a handle equivalent to `e` under those assumptions. When the
    /// assumptions themselves are inconsistent (no model makes every sibling
    /// false), `e` is irrelevant to the surrounding OR and collapses to
    /// `false`.
    pub(crate) fn simplify(&self, falses: &[Ref], e: Ref) -> Ref {
        let e = self.follow(e);
        if falses.is_empty() || self.is_const(e) {
            return e;
        }

        let forced = match self.derive_forced(falses) {
            Some(forced) => forced,
            None => {
                trace!("simplify: inconsistent assumptions, {} absorbed", e);
                return self.get_false();
            }
        };

        // The expression itself may already be decided.
        if let Some(v) = forced.get(e) {
            return self.get(v);
        }

        let inverted = e.is_inverted();
        let apply = |r: Ref| if inverted { -r } else { r };

        let n = self.node(e.index());
        match n.kind {
            NodeKind::Term => e,
            NodeKind::Eq => {
                let (x, y) = (n.args[0], n.args[1]);
                if let Some(kx) = forced.get(x) {
                    return self.follow(apply(if kx { y } else { -y }));
                }
                if let Some(ky) = forced.get(y) {
                    return self.follow(apply(if ky { x } else { -x }));
                }
                e
            }
            NodeKind::Ifelse => {
                let (i, t, el) = (n.args[0], n.args[1], n.args[2]);
                match forced.get(i) {
                    Some(true) => self.follow(apply(t)),
                    Some(false) => self.follow(apply(el)),
                    None => e,
                }
            }
            NodeKind::Or => self.simplify_or(falses, &forced, e),
        }
    }

    /// Derives the set of truth values forced by assuming every handle in
    /// `falses` to be false. Returns `None` when the assumptions are
    /// inconsistent.
    fn derive_forced(&self, falses: &[Ref]) -> Option<Forced> {
        let mut forced = HashMap::new();
        // The constant sentinel is false on its own account.
        forced.insert(FALSE_INDEX, false);

        // Queue of (handle, value) facts still to record.
        let mut queue: Vec<(Ref, bool)> = falses.iter().map(|&s| (s, false)).collect();
        let mut eq_facts: Vec<(Ref, Ref, bool)> = Vec::new();

        loop {
            while let Some((h, v)) = queue.pop() {
                let value = v ^ h.is_inverted();
                let index = h.index();
                if let Some(&old) = forced.get(&index) {
                    if old != value {
                        return None;
                    }
                    continue;
                }
                forced.insert(index, value);

                let n = self.node(index);
                match n.kind {
                    // A false OR forces every argument false.
                    NodeKind::Or if !value => {
                        for &a in &n.args {
                            queue.push((a, false));
                        }
                    }
                    // An EQ of known value ties its operands together.
                    NodeKind::Eq => {
                        eq_facts.push((n.args[0], n.args[1], value));
                    }
                    _ => {}
                }
            }

            let forced_view = Forced(forced);
            let mut progressed = false;
            for &(x, y, v) in &eq_facts {
                match (forced_view.get(x), forced_view.get(y)) {
                    (Some(kx), None) => {
                        queue.push((y, kx == v));
                        progressed = true;
                    }
                    (None, Some(ky)) => {
                        queue.push((x, ky == v));
                        progressed = true;
                    }
                    (Some(kx), Some(ky)) => {
                        if (kx == ky) != v {
                            return None;
                        }
                    }
                    (None, None) => {}
                }
            }
            forced = forced_view.0;

            if queue.is_empty() && !progressed {
                return Some(Forced(forced));
            }
        }
    }

    fn simplify_or(&self, falses: &[Ref], forced: &Forced, e: Ref) -> Ref {
        let inverted = e.is_inverted();
        let apply = |r: Ref| if inverted { -r } else { r };
        let args = &self.node(e.index()).args;

        // Containment: a sibling that is a negated OR over a subset of our
        // arguments holds as an OR that implies this one.
        for &s in falses {
            if s.is_inverted() && !self.is_const(s) {
                let sn = self.node(s.index());
                if sn.kind == NodeKind::Or && sorted_subset(&sn.args, args) {
                    trace!("simplify: {} contains held sibling {}", e, -s);
                    return apply(self.get_true());
                }
            }
        }

        // Evaluate the arguments against the derived values. An argument
        // that is forced true makes the OR true; forced-false arguments
        // drop out.
        let mut survivor = None;
        let mut num_left = 0usize;
        for &a in args {
            match forced.get(a) {
                Some(true) => return apply(self.get_true()),
                Some(false) => continue,
                None => {
                    num_left += 1;
                    survivor = Some(a);
                }
            }
        }

        match num_left {
            0 => apply(self.get_false()),
            1 => self.follow(apply(survivor.unwrap())),
            _ => e,
        }
    }
}
