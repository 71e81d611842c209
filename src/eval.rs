//! Evaluation of expressions under a total truth assignment.
//!
//! Mostly useful in tests, where exhaustive evaluation over small atom
//! counts cross-checks the SAT-based answers.

use std::collections::HashMap;

use crate::context::{Context, Token, FALSE_INDEX};
use crate::node::NodeKind;
use crate::reference::Ref;

impl<T: Token> Context<T> {
    /// Evaluates `h` under the given assignment of term tokens.
    ///
    /// # Panics
    ///
    /// Panics if a term reachable from `h` has no assigned value.
    pub fn evaluate(&self, h: Ref, assignment: &HashMap<T, bool>) -> bool {
        let mut memo = HashMap::new();
        self.eval_ref(h, assignment, &mut memo)
    }

    fn eval_ref(
        &self,
        h: Ref,
        assignment: &HashMap<T, bool>,
        memo: &mut HashMap<u32, bool>,
    ) -> bool {
        let h = self.follow(h);
        self.eval_index(h.index(), assignment, memo) ^ h.is_inverted()
    }

    fn eval_index(
        &self,
        index: u32,
        assignment: &HashMap<T, bool>,
        memo: &mut HashMap<u32, bool>,
    ) -> bool {
        if index == FALSE_INDEX {
            return false;
        }
        if let Some(&v) = memo.get(&index) {
            return v;
        }

        let n = self.node(index);
        let v = match n.kind {
            NodeKind::Term => {
                let term = n.term.as_ref().expect("the sentinel was handled above");
                *assignment
                    .get(term)
                    .unwrap_or_else(|| panic!("term '{}' has no assigned value", term))
            }
            NodeKind::Or => n.args.iter().any(|&a| self.eval_ref(a, assignment, memo)),
            NodeKind::Ifelse => {
                let (i, t, e) = (n.args[0], n.args[1], n.args[2]);
                if self.eval_ref(i, assignment, memo) {
                    self.eval_ref(t, assignment, memo)
                } else {
                    self.eval_ref(e, assignment, memo)
                }
            }
            NodeKind::Eq => {
                let (a, b) = (n.args[0], n.args[1]);
                self.eval_ref(a, assignment, memo) == self.eval_ref(b, assignment, memo)
            }
        };
        memo.insert(index, v);
        v
    }
}
