//! Tseitin encoding and the CDCL backend.
//!
//! `is_unsat` walks the DAG once, allocating one SAT variable per visited
//! entry. Handle inversions fold into literal signs, so negation never
//! materialises in the CNF. Each call creates, uses, and drops a fresh
//! solver; no solver state persists between queries.

use std::collections::HashMap;

use log::debug;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::context::{Context, Token, FALSE_INDEX};
use crate::node::NodeKind;
use crate::reference::Ref;
use crate::stats::Timer;

struct Encoder<'a, T: Token> {
    ctx: &'a Context<T>,
    formula: CnfFormula,
    vars: HashMap<u32, Var>,
    pending: Vec<u32>,
}

impl<'a, T: Token> Encoder<'a, T> {
    fn new(ctx: &'a Context<T>) -> Self {
        Self {
            ctx,
            formula: CnfFormula::new(),
            vars: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// SAT literal for `h`, allocating a variable for the underlying entry
    /// on first sight and queueing it for clause emission.
    fn literal(&mut self, h: Ref) -> Lit {
        let h = self.ctx.follow(h);
        let index = h.index();
        let var = match self.vars.get(&index) {
            Some(&v) => v,
            None => {
                let v = self.formula.new_var();
                self.vars.insert(index, v);
                self.pending.push(index);
                v
            }
        };
        if h.is_inverted() {
            Lit::negative(var)
        } else {
            Lit::positive(var)
        }
    }

    /// Emits the defining clauses of one entry.
    fn define(&mut self, index: u32) {
        let ctx = self.ctx;
        let r = Lit::positive(self.vars[&index]);
        let node = ctx.node(index);
        match node.kind {
            NodeKind::Term => {
                // Free atoms are unconstrained; only the constant sentinel
                // pins its variable.
                if index == FALSE_INDEX {
                    self.formula.add_clause(&[!r]);
                }
            }
            NodeKind::Or => {
                let lits: Vec<Lit> = node.args.iter().map(|&a| self.literal(a)).collect();
                for &l in &lits {
                    self.formula.add_clause(&[!l, r]);
                }
                let mut clause = lits;
                clause.push(!r);
                self.formula.add_clause(&clause);
            }
            NodeKind::Ifelse => {
                let i = self.literal(node.args[0]);
                let t = self.literal(node.args[1]);
                let e = self.literal(node.args[2]);
                self.formula.add_clause(&[!i, t, !r]);
                self.formula.add_clause(&[!i, !t, r]);
                self.formula.add_clause(&[i, e, !r]);
                self.formula.add_clause(&[i, !e, r]);
            }
            NodeKind::Eq => {
                // Same clauses as ifelse(a, b, ~b).
                let a = self.literal(node.args[0]);
                let b = self.literal(node.args[1]);
                self.formula.add_clause(&[!a, b, !r]);
                self.formula.add_clause(&[!a, !b, r]);
                self.formula.add_clause(&[a, !b, !r]);
                self.formula.add_clause(&[a, b, r]);
            }
        }
    }
}

impl<T: Token> Context<T> {
    /// Returns true iff no assignment to the atoms satisfies `e`.
    pub fn is_unsat(&self, e: Ref) -> bool {
        let e = self.follow(e);
        if self.is_const(e) {
            return self.is_false(e);
        }
        debug!("is_unsat({})", e);

        let formula = {
            let _timer = Timer::new(&self.stats.clauses_time);
            let mut enc = Encoder::new(self);
            let root = enc.literal(e);
            enc.formula.add_clause(&[root]);
            while let Some(index) = enc.pending.pop() {
                enc.define(index);
            }
            enc.formula
        };
        self.stats
            .num_clauses
            .set(self.stats.num_clauses.get() + formula.len() as u64);

        let _timer = Timer::new(&self.stats.sat_time);
        self.stats
            .num_sat_solutions
            .set(self.stats.num_sat_solutions.get() + 1);
        let mut solver = Solver::new();
        solver.add_formula(&formula);
        let sat = solver.solve().expect("SAT solver failed");
        debug!("is_unsat({}) -> {}", e, !sat);
        !sat
    }

    /// Returns true iff `a` and `b` agree under every assignment.
    ///
    /// Equivalences the simplifier cannot see are decided by SAT; a proven
    /// equivalence is recorded in the canonical map, so the later of the two
    /// entries becomes an alias of the earlier one and constructors cannot
    /// re-create it as distinct.
    pub fn is_equiv(&mut self, a: Ref, b: Ref) -> bool {
        let eq = self.get_eq(a, b);
        if self.is_true(eq) {
            return true;
        }

        let unsat = self.is_unsat(-eq);
        if unsat {
            let a = self.follow(a);
            let b = self.follow(b);
            // Only proper node pairs are recorded; constants keep their
            // sentinel entry untouched.
            if a.index() != b.index() && !self.is_const(a) && !self.is_const(b) {
                let (mut x, mut y) = if a.index() > b.index() { (a, b) } else { (b, a) };
                if x.is_inverted() {
                    x = -x;
                    y = -y;
                }
                self.declare_equiv(x, y);
            }
        }
        unsat
    }

    /// Returns true when the equivalence of `a` and `b` is visible to the
    /// algebraic simplifier alone, without invoking SAT.
    pub fn is_trivially_equiv(&mut self, a: Ref, b: Ref) -> bool {
        let eq = self.get_eq(a, b);
        self.is_true(eq)
    }
}
