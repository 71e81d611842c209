//! Human-readable output in script syntax.
//!
//! Shared internal nodes are given `t0`, `t1`, ... names and emitted as
//! `def tN (...)` lines before the root expression, so the output parses
//! back through the script harness to a bit-equal handle.

use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::context::{Context, Token, FALSE_INDEX};
use crate::node::NodeKind;
use crate::reference::Ref;

impl<T: Token> Context<T> {
    /// Writes `h` to `sink` with common-subexpression naming.
    pub fn print<W: Write>(&self, sink: &mut W, h: Ref) -> fmt::Result {
        let h = self.follow(h);

        // Count how often each entry is referenced in the followed DAG.
        let mut counts: HashMap<u32, usize> = HashMap::new();
        let mut stack = vec![h];
        while let Some(x) = stack.pop() {
            let x = self.follow(x);
            let count = counts.entry(x.index()).or_insert(0);
            *count += 1;
            if *count == 1 && x.index() != FALSE_INDEX {
                for &a in &self.node(x.index()).args {
                    stack.push(a);
                }
            }
        }

        // Multiply referenced internal nodes get names, in creation order
        // (children are always created before their parents).
        let mut shared: Vec<u32> = counts
            .iter()
            .filter(|&(&index, &count)| {
                count > 1 && index != FALSE_INDEX && self.node(index).kind != NodeKind::Term
            })
            .map(|(&index, _)| index)
            .collect();
        shared.sort_unstable();

        let mut names: HashMap<u32, String> = HashMap::new();
        for (k, &index) in shared.iter().enumerate() {
            names.insert(index, format!("t{}", k));
        }

        for &index in &shared {
            write!(sink, "def {} ", names[&index])?;
            self.write_node(sink, index, &names)?;
            writeln!(sink)?;
        }
        self.write_expr(sink, h, &names)
    }

    /// Single-line rendering of `h`, with no subexpression naming.
    pub fn to_expr_string(&self, h: Ref) -> String {
        let mut s = String::new();
        self.write_expr(&mut s, h, &HashMap::new())
            .expect("writing to a String cannot fail");
        s
    }

    fn write_expr<W: Write>(
        &self,
        sink: &mut W,
        h: Ref,
        names: &HashMap<u32, String>,
    ) -> fmt::Result {
        let h = self.follow(h);
        if self.is_true(h) {
            return write!(sink, "1");
        }
        if self.is_false(h) {
            return write!(sink, "0");
        }
        if h.is_inverted() {
            write!(sink, "~")?;
            return self.write_expr(sink, -h, names);
        }
        if let Some(name) = names.get(&h.index()) {
            return write!(sink, "{}", name);
        }
        self.write_node(sink, h.index(), names)
    }

    fn write_node<W: Write>(
        &self,
        sink: &mut W,
        index: u32,
        names: &HashMap<u32, String>,
    ) -> fmt::Result {
        let n = self.node(index);
        match n.kind {
            NodeKind::Term => {
                let term = n.term.as_ref().expect("the sentinel prints as a constant");
                write!(sink, "{}", term)
            }
            NodeKind::Or => {
                write!(sink, "(or")?;
                for &a in &n.args {
                    write!(sink, " ")?;
                    self.write_expr(sink, a, names)?;
                }
                write!(sink, ")")
            }
            NodeKind::Ifelse => {
                write!(sink, "(ifelse ")?;
                self.write_expr(sink, n.args[0], names)?;
                write!(sink, " ")?;
                self.write_expr(sink, n.args[1], names)?;
                write!(sink, " ")?;
                self.write_expr(sink, n.args[2], names)?;
                write!(sink, ")")
            }
            NodeKind::Eq => {
                write!(sink, "(eq ")?;
                self.write_expr(sink, n.args[0], names)?;
                write!(sink, " ")?;
                self.write_expr(sink, n.args[1], names)?;
                write!(sink, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ctx: &mut Context<String>, names: &[&str]) -> Vec<Ref> {
        names.iter().map(|n| ctx.get_term(n.to_string())).collect()
    }

    #[test]
    fn test_print_constants() {
        let ctx = Context::<String>::new();
        assert_eq!(ctx.to_expr_string(ctx.get_false()), "0");
        assert_eq!(ctx.to_expr_string(ctx.get_true()), "1");
    }

    #[test]
    fn test_print_term() {
        let mut ctx = Context::new();
        let ts = terms(&mut ctx, &["a"]);
        assert_eq!(ctx.to_expr_string(ts[0]), "a");
        assert_eq!(ctx.to_expr_string(-ts[0]), "~a");
    }

    #[test]
    fn test_print_or() {
        let mut ctx = Context::new();
        let ts = terms(&mut ctx, &["a", "b"]);
        let or = ctx.get_or([ts[0], ts[1]]);
        assert_eq!(ctx.to_expr_string(or), "(or a b)");
        assert_eq!(ctx.to_expr_string(-or), "~(or a b)");
    }

    #[test]
    fn test_print_ifelse_and_eq() {
        let mut ctx = Context::new();
        let ts = terms(&mut ctx, &["a", "b", "c"]);
        let (a, b, c) = (ts[0], ts[1], ts[2]);
        let ite = ctx.ifelse(a, b, c);
        assert_eq!(ctx.to_expr_string(ite), "(ifelse a b c)");
        let eq = ctx.get_eq(a, b);
        assert_eq!(ctx.to_expr_string(eq), "(eq a b)");
    }

    #[test]
    fn test_print_names_shared_nodes() {
        let mut ctx = Context::new();
        let ts = terms(&mut ctx, &["a", "b", "c", "d"]);
        let (a, b, c, d) = (ts[0], ts[1], ts[2], ts[3]);

        let ab = ctx.get_or([a, b]);
        let x = ctx.get_or([ab, c]);
        let y = ctx.get_or([ab, d]);
        let root = ctx.get_and([x, y]);

        let mut out = String::new();
        ctx.print(&mut out, root).unwrap();
        // The shared (a|b) gets a name and a def line.
        assert!(out.starts_with("def t0 (or a b)\n"), "unexpected output: {}", out);
        assert!(out.contains("t0"), "unexpected output: {}", out);
    }
}
