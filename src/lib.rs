//! # eqcheck: testing Boolean expressions for equivalence
//!
//! **`eqcheck`** decides whether two Boolean expressions agree under every
//! assignment. Expressions are built from named atoms and the connectives
//! NOT, OR, AND, IF-THEN-ELSE and EQ over a shared [`Context`], which hands
//! out a canonical handle for every distinct expression and answers
//! `is_unsat` and `is_equiv` queries.
//!
//! ## How it works
//!
//! - **Hash consing with polarity-tagged handles**: every distinct node is
//!   stored once, and a [`Ref`][crate::reference::Ref] packs a node index
//!   together with an inversion bit, so negation is free and `~~x == x`
//!   collapses to bit equality.
//! - **Algebraic simplification at construction time**: every constructor
//!   runs a fixpoint of cheap structural rewrites (constant folding,
//!   absorption, shared-premise extraction, multiplexer recognition), so
//!   most equivalences never reach a solver.
//! - **SAT as the fallback**: when the rewrites are not enough,
//!   `is_unsat` Tseitin-encodes the DAG into CNF and asks a CDCL solver.
//!   Equivalences proven this way are cached back into the canonical map,
//!   so they are free from then on.
//!
//! ## Basic usage
//!
//! ```rust
//! use eqcheck::context::Context;
//!
//! let mut ctx = Context::<String>::new();
//! let a = ctx.get_term("a".to_string());
//! let b = ctx.get_term("b".to_string());
//!
//! // (a | b) and (b | a) are the same node.
//! let x = ctx.get_or([a, b]);
//! let y = ctx.get_or([b, a]);
//! assert_eq!(x, y);
//!
//! // a & (b | ~a) simplifies to a & b without touching the solver.
//! let lhs = ctx.get_or([b, -a]);
//! let lhs = ctx.get_and([a, lhs]);
//! let rhs = ctx.get_and([a, b]);
//! assert_eq!(lhs, rhs);
//! assert_eq!(ctx.stats().num_sat_solutions, 0);
//!
//! // Equivalence queries fall back to SAT only when needed.
//! assert!(ctx.is_equiv(lhs, rhs));
//! ```
//!
//! ## Core components
//!
//! - [`context`]: the node store, interning and canonical map.
//! - [`or`], [`ifelse`]: the constructors and their simplification
//!   pipelines.
//! - [`simplify`]: rewriting under assumed-false premises.
//! - [`sat`]: Tseitin encoding and the CDCL backend.
//! - [`script`]: the line-oriented harness language used by the `eqcheck`
//!   binary.

pub mod context;
pub mod eval;
pub mod ifelse;
pub mod node;
pub mod or;
pub mod print;
pub mod reference;
pub mod sat;
pub mod script;
pub mod simplify;
pub mod stats;
