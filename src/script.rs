//! The line-oriented test-harness script language.
//!
//! Each line is a command; `#` starts a comment. Expressions use a small
//! s-expression grammar over previously defined names:
//!
//! ```text
//! def r                  # fresh atom named r
//! def r (and a (or b c)) # named expression
//! assert_is (or a b) (or b a)
//! assert_equiv x y
//! assert_sat_unequiv x (not y)
//! ```
//!
//! The names `0` and `1` are pre-bound to the constants.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use crate::context::Context;
use crate::reference::Ref;

/// A parse or assertion failure, with its source location.
#[derive(Debug, Clone)]
pub struct ScriptError {
    pub path: String,
    pub line: u32,
    pub msg: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path, self.line, self.msg)
    }
}

impl Error for ScriptError {}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LParen,
    RParen,
    Tilde,
    Atom(String),
}

fn tokenize(line: &str) -> Vec<Tok> {
    let mut toks = Vec::new();
    let mut atom = String::new();
    for c in line.chars() {
        match c {
            '(' | ')' | '~' => {
                if !atom.is_empty() {
                    toks.push(Tok::Atom(std::mem::take(&mut atom)));
                }
                toks.push(match c {
                    '(' => Tok::LParen,
                    ')' => Tok::RParen,
                    _ => Tok::Tilde,
                });
            }
            c if c.is_whitespace() => {
                if !atom.is_empty() {
                    toks.push(Tok::Atom(std::mem::take(&mut atom)));
                }
            }
            c => atom.push(c),
        }
    }
    if !atom.is_empty() {
        toks.push(Tok::Atom(atom));
    }
    toks
}

/// Executes script lines against a context.
#[derive(Debug)]
pub struct Runner {
    ctx: Context<String>,
    nodes: HashMap<String, Ref>,
    path: String,
    line_no: u32,
    /// Downgrade `assert_is` failures to stdout diagnostics.
    pub find_mismatches: bool,
    /// Number of downgraded `assert_is` failures so far.
    pub num_mismatches: u64,
}

impl Runner {
    pub fn new(path: impl Into<String>) -> Self {
        let ctx = Context::new();
        let mut nodes = HashMap::new();
        nodes.insert("0".to_string(), ctx.get_false());
        nodes.insert("1".to_string(), ctx.get_true());
        Self {
            ctx,
            nodes,
            path: path.into(),
            line_no: 0,
            find_mismatches: false,
            num_mismatches: 0,
        }
    }

    pub fn context(&self) -> &Context<String> {
        &self.ctx
    }

    /// The handle bound to a script name, if any.
    pub fn node(&self, name: &str) -> Option<Ref> {
        self.nodes.get(name).copied()
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    fn fail(&self, msg: impl Into<String>) -> ScriptError {
        ScriptError {
            path: self.path.clone(),
            line: self.line_no,
            msg: msg.into(),
        }
    }

    fn get_node(&self, id: &str) -> Result<Ref, ScriptError> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| self.fail(format!("undefined node '{}'", id)))
    }

    /// Processes one script line. Blank lines and `#` comments are skipped.
    pub fn run_line(&mut self, line: &str) -> Result<(), ScriptError> {
        self.line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let toks = tokenize(line);
        let mut pos = 0;
        let cmd = match toks.first() {
            Some(Tok::Atom(s)) => s.clone(),
            _ => return Err(self.fail("command expected")),
        };
        pos += 1;

        match cmd.as_str() {
            "def" => {
                let name = match toks.get(pos) {
                    Some(Tok::Atom(s)) => s.clone(),
                    _ => return Err(self.fail("result node expected")),
                };
                pos += 1;
                if self.nodes.contains_key(&name) {
                    return Err(self.fail("result is already defined"));
                }
                let e = if pos == toks.len() {
                    self.ctx.get_term(name.clone())
                } else {
                    let e = self.parse_expr(&toks, &mut pos)?;
                    self.expect_end(&toks, pos)?;
                    e
                };
                self.nodes.insert(name, e);
                Ok(())
            }
            "assert_is" => {
                let a = self.parse_expr(&toks, &mut pos)?;
                let b = self.parse_expr(&toks, &mut pos)?;
                self.expect_end(&toks, pos)?;
                if a != b {
                    let actual = self.ctx.to_expr_string(a);
                    let expected = self.ctx.to_expr_string(b);
                    if self.find_mismatches {
                        println!(
                            "{}: {}: nodes do not match: actual {}, expected {}",
                            self.path, self.line_no, actual, expected
                        );
                        self.num_mismatches += 1;
                        return Ok(());
                    }
                    return Err(self.fail(format!(
                        "nodes do not match\nactual: {}\nexpected: {}",
                        actual, expected
                    )));
                }
                Ok(())
            }
            "assert_equiv" | "assert_unequiv" | "assert_sat_equiv" | "assert_sat_unequiv" => {
                let a = self.parse_expr(&toks, &mut pos)?;
                let b = self.parse_expr(&toks, &mut pos)?;
                self.expect_end(&toks, pos)?;

                let expected = !cmd.ends_with("unequiv");
                let require_sat = cmd.starts_with("assert_sat");
                let before = self.ctx.stats().num_sat_solutions;
                if self.ctx.is_equiv(a, b) != expected {
                    return Err(self.fail("equivalence check failed"));
                }
                if require_sat && self.ctx.stats().num_sat_solutions == before {
                    return Err(self.fail("equivalence check resolved without using SAT solver"));
                }
                Ok(())
            }
            _ => Err(self.fail(format!("unknown command '{}'", cmd))),
        }
    }

    fn expect_end(&self, toks: &[Tok], pos: usize) -> Result<(), ScriptError> {
        if pos != toks.len() {
            return Err(self.fail("unexpected arguments"));
        }
        Ok(())
    }

    fn parse_expr(&mut self, toks: &[Tok], pos: &mut usize) -> Result<Ref, ScriptError> {
        match toks.get(*pos) {
            None => Err(self.fail("expression expected")),
            Some(Tok::RParen) => Err(self.fail("unexpected ')'")),
            Some(Tok::Tilde) => {
                *pos += 1;
                let e = self.parse_expr(toks, pos)?;
                Ok(-e)
            }
            Some(Tok::Atom(s)) => {
                let s = s.clone();
                *pos += 1;
                self.get_node(&s)
            }
            Some(Tok::LParen) => {
                *pos += 1;
                let op = match toks.get(*pos) {
                    Some(Tok::Atom(s)) => s.clone(),
                    _ => return Err(self.fail("operator expected")),
                };
                *pos += 1;
                let mut args = Vec::new();
                loop {
                    match toks.get(*pos) {
                        Some(Tok::RParen) => {
                            *pos += 1;
                            break;
                        }
                        None => return Err(self.fail("missing ')'")),
                        _ => args.push(self.parse_expr(toks, pos)?),
                    }
                }
                self.apply_op(&op, args)
            }
        }
    }

    fn check_num_args(&self, args: &[Ref], n: usize) -> Result<(), ScriptError> {
        if args.len() != n {
            return Err(self.fail(format!("{} arguments expected", n)));
        }
        Ok(())
    }

    fn apply_op(&mut self, op: &str, args: Vec<Ref>) -> Result<Ref, ScriptError> {
        match op {
            "not" => {
                self.check_num_args(&args, 1)?;
                Ok(-args[0])
            }
            "and" => Ok(self.ctx.get_and(args)),
            "or" => Ok(self.ctx.get_or(args)),
            "ifelse" => {
                self.check_num_args(&args, 3)?;
                Ok(self.ctx.ifelse(args[0], args[1], args[2]))
            }
            "eq" => {
                self.check_num_args(&args, 2)?;
                Ok(self.ctx.get_eq(args[0], args[1]))
            }
            _ => Err(self.fail(format!("unknown operator '{}'", op))),
        }
    }
}
