//! Evaluates a compiled query against a silo.

use tracing::debug;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::reader;
use crate::silo::Silo;

use super::ast::{CmpOp, Expr, Func, NameTest, Step};

#[derive(Debug, Clone)]
enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    None,
}

impl Value {
    fn as_bool(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::None => false,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Str(s) => s.parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::None => None,
        }
    }

    fn as_string(&self) -> Option<String> {
        match self {
            Value::Num(n) => Some(n.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::None => None,
        }
    }
}

/// Per-candidate context the predicate evaluator is run in: the node
/// itself plus its 1-based position and the size of the sibling group it
/// was drawn from, both scoped to the current step (see §4.4).
struct Context<'a> {
    silo: &'a Silo,
    offset: usize,
    position: usize,
    last: usize,
}

fn record_at(silo: &Silo, offset: usize) -> Result<reader::ElementRecord> {
    reader::decode(silo.buf(), offset)?.ok_or_else(|| Error::internal("candidate offset is a sentinel"))
}

fn eval(expr: &Expr, ctx: &Context) -> Result<Value> {
    match expr {
        Expr::Int(n) => Ok(Value::Num(*n as f64)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Attr(name) => {
            let rec = record_at(ctx.silo, ctx.offset)?;
            let v = reader::attr(ctx.silo.buf(), ctx.silo.string_region_offset(), &rec, name)?;
            Ok(v.map(|s| Value::Str(s.to_string())).unwrap_or(Value::None))
        }
        Expr::ElementNameIs(name) => {
            let rec = record_at(ctx.silo, ctx.offset)?;
            let element = reader::element_name(ctx.silo.buf(), ctx.silo.string_region_offset(), &rec)?;
            Ok(Value::Bool(element == name))
        }
        Expr::Call(func, args) => eval_call(*func, args, ctx),
        Expr::Compare(lhs, op, rhs) => {
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            Ok(Value::Bool(compare(&l, op, &r)))
        }
        Expr::And(lhs, rhs) => Ok(Value::Bool(eval(lhs, ctx)?.as_bool() && eval(rhs, ctx)?.as_bool())),
        Expr::Or(lhs, rhs) => Ok(Value::Bool(eval(lhs, ctx)?.as_bool() || eval(rhs, ctx)?.as_bool())),
    }
}

fn eval_call(func: Func, args: &[Expr], ctx: &Context) -> Result<Value> {
    match func {
        Func::Text => {
            let rec = record_at(ctx.silo, ctx.offset)?;
            let t = reader::text(ctx.silo.buf(), ctx.silo.string_region_offset(), &rec)?;
            Ok(t.map(|s| Value::Str(s.to_string())).unwrap_or(Value::None))
        }
        Func::First => Ok(Value::Num(1.0)),
        Func::Last => Ok(Value::Num(ctx.last as f64)),
        Func::Position => Ok(Value::Num(ctx.position as f64)),
        Func::Contains => {
            let a = eval(&args[0], ctx)?.as_string().unwrap_or_default();
            let b = eval(&args[1], ctx)?.as_string().unwrap_or_default();
            Ok(Value::Bool(a.contains(&b)))
        }
        Func::StartsWith => {
            let a = eval(&args[0], ctx)?.as_string().unwrap_or_default();
            let b = eval(&args[1], ctx)?.as_string().unwrap_or_default();
            Ok(Value::Bool(a.starts_with(&b)))
        }
        Func::StringLength => {
            let a = eval(&args[0], ctx)?.as_string().unwrap_or_default();
            Ok(Value::Num(a.chars().count() as f64))
        }
        Func::Number => {
            let a = eval(&args[0], ctx)?;
            a.as_number()
                .map(Value::Num)
                .ok_or_else(|| Error::invalid_argument("number() of a non-numeric value"))
        }
    }
}

fn compare(lhs: &Value, op: &CmpOp, rhs: &Value) -> bool {
    let either_none = matches!(lhs, Value::None) || matches!(rhs, Value::None);
    match op {
        CmpOp::Eq => !either_none && values_equal(lhs, rhs),
        CmpOp::Ne => {
            if matches!(lhs, Value::None) && matches!(rhs, Value::None) {
                false
            } else if either_none {
                true
            } else {
                !values_equal(lhs, rhs)
            }
        }
        CmpOp::Lt | CmpOp::Gt | CmpOp::Le | CmpOp::Ge => {
            if either_none {
                return false;
            }
            let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
                return false;
            };
            match op {
                CmpOp::Lt => a < b,
                CmpOp::Gt => a > b,
                CmpOp::Le => a <= b,
                CmpOp::Ge => a >= b,
                _ => unreachable!(),
            }
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Num(x), Value::Num(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Num(x), Value::Str(y)) | (Value::Str(y), Value::Num(x)) => {
            y.parse::<f64>().map(|yy| yy == *x).unwrap_or(false)
        }
        (Value::Bool(x), other) | (other, Value::Bool(x)) => other.as_bool() == *x,
        _ => false,
    }
}

/// Compiled query: a sequence of steps, each with a name filter and
/// predicates, plus whether the source path started with `/`.
pub struct CompiledQuery {
    pub(super) absolute: bool,
    pub(super) steps: Vec<Step>,
}

impl CompiledQuery {
    pub fn execute_from(
        &self,
        silo: &Silo,
        start_offset: usize,
        is_root_scoped: bool,
        limit: usize,
    ) -> Result<Vec<Node>> {
        if self.absolute && !is_root_scoped {
            return Err(Error::unsupported("absolute path not allowed from a node-scoped query"));
        }

        let last_step = self.steps.len().saturating_sub(1);
        let mut current = vec![start_offset];
        for (idx, step) in self.steps.iter().enumerate() {
            // Only the final step's output feeds the result directly, so
            // only it can stop early: earlier steps must keep evaluating
            // every candidate in full, since later steps' position()/
            // last() and matching depend on their complete sibling sets.
            let stop_after = if idx == last_step && limit > 0 { Some(limit) } else { None };
            current = run_step(silo, &current, step, stop_after)?;
            if current.is_empty() {
                break;
            }
        }

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for offset in current {
            if seen.insert(offset) {
                out.push(Node::new(silo.clone(), offset));
                if limit > 0 && out.len() >= limit {
                    break;
                }
            }
        }
        debug!(start_offset, matches = out.len(), limit, "executed query");
        Ok(out)
    }
}

/// Runs one step over every parent offset in `parents`, returning the
/// matching children in document order. If `stop_after` is set, predicate
/// evaluation stops as soon as that many candidates have already passed —
/// an error thrown by a later candidate's predicate (e.g. `number()` on a
/// non-numeric value) never aborts a query that already has enough
/// matches, and `position()`/`last()` for candidates already evaluated are
/// unaffected since they're scoped to the already-complete matching list.
fn run_step(
    silo: &Silo,
    parents: &[usize],
    step: &Step,
    stop_after: Option<usize>,
) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    'parents: for &parent_offset in parents {
        let parent_rec = record_at(silo, parent_offset)?;
        let mut siblings = Vec::new();
        let mut cur = reader::child(silo.buf(), &parent_rec)?;
        while let Some(rec) = cur {
            siblings.push(rec);
            cur = reader::next(silo.buf(), &rec)?;
        }

        let mut matching = Vec::new();
        for rec in siblings {
            if name_matches(silo, &rec, &step.name_test)? {
                matching.push(rec);
            }
        }

        let last = matching.len();
        for (idx, rec) in matching.into_iter().enumerate() {
            if let Some(stop_after) = stop_after {
                if out.len() >= stop_after {
                    break 'parents;
                }
            }
            let ctx = Context {
                silo,
                offset: rec.offset,
                position: idx + 1,
                last,
            };
            let mut passes = true;
            for pred in &step.predicates {
                if !eval(pred, &ctx)?.as_bool() {
                    passes = false;
                    break;
                }
            }
            if passes {
                out.push(rec.offset);
            }
        }
    }
    Ok(out)
}

fn name_matches(silo: &Silo, rec: &reader::ElementRecord, name_test: &NameTest) -> Result<bool> {
    match name_test {
        NameTest::Wildcard => Ok(true),
        NameTest::Name(name) => {
            let element = reader::element_name(silo.buf(), silo.string_region_offset(), rec)?;
            Ok(element == name)
        }
    }
}
