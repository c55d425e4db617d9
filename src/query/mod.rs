//! XPath-subset compiler and executor.
//!
//! The grammar is small and fixed, so the compiler is a hand-written
//! recursive-descent parser over a hand-written lexer rather than a
//! parser-combinator or grammar-generator dependency, matching how the
//! crate's own XML tokenizer is written.

mod ast;
mod exec;
mod lexer;
mod parser;

use tracing::debug;

use crate::error::Result;
use crate::node::Node;
use crate::silo::Silo;

/// A compiled XPath-subset expression, ready to run against a silo.
pub struct Query(exec::CompiledQuery);

impl Query {
    /// Compiles `xpath`. Fails with `Unsupported` (citing a token
    /// position) on anything outside the accepted grammar.
    pub fn compile(xpath: &str) -> Result<Query> {
        let mut parser = parser::Parser::new(xpath)?;
        let (absolute, steps) = parser.parse_path(true)?;
        debug!(xpath, steps = steps.len(), absolute, "compiled query");
        Ok(Query(exec::CompiledQuery { absolute, steps }))
    }

    pub fn execute_from(
        &self,
        silo: &Silo,
        start_offset: usize,
        is_root_scoped: bool,
        limit: usize,
    ) -> Result<Vec<Node>> {
        self.0.execute_from(silo, start_offset, is_root_scoped, limit)
    }
}
