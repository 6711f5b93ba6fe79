pub mod parser;

pub use parser::Parser;

use tarn_syntax::ast::Program;
use tarn_syntax::error::Error;
use tarn_syntax::token::Token;

/// Top-level adapter between the `Result`-threaded parser and an injected
/// error handler: the first parse failure is delivered to `handler` exactly
/// once and no program is returned. The handler does not hand control back.
pub fn parse_with_handler<F>(tokens: Vec<Token>, handler: F) -> Option<Program>
where
    F: FnOnce(&Error),
{
    let mut parser = Parser::new(tokens);
    match parser.parse_program() {
        Ok(program) => Some(program),
        Err(err) => {
            handler(&err);
            None
        }
    }
}
