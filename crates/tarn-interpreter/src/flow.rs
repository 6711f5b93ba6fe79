//! Control flow for the interpreter.

use crate::value::Value;

#[derive(Debug)]
pub(crate) enum Flow {
    /// Continue with the next statement
    Normal,
    /// Unwind to the nearest function boundary, carrying the returned value
    Return(Option<Value>),
}
