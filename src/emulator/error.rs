use thiserror::Error;

/// Reasons a program can be refused before it touches machine memory.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LoadError {
    #[error("program is {size} bytes, but at most {max} bytes fit in memory")]
    ProgramTooLarge { size: usize, max: usize },
}

/// Failures of the bounded call stack.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("call stack overflow")]
    Overflow,
    #[error("return with an empty call stack")]
    Underflow,
}
