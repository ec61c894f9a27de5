use crate::emulator::error::StackError;

/// The largest capacity any profile asks for.
pub const MAX_STACK_SIZE: usize = 16;

/// A call stack of return addresses with a fixed capacity.
///
/// Storage is allocated up front, pushing and popping never allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    entries: [u16; MAX_STACK_SIZE],
    depth: usize,
    capacity: usize,
}

impl CallStack {
    /// Create an empty stack. Capacities above `MAX_STACK_SIZE` are clamped.
    pub fn with_capacity(capacity: usize) -> CallStack {
        CallStack {
            entries: [0; MAX_STACK_SIZE],
            depth: 0,
            capacity: capacity.min(MAX_STACK_SIZE),
        }
    }

    /// Push a return address, failing without side effects when full.
    pub fn push(&mut self, addr: u16) -> Result<(), StackError> {
        if self.depth >= self.capacity {
            return Err(StackError::Overflow);
        }
        self.entries[self.depth] = addr;
        self.depth += 1;
        Ok(())
    }

    /// Pop the most recent return address, failing without side effects when empty.
    pub fn pop(&mut self) -> Result<u16, StackError> {
        if self.depth == 0 {
            return Err(StackError::Underflow);
        }
        self.depth -= 1;
        Ok(self.entries[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// The live part of the stack, oldest return address first.
    pub fn as_slice(&self) -> &[u16] {
        &self.entries[..self.depth]
    }
}
