/// The reader takes a syntax tree in its textual interchange format, mapping
/// it into an in-memory tree.
pub mod reader;

/// The analyzer classifies every node of a tree, builds the global, field and
/// local symbol tables, and reports every declaration.
pub mod analyzer;

/// The emitter takes an analyzed tree and lowers it into C-like intermediate
/// code.
pub mod emit;

pub mod ast;
pub mod symbol;
pub mod token;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
