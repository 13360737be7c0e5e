use std::fmt;

/// A source coordinate, as produced by the parser.
///
/// `blocknr` is not part of the parser's output: it is assigned by the
/// analyzer to parameters and locals, and is zero everywhere else.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub filenr: usize,
    pub linenr: usize,
    pub offset: usize,
    pub blocknr: usize,
}

impl Location {
    pub const fn new(filenr: usize, linenr: usize, offset: usize) -> Location {
        Location {
            filenr,
            linenr,
            offset,
            blocknr: 0,
        }
    }

    /// Wraps the provided value with this location.
    pub fn wrap<T>(self, inner: T) -> Located<T> {
        Located { loc: self, inner }
    }

    /// Returns the label suffix for this coordinate, in the form
    /// `_<filenr>_<linenr>_<offset>`.
    ///
    /// Two distinct coordinates never produce the same suffix.
    pub fn label_suffix(&self) -> impl fmt::Display {
        let Location {
            filenr,
            linenr,
            offset,
            ..
        } = *self;
        LabelSuffix(filenr, linenr, offset)
    }
}

struct LabelSuffix(usize, usize, usize);

impl fmt::Display for LabelSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}_{}_{}", self.0, self.1, self.2)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location({self}, block: {})", self.blocknr)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.filenr, self.linenr, self.offset)
    }
}

/// Some value paired with the location it refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located<T> {
    pub loc: Location,
    pub inner: T,
}

impl<T> Located<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            loc: self.loc,
            inner: f(self.inner),
        }
    }
}

/// The closed set of node kinds a syntax tree is built from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Root,

    // Declarations
    Struct,
    FieldList,
    Function,
    ParamList,
    Block,
    VarDecl,
    Array,
    TypeId,
    Void,
    Int,
    String,
    /// Either the `null` literal (no children) or a type marker.
    Null,
    Ident,
    Field,

    // Statements
    While,
    If,
    Return,

    // Binary operators
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,

    // Unary operators
    Pos,
    Neg,
    Not,

    // Allocations
    New,
    NewString,
    NewArray,
    NewPointerArray,

    Call,
    Index,
    Dot,

    // Literals
    IntCon,
    CharCon,
    StringCon,
}

impl TokenKind {
    /// The name used for this kind in the tree interchange format.
    pub const fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Root => "ROOT",
            Struct => "STRUCT",
            FieldList => "FIELDLIST",
            Function => "FUNCTION",
            ParamList => "PARAMLIST",
            Block => "BLOCK",
            VarDecl => "VARDECL",
            Array => "ARRAY",
            TypeId => "TYPEID",
            Void => "VOID",
            Int => "INT",
            String => "STRING",
            Null => "NULL",
            Ident => "IDENT",
            Field => "FIELD",
            While => "WHILE",
            If => "IF",
            Return => "RETURN",
            Eq => "EQ",
            Ne => "NE",
            Lt => "LT",
            Le => "LE",
            Gt => "GT",
            Ge => "GE",
            Plus => "ADD",
            Minus => "SUB",
            Star => "MUL",
            Slash => "DIV",
            Assign => "ASSIGN",
            Pos => "POS",
            Neg => "NEG",
            Not => "NOT",
            New => "NEW",
            NewString => "NEWSTRING",
            NewArray => "NEWARRAY",
            NewPointerArray => "NEWPTRARRAY",
            Call => "CALL",
            Index => "INDEX",
            Dot => "DOT",
            IntCon => "INTCON",
            CharCon => "CHARCON",
            StringCon => "STRINGCON",
        }
    }

    /// Returns the target-language spelling of an operator kind.
    pub const fn operator(self) -> Option<&'static str> {
        use TokenKind::*;
        let op = match self {
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Plus | Pos => "+",
            Minus | Neg => "-",
            Star => "*",
            Slash => "/",
            Assign => "=",
            Not => "!",
            _ => return None,
        };
        Some(op)
    }

    pub const fn is_binary(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Eq | Ne | Lt | Le | Gt | Ge | Plus | Minus | Star | Slash | Assign
        )
    }

    pub const fn is_unary(self) -> bool {
        matches!(self, TokenKind::Pos | TokenKind::Neg | TokenKind::Not)
    }

    /// Whether this kind may declare an identifier as a type marker (such as
    /// `int x` or `node x`).
    pub const fn is_type(self) -> bool {
        use TokenKind::*;
        matches!(self, Void | Int | String | Null | TypeId)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub static KINDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "ROOT" => TokenKind::Root,
    "STRUCT" => TokenKind::Struct,
    "FIELDLIST" => TokenKind::FieldList,
    "FUNCTION" => TokenKind::Function,
    "PARAMLIST" => TokenKind::ParamList,
    "BLOCK" => TokenKind::Block,
    "VARDECL" => TokenKind::VarDecl,
    "ARRAY" => TokenKind::Array,
    "TYPEID" => TokenKind::TypeId,
    "VOID" => TokenKind::Void,
    "INT" => TokenKind::Int,
    "STRING" => TokenKind::String,
    "NULL" => TokenKind::Null,
    "IDENT" => TokenKind::Ident,
    "FIELD" => TokenKind::Field,
    "WHILE" => TokenKind::While,
    "IF" => TokenKind::If,
    "RETURN" => TokenKind::Return,
    "EQ" => TokenKind::Eq,
    "NE" => TokenKind::Ne,
    "LT" => TokenKind::Lt,
    "LE" => TokenKind::Le,
    "GT" => TokenKind::Gt,
    "GE" => TokenKind::Ge,
    "ADD" => TokenKind::Plus,
    "SUB" => TokenKind::Minus,
    "MUL" => TokenKind::Star,
    "DIV" => TokenKind::Slash,
    "ASSIGN" => TokenKind::Assign,
    "POS" => TokenKind::Pos,
    "NEG" => TokenKind::Neg,
    "NOT" => TokenKind::Not,
    "NEW" => TokenKind::New,
    "NEWSTRING" => TokenKind::NewString,
    "NEWARRAY" => TokenKind::NewArray,
    "NEWPTRARRAY" => TokenKind::NewPointerArray,
    "CALL" => TokenKind::Call,
    "INDEX" => TokenKind::Index,
    "DOT" => TokenKind::Dot,
    "INTCON" => TokenKind::IntCon,
    "CHARCON" => TokenKind::CharCon,
    "STRINGCON" => TokenKind::StringCon,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_table() {
        for (name, kind) in KINDS.entries() {
            assert_eq!(kind.name(), *name);
        }
    }

    #[test]
    fn label_suffix_is_pure_function_of_coordinates() {
        let a = Location::new(0, 12, 4);
        let mut b = Location::new(0, 12, 4);
        b.blocknr = 7;
        assert_eq!(a.label_suffix().to_string(), "_0_12_4");
        assert_eq!(a.label_suffix().to_string(), b.label_suffix().to_string());

        let distinct = [
            Location::new(0, 1, 23),
            Location::new(0, 12, 3),
            Location::new(1, 2, 3),
            Location::new(0, 123, 0),
        ];
        let suffixes: std::collections::HashSet<_> = distinct
            .iter()
            .map(|loc| loc.label_suffix().to_string())
            .collect();
        assert_eq!(suffixes.len(), distinct.len());
    }
}
