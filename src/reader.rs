//! Reads a syntax tree from its line-based interchange format:
//!
//! ```text
//! ROOT 0.0.0
//!   FUNCTION 0.1.0
//!     INT 0.1.0 int
//!       IDENT 0.1.4 main
//! ```
//!
//! Each line holds a node kind, its `filenr.linenr.offset` location and,
//! optionally, its text (the rest of the line, verbatim). Children are
//! indented two spaces deeper than their parent.

use tracing::{debug, trace};

use crate::{
    ast::Node,
    token::{Located, Location, TokenKind, KINDS},
    util::intern::Interner,
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type ReadResult<T> = Result<T, (T, Vec<Located<Error>>)>;

const INDENT_WIDTH: usize = 2;

/// Reads the tree in `src`.
///
/// Errors are located at their line and column in `src` (with file number
/// zero), not at the coordinates the tree itself carries. A line that can't be
/// read is skipped along with everything nested under it.
pub fn read_tree(src: &str, ident_interner: &mut Interner<str>) -> ReadResult<Node> {
    let mut r = Reader {
        ident_interner,
        errors: Vec::new(),
    };
    let read_result = r.read(src);

    let success = read_result.is_ok();
    let root = read_result.unwrap_or_else(|()| {
        let text = r.ident_interner.intern("");
        Node::new(TokenKind::Root, Location::default(), text)
    });
    if r.errors.is_empty() {
        assert!(success);
        Ok(root)
    } else {
        Err((root, r.errors))
    }
}

struct Reader<'ident> {
    ident_interner: &'ident mut Interner<str>,
    errors: Vec<Located<Error>>,
}

impl Reader<'_> {
    fn read(&mut self, src: &str) -> Result<Node> {
        // The open nodes along the current path. The last one has depth
        // `stack.len() - 1`.
        let mut stack: Vec<Node> = Vec::with_capacity(16);
        let mut base_indent = None;
        let mut seen_root = false;
        let mut skip_below = None;

        for (index, line) in src.lines().enumerate() {
            let linenr = index + 1;
            let content = line.trim_start_matches(' ');
            if content.trim().is_empty() {
                continue;
            }
            let indent = line.len() - content.len();
            let here = Location::new(0, linenr, indent);

            let base = *base_indent.get_or_insert(indent);
            let relative = indent.checked_sub(base).filter(|r| r % INDENT_WIDTH == 0);
            let Some(relative) = relative else {
                self.error(here.wrap(Error::BadIndentation { indent }));
                continue;
            };
            let depth = relative / INDENT_WIDTH;

            match skip_below {
                Some(skipped) if depth > skipped => continue,
                _ => skip_below = None,
            }
            if depth == 0 && seen_root {
                self.error(here.wrap(Error::MultipleRoots));
                skip_below = Some(depth);
                continue;
            }
            if depth > stack.len() {
                self.error(here.wrap(Error::BadIndentation { indent }));
                skip_below = Some(depth);
                continue;
            }
            let Ok(node) = self.read_line(here, content) else {
                skip_below = Some(depth);
                continue;
            };

            trace!(linenr, depth, kind = %node.kind, "read node");
            close(&mut stack, depth);
            seen_root = true;
            stack.push(node);
        }

        close(&mut stack, 0);
        match stack.pop() {
            Some(root) => {
                debug!(children = root.children.len(), "read tree");
                Ok(root)
            }
            None if self.errors.is_empty() => {
                self.error(Location::new(0, 1, 0).wrap(Error::EmptyInput));
                Err(())
            }
            None => Err(()),
        }
    }

    fn read_line(&mut self, here: Location, content: &str) -> Result<Node> {
        let (kind, rest) = content.split_once(' ').unwrap_or((content, ""));
        let Some(&kind) = KINDS.get(kind) else {
            self.error(here.wrap(Error::UnknownKind(kind.into())));
            return Err(());
        };

        let (loc, text) = rest.split_once(' ').unwrap_or((rest, ""));
        let Some(loc) = parse_location(loc) else {
            self.error(here.wrap(Error::BadLocation(loc.into())));
            return Err(());
        };

        let text = self.ident_interner.intern(text);
        Ok(Node::new(kind, loc, text))
    }

    fn error(&mut self, error: Located<Error>) {
        self.errors.push(error);
    }
}

/// Attaches every open node deeper than `depth` to its parent, keeping the
/// root open.
fn close(stack: &mut Vec<Node>, depth: usize) {
    while stack.len() > depth.max(1) {
        let Some(child) = stack.pop() else { break };
        if let Some(parent) = stack.last_mut() {
            parent.children.push(child);
        }
    }
}

fn parse_location(text: &str) -> Option<Location> {
    let mut parts = text.split('.').map(str::parse::<usize>);
    let filenr = parts.next()?.ok()?;
    let linenr = parts.next()?.ok()?;
    let offset = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Location::new(filenr, linenr, offset))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    EmptyInput,
    MultipleRoots,
    BadIndentation { indent: usize },
    UnknownKind(Box<str>),
    BadLocation(Box<str>),
}
