use std::fmt;

use crate::{token::Located, util::intern::Interner};

pub mod error;
pub mod tree;

pub struct Context<'ident> {
    pub ident_interner: &'ident Interner<str>,
}

impl<'ident> Context<'ident> {
    pub fn new(ident_interner: &'ident Interner<str>) -> Context<'ident> {
        Context { ident_interner }
    }
}

/// Analogous to [`std::fmt::Display`], but also receives the program context,
/// such as the current [`Interner`].
pub trait Show {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result;

    /// Returns a type which can be displayed.
    fn display(&self, ctx: &Context<'_>) -> impl fmt::Display
    where
        Self: Sized,
    {
        Display(self, ctx)
    }
}

/// The message of a diagnostic, without its location.
pub trait Diagnostic {
    fn describe(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result;
}

/// A located diagnostic is shown as its message. The alternate flag (`{:#}`)
/// prefixes it with the location.
impl<E: Diagnostic> Show for Located<E> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}: ", self.loc)?;
        }
        self.inner.describe(f, ctx)
    }
}

/// Renders each diagnostic with its location.
pub fn render_all<E: Diagnostic>(ctx: &Context<'_>, errors: &[Located<E>]) -> Vec<String> {
    errors
        .iter()
        .map(|error| format!("{:#}", error.display(ctx)))
        .collect()
}

struct Display<'this, 'ctx, 'ident, T: Show>(&'this T, &'ctx Context<'ident>);

impl<T> fmt::Display for Display<'_, '_, '_, T>
where
    T: Show,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Display(this, ctx) = self;
        this.show(f, ctx)
    }
}
