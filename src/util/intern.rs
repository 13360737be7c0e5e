use std::{collections::HashMap, fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, rc::Rc};

/// A handle to some interned lexical text. To retrieve the `&str`, use
/// [`Interner::get`].
///
/// Two handles compare equal if and only if they were produced by the same
/// interner for the same text, which is what makes them usable as symbol
/// table keys.
pub struct Interned<T: ?Sized> {
    // NonZeroU32 keeps `Option<Interned<_>>` the size of a handle.
    handle: NonZeroU32,
    _ty: PhantomData<T>,
}

impl<T: ?Sized> Interned<T> {
    const fn from_index(index: usize) -> Self {
        // The index is bounded by `u32::MAX - 1` in `Interner::intern`.
        #[allow(clippy::cast_possible_truncation)]
        let raw = index as u32 + 1;
        match NonZeroU32::new(raw) {
            Some(handle) => Interned {
                handle,
                _ty: PhantomData,
            },
            None => unreachable!(),
        }
    }

    const fn index(self) -> usize {
        (self.handle.get() - 1) as usize
    }
}

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Interned<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: ?Sized> Eq for Interned<T> {}

impl<T: ?Sized> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interned({})", self.handle)
    }
}

impl<T: ?Sized> From<&Interned<T>> for Interned<T> {
    fn from(value: &Interned<T>) -> Self {
        *value
    }
}

/// The lexical-text interning service. Hands out one stable handle per
/// distinct text.
pub struct Interner<T: ?Sized = str> {
    map: HashMap<Rc<T>, Interned<T>>,
    vec: Vec<Rc<T>>,
}

impl fmt::Debug for Interner<str> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.vec.iter().enumerate().map(|(i, text)| (i + 1, text)))
            .finish()
    }
}

impl Interner<str> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    /// Interns the provided text, returning its canonical handle.
    pub fn intern(&mut self, text: &str) -> Interned<str> {
        if let Some(handle) = self.map.get(text) {
            return *handle;
        }
        assert!(
            self.vec.len() < u32::MAX as usize - 1,
            "interner out of capacity"
        );
        let handle = Interned::from_index(self.vec.len());
        let key: Rc<str> = Rc::from(text);
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, handle);
        handle
    }

    /// Returns the text behind the provided handle.
    ///
    /// Panics if the handle was produced by another interner.
    pub fn get(&self, handle: impl Into<Interned<str>>) -> &str {
        &self.vec[handle.into().index()]
    }
}

#[cfg(test)]
impl Interner<str> {
    pub(crate) fn len(&self) -> usize {
        self.vec.len()
    }

    /// Returns the handle of already-interned text, without interning it.
    pub(crate) fn lookup(&self, text: &str) -> Option<Interned<str>> {
        self.map.get(text).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_handle() {
        let mut i = Interner::with_capacity(3);

        let node1 = i.intern("node");
        let next1 = i.intern("next");
        let val1 = i.intern("val");

        let node2 = i.intern("node");
        let next2 = i.intern("next");
        let val2 = i.intern("val");

        assert_eq!(node1, node2);
        assert_eq!(next1, next2);
        assert_eq!(val1, val2);
        assert_ne!(node1, next1);
        assert_eq!(i.len(), 3);

        assert_eq!(i.get(node1), "node");
        assert_eq!(i.get(next2), "next");
    }

    #[test]
    fn lookup_does_not_intern() {
        let mut i = Interner::with_capacity(1);
        assert_eq!(i.lookup("main"), None);
        let main = i.intern("main");
        assert_eq!(i.lookup("main"), Some(main));
        assert_eq!(i.len(), 1);
    }
}
