use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

/// Element kinds the engine can compress: fixed-width, hashable, ordered values.
pub trait Element: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {}

impl<T> Element for T where T: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {}

/// Séquence immuable comparée et hachée par valeur.
///
/// Cloning is cheap (shared storage). Used both for blocks of the partitioned
/// array and for the compressed buffers built from them.
///
/// # Example
/// ```
/// use cm_compress::Chunk;
/// let a = Chunk::from([1, 2, 3]);
/// let b = Chunk::from(vec![1, 2, 3]);
/// assert_eq!(a, b);
/// assert_eq!(&a[1..], &[2, 3]);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chunk<T>(Arc<[T]>);

impl<T: Element> Chunk<T> {
    #[must_use]
    pub fn new(items: &[T]) -> Self {
        Self(Arc::from(items))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// New chunk made of `self` followed by `tail`.
    #[must_use]
    pub fn concat(&self, tail: &[T]) -> Self {
        let mut v = Vec::with_capacity(self.len() + tail.len());
        v.extend_from_slice(&self.0);
        v.extend_from_slice(tail);
        Self::from(v)
    }
}

impl<T> Deref for Chunk<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> Borrow<[T]> for Chunk<T> {
    fn borrow(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for Chunk<T> {
    fn from(v: Vec<T>) -> Self {
        Self(Arc::from(v))
    }
}

impl<T, const N: usize> From<[T; N]> for Chunk<T> {
    fn from(a: [T; N]) -> Self {
        Self(Arc::from(a))
    }
}

impl<T: fmt::Debug> fmt::Debug for Chunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
