/// The outcome of an edit that changed some value in a sparse container.
///
/// Edits that change nothing return `None` instead of a `Change`, so that the caller keeps sharing its existing value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Change<T> {
    Insert(T),
    /// The value became empty and must be dropped from its container.
    Remove,
}

impl<T> Change<T> {
    pub fn unwrap_insert(self) -> T {
        match self {
            Change::Insert(x) => x,
            Change::Remove => panic!("Unwrapped on Change::Remove"),
        }
    }

    pub fn map<S>(self, mut f: impl FnMut(T) -> S) -> Change<S> {
        match self {
            Change::Insert(x) => Change::Insert(f(x)),
            Change::Remove => Change::Remove,
        }
    }
}
