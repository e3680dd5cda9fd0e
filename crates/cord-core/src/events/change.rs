//! Old/new value pairs carried by change events

/// A field that changed from `old` to `new`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

impl<T> Change<T> {
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }
}

impl<T: PartialEq> Change<T> {
    /// `Some` only when the values differ
    pub fn diff(old: T, new: T) -> Option<Self> {
        (old != new).then_some(Self { old, new })
    }
}

impl<T: PartialEq + Clone> Change<T> {
    /// Compare two borrowed fields, cloning only on a difference
    pub fn diff_ref(old: &T, new: &T) -> Option<Self> {
        (old != new).then(|| Self {
            old: old.clone(),
            new: new.clone(),
        })
    }
}
