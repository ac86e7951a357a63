use indexmap::IndexMap;
use std::{
    hash::Hash,
    ops::{Index, IndexMut},
};

/* ---------------------------------- Index --------------------------------- */

pub use crate::new_key_type;

pub trait IndexLike: Clone + Copy + Eq + Hash {
    fn new(idx: usize) -> Self;
    fn index(&self) -> usize;
}

/* ---------------------------------- Arena --------------------------------- */

/// An append-only arena; ids are handed out in allocation order.
#[derive(Debug, Clone)]
pub struct ArenaDense<Id, T> {
    vec: Vec<T>,
    _marker: std::marker::PhantomData<Id>,
}

/// An insertion-ordered association from ids to values.
#[derive(Debug, Clone)]
pub struct ArenaAssoc<Id, T> {
    map: IndexMap<Id, T>,
}

/// A bidirectional bijective map.
#[derive(Debug, Clone)]
pub struct ArenaBijective<P, Q> {
    forward: ArenaAssoc<P, Q>,
    backward: ArenaAssoc<Q, P>,
}

/// Raised when a bijective insertion disagrees with an existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict<P, Q> {
    Forth { key: P, current: Q, proposed: Q },
    Back { key: Q, current: P, proposed: P },
}

mod impls {
    use super::*;

    /* ------------------------------- ArenaDense ------------------------------- */

    impl<Id, T> Default for ArenaDense<Id, T> {
        fn default() -> Self {
            Self { vec: Vec::new(), _marker: std::marker::PhantomData }
        }
    }

    impl<Id, T> ArenaDense<Id, T>
    where
        Id: IndexLike,
    {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn alloc(&mut self, val: T) -> Id {
            let id = Id::new(self.vec.len());
            self.vec.push(val);
            id
        }
        /// The id the next allocation will receive.
        pub fn next_id(&self) -> Id {
            Id::new(self.vec.len())
        }
        pub fn get(&self, id: &Id) -> Option<&T> {
            self.vec.get(id.index())
        }
        pub fn get_mut(&mut self, id: &Id) -> Option<&mut T> {
            self.vec.get_mut(id.index())
        }
        pub fn replace(&mut self, id: Id, val: T) -> T {
            std::mem::replace(&mut self[&id], val)
        }
        pub fn len(&self) -> usize {
            self.vec.len()
        }
        pub fn is_empty(&self) -> bool {
            self.vec.is_empty()
        }
        pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> {
            self.vec.iter().enumerate().map(|(idx, val)| (Id::new(idx), val))
        }
    }

    impl<Id, T> Index<&Id> for ArenaDense<Id, T>
    where
        Id: IndexLike,
    {
        type Output = T;
        fn index(&self, id: &Id) -> &Self::Output {
            &self.vec[id.index()]
        }
    }

    impl<Id, T> IndexMut<&Id> for ArenaDense<Id, T>
    where
        Id: IndexLike,
    {
        fn index_mut(&mut self, id: &Id) -> &mut Self::Output {
            &mut self.vec[id.index()]
        }
    }

    /* ------------------------------- ArenaAssoc ------------------------------- */

    impl<Id, T> ArenaAssoc<Id, T> {
        pub fn new() -> Self {
            ArenaAssoc { map: IndexMap::new() }
        }
    }

    impl<Id, T> Default for ArenaAssoc<Id, T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<Id, T> ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        /// Insert unless the key is present; the first entry wins.
        pub fn insert(&mut self, id: Id, val: T) {
            self.map.entry(id).or_insert(val);
        }
        #[must_use]
        pub fn insert_or_replace(&mut self, id: Id, val: T) -> Option<T> {
            self.map.insert(id, val)
        }
        pub fn get(&self, id: &Id) -> Option<&T> {
            self.map.get(id)
        }
        pub fn get_mut(&mut self, id: &Id) -> Option<&mut T> {
            self.map.get_mut(id)
        }
        pub fn contains_key(&self, id: &Id) -> bool {
            self.map.contains_key(id)
        }
        pub fn keys(&self) -> impl Iterator<Item = &Id> {
            self.map.keys()
        }
        pub fn values(&self) -> impl Iterator<Item = &T> {
            self.map.values()
        }
        pub fn iter(&self) -> indexmap::map::Iter<'_, Id, T> {
            self.map.iter()
        }
        pub fn len(&self) -> usize {
            self.map.len()
        }
        pub fn is_empty(&self) -> bool {
            self.map.is_empty()
        }
    }

    impl<Id, T> ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
        T: PartialEq + Clone,
    {
        /// Insert if absent; otherwise the present value must agree.
        pub fn insert_absent_or_same(&mut self, id: Id, val: T) -> Result<(), (T, T)> {
            let current = self.map.entry(id).or_insert_with(|| val.clone());
            if *current != val {
                return Err((current.clone(), val));
            }
            Ok(())
        }
    }

    impl<Id, T> Index<&Id> for ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        type Output = T;
        fn index(&self, id: &Id) -> &Self::Output {
            &self.map[id]
        }
    }

    impl<Id, T> IndexMut<&Id> for ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        fn index_mut(&mut self, id: &Id) -> &mut Self::Output {
            &mut self.map[id]
        }
    }

    impl<Id, T> IntoIterator for ArenaAssoc<Id, T> {
        type Item = (Id, T);
        type IntoIter = indexmap::map::IntoIter<Id, T>;
        fn into_iter(self) -> Self::IntoIter {
            self.map.into_iter()
        }
    }

    impl<'a, Id, T> IntoIterator for &'a ArenaAssoc<Id, T> {
        type Item = (&'a Id, &'a T);
        type IntoIter = indexmap::map::Iter<'a, Id, T>;
        fn into_iter(self) -> Self::IntoIter {
            self.map.iter()
        }
    }

    impl<Id, T> FromIterator<(Id, T)> for ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        fn from_iter<I: IntoIterator<Item = (Id, T)>>(iter: I) -> Self {
            let mut arena = Self::new();
            arena.extend(iter);
            arena
        }
    }

    impl<Id, T> Extend<(Id, T)> for ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        fn extend<I: IntoIterator<Item = (Id, T)>>(&mut self, iter: I) {
            for (id, val) in iter {
                self.insert(id, val);
            }
        }
    }

    /* ----------------------------- ArenaBijective ----------------------------- */

    impl<P, Q> ArenaBijective<P, Q> {
        pub fn new() -> Self {
            ArenaBijective { forward: ArenaAssoc::new(), backward: ArenaAssoc::new() }
        }
    }

    impl<P, Q> Default for ArenaBijective<P, Q> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<P, Q> ArenaBijective<P, Q>
    where
        P: Eq + Hash + Clone,
        Q: Eq + Hash + Clone,
    {
        /// Record `p <-> q`; both directions must either be fresh or already agree.
        pub fn insert(&mut self, p: P, q: Q) -> Result<(), Conflict<P, Q>> {
            if let Some(current) = self.forward.get(&p) {
                if *current != q {
                    return Err(Conflict::Forth { key: p, current: current.clone(), proposed: q });
                }
            }
            if let Some(current) = self.backward.get(&q) {
                if *current != p {
                    return Err(Conflict::Back { key: q, current: current.clone(), proposed: p });
                }
            }
            self.forward.insert(p.clone(), q.clone());
            self.backward.insert(q, p);
            Ok(())
        }
        pub fn forth(&self, p: &P) -> Option<&Q> {
            self.forward.get(p)
        }
        pub fn back(&self, q: &Q) -> Option<&P> {
            self.backward.get(q)
        }
        pub fn len(&self) -> usize {
            self.forward.len()
        }
        pub fn is_empty(&self) -> bool {
            self.forward.is_empty()
        }
        pub fn iter(&self) -> indexmap::map::Iter<'_, P, Q> {
            self.forward.iter()
        }
    }
}

#[macro_export]
macro_rules! new_key_type {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident ; $($rest:tt)* ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
        $vis struct $name(usize);

        impl $crate::arena::IndexLike for $name {
            fn new(idx: usize) -> Self {
                Self(idx)
            }
            fn index(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl $name {
            pub fn concise(&self) -> String {
                format!("#{}", self.0)
            }
        }

        $crate::new_key_type!($($rest)*);
    };

    () => {}
}
