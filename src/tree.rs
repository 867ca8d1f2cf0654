//! Nested containers of leaves.
//!
//! Two tools live here:
//!
//! - [`Tree<L>`], an owned nested structure that can be flattened into its
//!   leaves plus a [`TreeDef`] and rebuilt from them.
//! - [`Flatten`], which walks ordinary Rust containers (`Vec`, `Option`,
//!   tuples, maps, ...) and visits each leaf as a [`MaybeArray`].
//!
//! Types marked [`Static`] are leaves by fiat. The walkers never look inside
//! them, whatever they contain.

use crate::array::{ArrayData, Value};
use crate::dtype::Element;
use crate::error::{ArborError, Result};
use crate::filters::MaybeArray;
use crate::tensors::Tensor;
use crate::tracer::Tracer;
use std::collections::BTreeMap;

/// An owned tree with leaves of type `L`.
///
/// `Map` children are visited in key order, so flattening is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree<L> {
    Leaf(L),
    Seq(Vec<Tree<L>>),
    Map(BTreeMap<String, Tree<L>>),
    /// A node with no leaves, like a missing optional field.
    Empty,
}

/// The shape of a [`Tree`] with its leaves removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TreeDef {
    Leaf,
    Seq(Vec<TreeDef>),
    Map(Vec<(String, TreeDef)>),
    Empty,
}

impl<L> Tree<L> {
    pub fn seq(children: impl IntoIterator<Item = Tree<L>>) -> Self {
        Self::Seq(children.into_iter().collect())
    }

    pub fn map_of<K: Into<String>>(entries: impl IntoIterator<Item = (K, Tree<L>)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Borrows every leaf, depth-first.
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a L>) {
        match self {
            Self::Leaf(l) => out.push(l),
            Self::Seq(children) => children.iter().for_each(|c| c.collect_leaves(out)),
            Self::Map(children) => children.values().for_each(|c| c.collect_leaves(out)),
            Self::Empty => {}
        }
    }

    pub fn num_leaves(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Seq(children) => children.iter().map(Tree::num_leaves).sum(),
            Self::Map(children) => children.values().map(Tree::num_leaves).sum(),
            Self::Empty => 0,
        }
    }

    /// A tree of the same structure with `f` applied to every leaf.
    ///
    /// # Example
    /// ```
    /// use arbor::tree::Tree;
    /// let t = Tree::seq([Tree::Leaf(1), Tree::Empty, Tree::Leaf(2)]);
    /// assert_eq!(t.map(|x| x * 10).leaves(), vec![&10, &20]);
    /// ```
    pub fn map<M>(&self, mut f: impl FnMut(&L) -> M) -> Tree<M> {
        self.map_inner(&mut f)
    }

    fn map_inner<M>(&self, f: &mut impl FnMut(&L) -> M) -> Tree<M> {
        match self {
            Self::Leaf(l) => Tree::Leaf(f(l)),
            Self::Seq(children) => Tree::Seq(children.iter().map(|c| c.map_inner(f)).collect()),
            Self::Map(children) => Tree::Map(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.map_inner(f)))
                    .collect(),
            ),
            Self::Empty => Tree::Empty,
        }
    }

    /// Like [`Tree::map`], stopping at the first error.
    ///
    /// # Errors
    /// Whatever `f` returns first.
    pub fn try_map<M, E>(&self, mut f: impl FnMut(&L) -> Result<M, E>) -> Result<Tree<M>, E> {
        let def = self.structure();
        let leaves = self
            .leaves()
            .into_iter()
            .map(&mut f)
            .collect::<Result<Vec<M>, E>>()?;
        Ok(def.rebuild(&mut leaves.into_iter()))
    }

    pub fn structure(&self) -> TreeDef {
        match self {
            Self::Leaf(_) => TreeDef::Leaf,
            Self::Seq(children) => TreeDef::Seq(children.iter().map(Tree::structure).collect()),
            Self::Map(children) => TreeDef::Map(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.structure()))
                    .collect(),
            ),
            Self::Empty => TreeDef::Empty,
        }
    }

    /// Consumes the tree, returning its leaves and structure.
    pub fn flatten(self) -> (Vec<L>, TreeDef) {
        let def = self.structure();
        let mut leaves = Vec::with_capacity(def.num_leaves());
        self.drain_into(&mut leaves);
        (leaves, def)
    }

    fn drain_into(self, out: &mut Vec<L>) {
        match self {
            Self::Leaf(l) => out.push(l),
            Self::Seq(children) => children.into_iter().for_each(|c| c.drain_into(out)),
            Self::Map(children) => children.into_values().for_each(|c| c.drain_into(out)),
            Self::Empty => {}
        }
    }
}

impl<L: Static> Tree<L> {
    /// Wraps an opaque value as a single leaf.
    pub fn from_static(value: L) -> Self {
        Self::Leaf(value)
    }
}

impl TreeDef {
    pub fn num_leaves(&self) -> usize {
        match self {
            Self::Leaf => 1,
            Self::Seq(children) => children.iter().map(TreeDef::num_leaves).sum(),
            Self::Map(children) => children.iter().map(|(_, c)| c.num_leaves()).sum(),
            Self::Empty => 0,
        }
    }

    /// Places `leaves` back into this structure, in flattening order.
    ///
    /// # Errors
    /// [`ArborError::TreeStructure`] if the number of leaves is wrong.
    ///
    /// # Example
    /// ```
    /// use arbor::tree::Tree;
    /// let (leaves, def) = Tree::seq([Tree::Leaf(1), Tree::Leaf(2)]).flatten();
    /// let rebuilt = def.unflatten(leaves.iter().map(|x| x + 1)).unwrap();
    /// assert_eq!(rebuilt.leaves(), vec![&2, &3]);
    /// assert!(def.unflatten(vec![0]).is_err());
    /// ```
    pub fn unflatten<M>(&self, leaves: impl IntoIterator<Item = M>) -> Result<Tree<M>> {
        let leaves: Vec<M> = leaves.into_iter().collect();
        let expected = self.num_leaves();
        if leaves.len() != expected {
            return Err(ArborError::TreeStructure {
                expected,
                found: leaves.len(),
            });
        }
        Ok(self.rebuild(&mut leaves.into_iter()))
    }

    // Callers guarantee the iterator holds exactly `num_leaves` items.
    fn rebuild<M>(&self, leaves: &mut impl Iterator<Item = M>) -> Tree<M> {
        match self {
            Self::Leaf => leaves.next().map_or(Tree::Empty, Tree::Leaf),
            Self::Seq(children) => Tree::Seq(children.iter().map(|c| c.rebuild(leaves)).collect()),
            Self::Map(children) => Tree::Map(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.rebuild(leaves)))
                    .collect(),
            ),
            Self::Empty => Tree::Empty,
        }
    }
}

/// Marks a type as an opaque leaf.
///
/// [`Flatten`] visits a `Static` value as one leaf and never recurses into
/// it, even when it holds arrays or containers.
pub trait Static: MaybeArray {}

/// Structures whose leaves can be visited.
pub trait Flatten {
    /// Calls `f` on every leaf, depth-first.
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray));

    fn num_leaves(&self) -> usize {
        let mut n = 0;
        self.for_each_leaf(&mut |_| n += 1);
        n
    }
}

impl<S: Static> Flatten for S {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        f(self);
    }
}

macro_rules! leaf {
    ($($t:ty),*) => {
        $(
            impl Flatten for $t {
                fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
                    f(self);
                }
            }
        )*
    };
}

leaf!(Value, ArrayData, Tracer, bool, i32, i64, u32, u64, usize, f32, f64, String);

impl<T: Element> Flatten for Tensor<T> {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        f(self);
    }
}

/// `()` has no leaves.
impl Flatten for () {
    fn for_each_leaf<'a>(&'a self, _f: &mut dyn FnMut(&'a dyn MaybeArray)) {}
}

impl<T: Flatten> Flatten for Option<T> {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        if let Some(x) = self {
            x.for_each_leaf(f);
        }
    }
}

impl<T: Flatten> Flatten for [T] {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        for x in self {
            x.for_each_leaf(f);
        }
    }
}

impl<T: Flatten> Flatten for Vec<T> {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        self.as_slice().for_each_leaf(f);
    }
}

impl<T: Flatten, const N: usize> Flatten for [T; N] {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        self.as_slice().for_each_leaf(f);
    }
}

impl<K: Ord, V: Flatten> Flatten for BTreeMap<K, V> {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        for v in self.values() {
            v.for_each_leaf(f);
        }
    }
}

impl<L: Flatten> Flatten for Tree<L> {
    fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
        for l in self.leaves() {
            l.for_each_leaf(f);
        }
    }
}

macro_rules! tuple_flatten {
    ($($name:ident),+) => {
        impl<$($name: Flatten),+> Flatten for ($($name,)+) {
            #[allow(non_snake_case)]
            fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a dyn MaybeArray)) {
                let ($($name,)+) = self;
                $($name.for_each_leaf(f);)+
            }
        }
    };
}

tuple_flatten!(A);
tuple_flatten!(A, B);
tuple_flatten!(A, B, C);
tuple_flatten!(A, B, C, D);

/// Every leaf of `x`, depth-first.
pub fn leaves<X: Flatten + ?Sized>(x: &X) -> Vec<&dyn MaybeArray> {
    let mut out = Vec::new();
    x.for_each_leaf(&mut |leaf| out.push(leaf));
    out
}

/// Applies `f` to every leaf of `x`, collecting the results in leaf order.
///
/// # Example
/// ```
/// use arbor::misc::if_array;
/// use arbor::tensor;
/// use arbor::tree::map_leaves;
///
/// let params = (tensor!([1.0, 2.0]), 3usize, Some(tensor!([4.0])));
/// let axes = map_leaves(&params, |leaf| if_array(0).call(leaf));
/// assert_eq!(axes, vec![Some(0), None, Some(0)]);
/// ```
pub fn map_leaves<X: Flatten + ?Sized, R>(x: &X, mut f: impl FnMut(&dyn MaybeArray) -> R) -> Vec<R> {
    let mut out = Vec::new();
    x.for_each_leaf(&mut |leaf| out.push(f(leaf)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::is_array;

    fn sample() -> Tree<i32> {
        Tree::map_of([
            ("b", Tree::seq([Tree::Leaf(2), Tree::Leaf(3)])),
            ("a", Tree::Leaf(1)),
            ("c", Tree::Empty),
        ])
    }

    #[test]
    fn map_keys_flatten_in_order() {
        let (leaves, def) = sample().flatten();
        assert_eq!(leaves, vec![1, 2, 3]);
        assert_eq!(def.num_leaves(), 3);
        assert_eq!(def.unflatten(leaves).unwrap(), sample());
    }

    #[test]
    fn unflatten_rejects_wrong_count() {
        let def = sample().structure();
        assert_eq!(
            def.unflatten(vec![1, 2]),
            Err(ArborError::TreeStructure {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn try_map_stops_on_error() {
        let ok: core::result::Result<Tree<i32>, &str> = sample().try_map(|x| Ok(x * 2));
        assert_eq!(ok.unwrap().leaves(), vec![&2, &4, &6]);
        let err = sample().try_map(|&x| if x == 2 { Err("two") } else { Ok(x) });
        assert_eq!(err, Err("two"));
    }

    #[test]
    fn containers_visit_nested_leaves() {
        let x = (
            vec![Tensor::new(vec![2], vec![1.0f32, 2.0])],
            Some(5usize),
            Option::<Value>::None,
            (),
        );
        let found: Vec<bool> = leaves(&x).into_iter().map(|l| is_array(l)).collect();
        assert_eq!(found, vec![true, false]);
        assert_eq!(x.num_leaves(), 2);
    }
}
