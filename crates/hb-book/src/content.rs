//! Content store: the accumulated statistics of a histogram.
//!
//! The store is an ownership tree. With no group axes it is a single
//! [`DenseArray`]; each group axis adds one level of [`Content::Groups`]
//! maps keyed by [`Category`], created the first time a category is seen.
//!
//! A dense leaf has shape `[totbins_0, …, totbins_k, width]`: one dimension
//! per fixed axis, then a statistics dimension laid out as
//! `[Σx·w, Σx²·w]` per profile axis followed by `Σw` (the count when
//! unweighted) and, for weighted histograms, `Σw²`.

use std::collections::BTreeMap;

use crate::axis::{Category, Grouped};
use crate::config::CountType;

/// Dense row-major array of accumulated statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl DenseArray {
    /// Zero-filled array of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        DenseArray { shape: shape.to_vec(), data: vec![0.0; shape.iter().product()] }
    }

    /// Shape, statistics dimension last.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat data in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Number of statistics per bin.
    pub fn width(&self) -> usize {
        self.shape.last().copied().unwrap_or(1)
    }

    /// Value at a full multi-index (one entry per dimension).
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(&self.shape) {
            if i >= n {
                return None;
            }
            flat = flat * n + i;
        }
        self.data.get(flat).copied()
    }

    /// Statistics of one bin, addressed by its flat index over the fixed axes.
    pub fn bin(&self, flat: usize) -> Option<&[f64]> {
        let w = self.width();
        self.data.get(flat * w..(flat + 1) * w)
    }

    /// Sum of one statistic over all bins.
    pub fn total(&self, slot: usize) -> f64 {
        self.data.iter().skip(slot).step_by(self.width()).sum()
    }

    #[inline]
    fn add(&mut self, flat: usize, slot: usize, x: f64, count_type: CountType) {
        let i = flat * self.width() + slot;
        self.data[i] = count_type.round(self.data[i] + x);
    }
}

/// A node of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Leaf: fixed-axis bins by statistics.
    Dense(DenseArray),
    /// One child per category seen so far on this group axis.
    Groups(BTreeMap<Category, Content>),
}

impl Content {
    /// Fresh node for a store with `groups` remaining group levels.
    pub(crate) fn empty(groups: usize, shape: &[usize]) -> Content {
        if groups == 0 {
            Content::Dense(DenseArray::zeros(shape))
        } else {
            Content::Groups(BTreeMap::new())
        }
    }

    /// Child for `key`, if this is a group level and the category was seen.
    pub fn get(&self, key: &Category) -> Option<&Content> {
        match self {
            Content::Groups(children) => children.get(key),
            Content::Dense(_) => None,
        }
    }

    /// Descend through one key per group level.
    pub fn path(&self, keys: &[Category]) -> Option<&Content> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// The dense leaf, if this node is one.
    pub fn as_dense(&self) -> Option<&DenseArray> {
        match self {
            Content::Dense(d) => Some(d),
            Content::Groups(_) => None,
        }
    }

    /// Every dense leaf with its category path, in key order.
    pub fn leaves(&self) -> Vec<(Vec<Category>, &DenseArray)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        path: &mut Vec<Category>,
        out: &mut Vec<(Vec<Category>, &'a DenseArray)>,
    ) {
        match self {
            Content::Dense(d) => out.push((path.clone(), d)),
            Content::Groups(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }
}

/// Per-event inputs of one histogram fill, borrowed from the staging table.
///
/// Every per-event slice has either one entry per event or a single entry
/// broadcast to all events.
pub(crate) struct Scatter<'a> {
    /// Grouping of each group axis, outermost first.
    pub groups: Vec<&'a Grouped>,
    /// Flat bin over the fixed axes.
    pub flat: Vec<usize>,
    /// Whether the event survived every fixed axis.
    pub valid: Vec<bool>,
    /// `(x, x²)` per profile axis.
    pub profiles: Vec<(&'a [f64], &'a [f64])>,
    /// `(w, w²)` when weighted.
    pub weight: Option<(&'a [f64], &'a [f64])>,
    /// Leaf shape.
    pub shape: Vec<usize>,
    /// Accumulator precision.
    pub count_type: CountType,
}

/// Element `i` of a per-event slice, broadcasting length-1 slices.
#[inline]
pub(crate) fn at<T: Copy>(v: &[T], i: usize) -> T {
    if v.len() == 1 { v[0] } else { v[i] }
}

impl Scatter<'_> {
    /// Accumulate events `0..entries` into `root`.
    pub fn fill(&self, root: &mut Content, entries: usize) {
        let selection: Vec<usize> = (0..entries).collect();
        self.descend(root, &selection, 0);
    }

    fn descend(&self, node: &mut Content, selection: &[usize], level: usize) {
        match node {
            Content::Dense(leaf) => self.accumulate(leaf, selection),
            Content::Groups(children) => {
                let Some(grouped) = self.groups.get(level) else { return };
                let mut parts: Vec<Vec<usize>> = vec![Vec::new(); grouped.keys.len()];
                for &i in selection {
                    parts[at(&grouped.inverse, i)].push(i);
                }
                let remaining = self.groups.len() - level - 1;
                for (key, part) in grouped.keys.iter().zip(&parts) {
                    if part.is_empty() {
                        continue;
                    }
                    let child = children
                        .entry(key.clone())
                        .or_insert_with(|| Content::empty(remaining, &self.shape));
                    self.descend(child, part, level + 1);
                }
            }
        }
    }

    fn accumulate(&self, leaf: &mut DenseArray, selection: &[usize]) {
        let ct = self.count_type;
        let sumw = 2 * self.profiles.len();
        for &i in selection {
            if !at(&self.valid, i) {
                continue;
            }
            let bin = at(&self.flat, i);
            let w = match self.weight {
                None => 1.0,
                Some((w, w2)) => {
                    let (w, w2) = (at(w, i), at(w2, i));
                    if w.is_nan() {
                        continue;
                    }
                    leaf.add(bin, sumw + 1, w2, ct);
                    w
                }
            };
            leaf.add(bin, sumw, w, ct);
            for (p, (x, x2)) in self.profiles.iter().enumerate() {
                leaf.add(bin, 2 * p, at(x, i) * w, ct);
                leaf.add(bin, 2 * p + 1, at(x2, i) * w, ct);
            }
        }
    }
}
