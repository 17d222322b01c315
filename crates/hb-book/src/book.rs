//! Books: named collections of histograms filled through one shared plan.

use serde_json::Value as Json;

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::exec::{FillReport, execute};
use crate::hist::Hist;
use crate::plan::{Plan, compile};

/// An insertion-ordered collection of named histograms.
///
/// Filling a book evaluates every distinct goal of all members once, then
/// routes the results to each member.
#[derive(Debug, Clone, Default)]
pub struct Book {
    hists: Vec<(String, Hist)>,
    plan: Option<Plan>,
}

impl Book {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Book from a JSON object mapping names to histogram definitions
    /// (objects with `"axes"`) or nested books (objects with `"book"`).
    pub fn from_json(value: &Json) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::TypeMismatch("book definition must be a JSON object".into()))?;
        let mut book = Book::new();
        for (name, entry) in map {
            match entry {
                Json::Object(obj) if obj.contains_key("axes") => {
                    book.insert(name.clone(), Hist::from_json(entry)?);
                }
                Json::Object(obj) if obj.len() == 1 && obj.contains_key("book") => {
                    book.insert_book(name, Book::from_json(&obj["book"])?);
                }
                _ => {
                    return Err(Error::TypeMismatch(format!(
                        "book entry '{name}' is neither a histogram nor a book"
                    )));
                }
            }
        }
        Ok(book)
    }

    /// Histogram by name.
    pub fn get(&self, name: &str) -> Option<&Hist> {
        self.hists.iter().find(|(n, _)| n == name).map(|(_, h)| h)
    }

    /// Mutable histogram by name.
    ///
    /// The member may be replaced through the returned reference, so the
    /// cached plan is dropped.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Hist> {
        let pos = self.hists.iter().position(|(n, _)| n == name)?;
        self.invalidate();
        Some(&mut self.hists[pos].1)
    }

    /// Whether a histogram named `name` is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a histogram, replacing (in place) and returning any previous one of that name.
    pub fn insert(&mut self, name: impl Into<String>, hist: Hist) -> Option<Hist> {
        let name = name.into();
        self.invalidate();
        match self.hists.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, hist)),
            None => {
                self.hists.push((name, hist));
                None
            }
        }
    }

    /// Add every member of `book` as `"{name}/{member}"`.
    pub fn insert_book(&mut self, name: &str, book: Book) {
        for (sub, hist) in book.hists {
            self.insert(format!("{name}/{sub}"), hist);
        }
    }

    /// Remove a histogram.
    pub fn remove(&mut self, name: &str) -> Option<Hist> {
        let pos = self.hists.iter().position(|(n, _)| n == name)?;
        self.invalidate();
        Some(self.hists.remove(pos).1)
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Hist)> {
        self.hists.iter().map(|(n, h)| (n.as_str(), h))
    }

    /// Member names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.hists.iter().map(|(n, _)| n.as_str())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.hists.len()
    }

    /// Whether the book has no members.
    pub fn is_empty(&self) -> bool {
        self.hists.is_empty()
    }

    /// Input columns any member needs, sorted.
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.hists.iter().flat_map(|(_, h)| h.fields()).collect();
        fields.sort();
        fields.dedup();
        fields
    }

    /// The shared plan, once a fill has compiled it.
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Fill every member with one batch.
    ///
    /// All members are prepared before any is accumulated: a failure leaves
    /// every member's content as it was.
    pub fn fill(&mut self, batch: &Batch) -> Result<FillReport> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => {
                let requests: Vec<_> =
                    self.hists.iter().enumerate().flat_map(|(i, (_, h))| h.requests(i)).collect();
                compile(&requests, |i, column| self.hists[i].1.config().accepts(column))?
            }
        };
        let slots: Vec<usize> = self.hists.iter().map(|(_, h)| h.slots()).collect();
        let (staging, report) = execute(self.plan.insert(plan), batch, &slots)?;

        let scatters = self
            .hists
            .iter()
            .zip(&staging)
            .map(|((_, h), staged)| h.scatter(staged, report.entries))
            .collect::<Result<Vec<_>>>()?;
        for ((_, hist), scatter) in self.hists.iter_mut().zip(&scatters) {
            hist.accumulate(scatter, report.entries);
        }
        Ok(report)
    }

    fn invalidate(&mut self) {
        if self.plan.take().is_some() {
            log::debug!("book membership changed; dropping cached plan ({} members)", self.hists.len());
        }
    }
}

impl<'a> IntoIterator for &'a Book {
    type Item = (&'a str, &'a Hist);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Hist)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
