//! Histograms: axes, an optional weight, and the content they accumulate.

use std::collections::BTreeSet;
use std::fmt;

use hb_expr::{Column, Defs, Expr, ExprError, parse};
use serde_json::{Map, Value as Json};

use crate::axis::{Axis, AxisKind, MAX_BINS};
use crate::batch::Batch;
use crate::config::{CountType, HistConfig};
use crate::content::{Content, Scatter, at};
use crate::error::{Error, Result};
use crate::exec::{FillReport, Value, execute};
use crate::goal::Goal;
use crate::plan::{Destination, Plan, Request, compile};
use crate::schema::{HistOptions, HistSpec};

#[derive(Debug, Clone)]
struct Parsed {
    axis: Axis,
    expr: Expr,
}

#[derive(Debug, Clone)]
struct Weight {
    source: String,
    expr: Expr,
}

/// A multi-dimensional histogram.
///
/// Axes are kept in kind order (group, fixed, profile), declaration order
/// within a kind. Content is allocated on the first successful fill.
#[derive(Debug, Clone)]
pub struct Hist {
    axes: Vec<Parsed>,
    weight: Option<Weight>,
    defs: Defs,
    config: HistConfig,
    shape: Vec<usize>,
    content: Option<Content>,
    plan: Option<Plan>,
}

/// Builder for [`Hist`].
#[derive(Debug, Clone, Default)]
pub struct HistBuilder {
    axes: Vec<Axis>,
    weight: Option<String>,
    defs: Defs,
    config: HistConfig,
}

impl HistBuilder {
    /// Add an axis.
    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    /// Add several axes.
    pub fn axes(mut self, axes: impl IntoIterator<Item = Axis>) -> Self {
        self.axes.extend(axes);
        self
    }

    /// Weight every event by `expr`.
    pub fn weight(mut self, expr: impl Into<String>) -> Self {
        self.weight = Some(expr.into());
        self
    }

    /// Define a name usable in axis and weight expressions.
    pub fn def(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.defs.insert(name.into(), expr.into());
        self
    }

    /// Replace all definitions.
    pub fn defs(mut self, defs: Defs) -> Self {
        self.defs = defs;
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: HistConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the accumulator precision.
    pub fn count_type(mut self, count_type: CountType) -> Self {
        self.config.count_type = count_type;
        self
    }

    /// Restrict the readable input columns.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.fields(fields);
        self
    }

    /// Validate and parse everything.
    pub fn build(self) -> Result<Hist> {
        if self.axes.is_empty() {
            return Err(Error::EmptyHistogram);
        }
        let mut axes = Vec::with_capacity(self.axes.len());
        for axis in self.axes {
            axis.validate()?;
            let expr = parse(axis.expr(), &self.defs)?;
            axes.push(Parsed { axis, expr });
        }
        axes.sort_by_key(|p| p.axis.kind());

        let weight = match self.weight {
            Some(source) => Some(Weight { expr: parse(&source, &self.defs)?, source }),
            None => None,
        };

        let profiles = axes.iter().filter(|p| p.axis.kind() == AxisKind::Profile).count();
        let mut shape: Vec<usize> = axes.iter().filter_map(|p| p.axis.totbins()).collect();
        shape.push(2 * profiles + if weight.is_some() { 2 } else { 1 });
        let cells = shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n));
        if !cells.is_some_and(|n| n <= MAX_BINS) {
            return Err(Error::InvalidAxis(format!(
                "histogram shape {shape:?} exceeds {MAX_BINS} cells"
            )));
        }

        Ok(Hist {
            axes,
            weight,
            defs: self.defs,
            config: self.config,
            shape,
            content: None,
            plan: None,
        })
    }
}

impl Hist {
    /// Unweighted histogram with default configuration.
    pub fn new(axes: impl IntoIterator<Item = Axis>) -> Result<Hist> {
        Hist::builder().axes(axes).build()
    }

    /// Start building a histogram.
    pub fn builder() -> HistBuilder {
        HistBuilder::default()
    }

    /// Histogram from axes plus keyword options (`weight`, `defs`,
    /// `count_type`, `fields`). Unknown keys are rejected.
    pub fn from_options(
        axes: impl IntoIterator<Item = Axis>,
        options: &Map<String, Json>,
    ) -> Result<Hist> {
        Hist::from_parts(axes, HistOptions::from_map(options)?)
    }

    /// Histogram from a JSON definition, e.g.
    /// `{"axes": [{"type": "bin", "expr": "x", "numbins": 10, "low": 0, "high": 1}], "weight": "w"}`.
    pub fn from_json(value: &Json) -> Result<Hist> {
        let spec = HistSpec::from_json(value)?;
        Hist::from_parts(spec.axes.iter().map(Axis::from), spec.options)
    }

    fn from_parts(axes: impl IntoIterator<Item = Axis>, options: HistOptions) -> Result<Hist> {
        let mut builder = Hist::builder().axes(axes).defs(options.defs).count_type(options.count_type);
        if let Some(weight) = options.weight {
            builder = builder.weight(weight);
        }
        if let Some(fields) = options.fields {
            builder = builder.fields(fields);
        }
        builder.build()
    }

    /// JSON-serializable definition of this histogram (without content).
    pub fn to_spec(&self) -> HistSpec {
        HistSpec {
            axes: self.axes.iter().map(|p| (&p.axis).into()).collect(),
            options: HistOptions {
                weight: self.weight.as_ref().map(|w| w.source.clone()),
                defs: self.defs.clone(),
                count_type: self.config.count_type,
                fields: self.config.fields.clone(),
            },
        }
    }

    /// Same axes and definitions, weighted by `expr`, with empty content.
    pub fn weight(&self, expr: impl Into<String>) -> Result<Hist> {
        Hist::builder()
            .axes(self.axes.iter().map(|p| p.axis.clone()))
            .defs(self.defs.clone())
            .config(self.config.clone())
            .weight(expr)
            .build()
    }

    /// Deep copy, content included.
    pub fn copy(&self) -> Hist {
        self.clone()
    }

    /// Axes in storage order.
    pub fn axes(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter().map(|p| &p.axis)
    }

    /// Weight expression, as given.
    pub fn weight_expr(&self) -> Option<&str> {
        self.weight.as_ref().map(|w| w.source.as_str())
    }

    /// Configuration.
    pub fn config(&self) -> &HistConfig {
        &self.config
    }

    /// Shape of every dense leaf: one dimension per fixed axis, then the
    /// statistics dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Input columns a fill must provide, sorted.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = BTreeSet::new();
        for p in &self.axes {
            fields.extend(p.expr.sources());
        }
        if let Some(w) = &self.weight {
            fields.extend(w.expr.sources());
        }
        fields.into_iter().map(str::to_owned).collect()
    }

    /// Accumulated content; `None` before the first fill.
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Compiled plan, once a fill has compiled it.
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Fill the histogram with one batch of events.
    pub fn fill(&mut self, batch: &Batch) -> Result<FillReport> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => compile(&self.requests(0), |_, column| self.config.accepts(column))?,
        };
        let slots = [self.slots()];
        let (staging, report) = execute(self.plan.insert(plan), batch, &slots)?;
        let scatter = self.scatter(&staging[0], report.entries)?;
        self.accumulate(&scatter, report.entries);
        Ok(report)
    }

    /// Goal requests of this histogram, delivered to histogram index `hist`.
    pub(crate) fn requests(&self, hist: usize) -> Vec<Request> {
        let mut goals: Vec<Goal> = self.axes.iter().flat_map(|p| p.axis.goals(&p.expr)).collect();
        if let Some(w) = &self.weight {
            goals.push(Goal::Value(w.expr.clone()));
            goals.push(Goal::Value(w.expr.squared()));
        }
        goals
            .into_iter()
            .enumerate()
            .map(|(slot, goal)| Request { goal, destination: Destination { hist, slot } })
            .collect()
    }

    /// Width of this histogram's staging table.
    pub(crate) fn slots(&self) -> usize {
        let axes: usize =
            self.axes.iter().map(|p| if p.axis.kind() == AxisKind::Profile { 2 } else { 1 }).sum();
        axes + if self.weight.is_some() { 2 } else { 0 }
    }

    /// Borrow the staged values of one fill as scatter inputs.
    ///
    /// Fails without touching the content, so a caller may prepare several
    /// histograms before accumulating any of them.
    pub(crate) fn scatter<'s>(
        &self,
        staged: &'s [Option<Value>],
        entries: usize,
    ) -> Result<Scatter<'s>> {
        let slot = |i: usize| {
            staged
                .get(i)
                .and_then(Option::as_ref)
                .ok_or_else(|| Error::UnresolvedGoal(format!("staging slot {i} was never exported")))
        };
        let numeric = |i: usize| -> Result<&'s [f64]> {
            let value = slot(i)?;
            value.as_data().and_then(Column::as_num).ok_or_else(|| {
                ExprError::Type("profile and weight expressions must be numeric".into()).into()
            })
        };
        let unexpected =
            |i: usize| Error::UnresolvedGoal(format!("staging slot {i} holds the wrong kind of value"));

        let mut groups = Vec::new();
        let mut flat = vec![0usize; entries];
        let mut valid = vec![true; entries];
        let mut profiles = Vec::new();
        let mut next = 0;
        for p in &self.axes {
            match &p.axis {
                Axis::Group { .. } => {
                    groups.push(slot(next)?.as_grouped().ok_or_else(|| unexpected(next))?);
                    next += 1;
                }
                Axis::Fixed { binning, .. } => {
                    let binned = slot(next)?.as_binned().ok_or_else(|| unexpected(next))?;
                    let n = binning.totbins();
                    for (i, (f, v)) in flat.iter_mut().zip(valid.iter_mut()).enumerate() {
                        *f = *f * n + at(&binned.index, i);
                        *v &= at(&binned.valid, i);
                    }
                    next += 1;
                }
                Axis::Profile { .. } => {
                    profiles.push((numeric(next)?, numeric(next + 1)?));
                    next += 2;
                }
            }
        }
        let weight = match &self.weight {
            Some(_) => Some((numeric(next)?, numeric(next + 1)?)),
            None => None,
        };

        Ok(Scatter {
            groups,
            flat,
            valid,
            profiles,
            weight,
            shape: self.shape.clone(),
            count_type: self.config.count_type,
        })
    }

    /// Allocate the content on first use and scatter into it.
    pub(crate) fn accumulate(&mut self, scatter: &Scatter<'_>, entries: usize) {
        let root = self
            .content
            .get_or_insert_with(|| Content::empty(scatter.groups.len(), &scatter.shape));
        scatter.fill(root, entries);
    }
}

impl fmt::Display for Hist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hist(")?;
        for (i, p) in self.axes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p.axis)?;
        }
        if let Some(w) = &self.weight {
            write!(f, ", weight={:?}", w.source)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn batch(cols: &[(&str, Column)]) -> Batch {
        Batch::from_columns(cols.iter().cloned()).unwrap()
    }

    fn dense(h: &Hist) -> Vec<f64> {
        h.content().unwrap().as_dense().unwrap().as_slice().to_vec()
    }

    #[test]
    fn end_to_end_regular_bins() {
        let mut h = Hist::new([Axis::bin("x", 10, 0.0, 10.0)]).unwrap();
        assert!(h.content().is_none());
        assert_eq!(h.shape(), &[13, 1]);
        let report = h.fill(&batch(&[("x", vec![0.5, 1.5, 1.5, 9.9].into())])).unwrap();
        assert_eq!(report.entries, 4);

        let counts = dense(&h);
        // underflow occupies index 0
        assert_eq!(counts[1], 1.0);
        assert_eq!(counts[2], 2.0);
        assert_eq!(counts[10], 1.0);
        assert_eq!(counts.iter().sum::<f64>(), 4.0);
    }

    #[test]
    fn fills_accumulate_and_reuse_the_plan() {
        let mut h = Hist::new([Axis::bin("x", 2, 0.0, 2.0).underflow(false).overflow(false).nanflow(false)])
            .unwrap();
        h.fill(&batch(&[("x", vec![0.5].into())])).unwrap();
        let plan = h.plan().unwrap().clone();
        h.fill(&batch(&[("x", vec![0.5, 1.5].into())])).unwrap();
        assert_eq!(h.plan(), Some(&plan));
        assert_eq!(dense(&h), vec![2.0, 1.0]);
    }

    #[test]
    fn weighted_fill() {
        let mut h = Hist::builder().axis(Axis::cut("x > 0")).weight("w").build().unwrap();
        assert_eq!(h.shape(), &[2, 2]);
        h.fill(&batch(&[("x", vec![-1.0, 1.0, 2.0].into()), ("w", vec![0.5, 2.0, 3.0].into())]))
            .unwrap();
        assert_eq!(dense(&h), vec![0.5, 0.25, 5.0, 13.0]);
    }

    #[test]
    fn nan_weight_contributes_nothing() {
        let mut h = Hist::builder().axis(Axis::profile("y")).weight("w").build().unwrap();
        assert_eq!(h.shape(), &[4]);
        h.fill(&batch(&[
            ("y", vec![1.0, 2.0, 3.0].into()),
            ("w", vec![1.0, f64::NAN, 2.0].into()),
        ]))
        .unwrap();
        let sums = dense(&h);
        assert_relative_eq!(sums[0], 1.0 + 6.0);
        assert_relative_eq!(sums[1], 1.0 + 18.0);
        assert_relative_eq!(sums[2], 3.0);
        assert_relative_eq!(sums[3], 5.0);
    }

    #[test]
    fn profile_per_bin() {
        let mut h = Hist::new([
            Axis::profile("y"),
            Axis::bin("x", 2, 0.0, 2.0).underflow(false).overflow(false).nanflow(false),
        ])
        .unwrap();
        assert_eq!(h.axes().map(Axis::kind).collect::<Vec<_>>(), vec![AxisKind::Fixed, AxisKind::Profile]);
        h.fill(&batch(&[("x", vec![0.1, 0.2, 1.5].into()), ("y", vec![2.0, 4.0, 10.0].into())])).unwrap();
        let leaf = h.content().unwrap().as_dense().unwrap();
        assert_eq!(leaf.bin(0).unwrap(), &[6.0, 20.0, 2.0]);
        assert_eq!(leaf.bin(1).unwrap(), &[10.0, 100.0, 1.0]);
    }

    #[test]
    fn two_group_levels() {
        let mut h = Hist::new([Axis::groupby("b"), Axis::groupby("a")]).unwrap();
        h.fill(&batch(&[("a", vec!["a", "a", "b"].into()), ("b", vec!["x", "y", "x"].into())])).unwrap();
        let content = h.content().unwrap();
        let leaves = content.leaves();
        assert_eq!(leaves.len(), 3);
        // declaration order is the nesting order
        assert!(content.path(&["x".into(), "a".into()]).is_some());
        assert!(content.path(&["y".into(), "b".into()]).is_none());
        assert_eq!(content.path(&["x".into(), "b".into()]).unwrap().as_dense().unwrap().as_slice(), &[1.0]);
    }

    #[test]
    fn masked_events_still_create_categories() {
        let mut h = Hist::new([
            Axis::groupby("c"),
            Axis::bin("x", 1, 0.0, 1.0).underflow(false).overflow(false).nanflow(false),
        ])
        .unwrap();
        h.fill(&batch(&[("c", vec![1.0, 2.0].into()), ("x", vec![0.5, 7.0].into())])).unwrap();
        let content = h.content().unwrap();
        assert_eq!(content.get(&1.0.into()).unwrap().as_dense().unwrap().as_slice(), &[1.0]);
        assert_eq!(content.get(&2.0.into()).unwrap().as_dense().unwrap().as_slice(), &[0.0]);
    }

    #[test]
    fn groupbin_and_broadcast_constant_weight() {
        let mut h = Hist::builder().axis(Axis::groupbin("x", 10.0, 0.0)).weight("2").build().unwrap();
        h.fill(&batch(&[("x", vec![1.0, 9.0, 15.0].into())])).unwrap();
        let content = h.content().unwrap();
        assert_eq!(content.get(&0.0.into()).unwrap().as_dense().unwrap().as_slice(), &[4.0, 8.0]);
        assert_eq!(content.get(&10.0.into()).unwrap().as_dense().unwrap().as_slice(), &[2.0, 4.0]);
    }

    #[test]
    fn deterministic_across_copies() {
        let make = || Hist::builder().axis(Axis::bin("x * y", 5, 0.0, 5.0)).weight("y").build().unwrap();
        let data = batch(&[("x", vec![0.3, 1.2, 4.4, 2.0].into()), ("y", vec![1.0, 2.0, 0.5, 1.5].into())]);
        let mut a = make();
        let mut b = make();
        a.fill(&data).unwrap();
        b.fill(&data).unwrap();
        assert_eq!(a.content(), b.content());
    }

    #[test]
    fn weight_and_copy_are_fresh_or_deep() {
        let mut h = Hist::new([Axis::cut("x")]).unwrap();
        h.fill(&batch(&[("x", vec![1.0].into())])).unwrap();
        let copy = h.copy();
        assert_eq!(copy.content(), h.content());
        let weighted = h.weight("x * 2").unwrap();
        assert!(weighted.content().is_none());
        assert_eq!(weighted.weight_expr(), Some("x * 2"));
        assert_eq!(weighted.shape(), &[2, 2]);
        h.fill(&batch(&[("x", vec![1.0].into())])).unwrap();
        assert_ne!(copy.content(), h.content());
    }

    #[test]
    fn construction_errors() {
        assert!(matches!(Hist::new(Vec::new()), Err(Error::EmptyHistogram)));
        assert!(matches!(Hist::new([Axis::bin("x", 0, 0.0, 1.0)]), Err(Error::InvalidAxis(_))));
        assert!(matches!(Hist::new([Axis::cut("x +")]), Err(Error::Expression(ExprError::Parse(_)))));
        assert!(matches!(
            Hist::new([Axis::intbin("n", i64::MIN, i64::MAX)]),
            Err(Error::InvalidAxis(_))
        ));
        let wide = [Axis::bin("x", 1 << 12, 0.0, 1.0), Axis::bin("y", 1 << 12, 0.0, 1.0)];
        assert!(matches!(Hist::new(wide), Err(Error::InvalidAxis(_))));
        let mut opts = Map::new();
        opts.insert("wieght".into(), json!("w"));
        assert!(matches!(Hist::from_options([Axis::cut("x")], &opts), Err(Error::UnrecognizedOption(_))));
    }

    #[test]
    fn failed_fill_leaves_content_untouched() {
        let mut h = Hist::new([Axis::bin("x + y", 2, 0.0, 1.0)]).unwrap();
        let err = h.fill(&batch(&[("x", vec![1.0].into())])).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(_)));
        assert!(h.content().is_none());

        let mut h = Hist::builder().axis(Axis::cut("x")).weight("c").build().unwrap();
        let err = h.fill(&batch(&[("x", vec![1.0].into()), ("c", vec!["a"].into())])).unwrap_err();
        assert!(matches!(err, Error::Expression(ExprError::Type(_))));
        assert!(h.content().is_none());
    }

    #[test]
    fn field_whitelist_and_defs() {
        let mut h = Hist::builder()
            .axis(Axis::bin("r", 4, 0.0, 4.0))
            .def("r", "sqrt(x*x + y*y)")
            .fields(["x"])
            .build()
            .unwrap();
        assert_eq!(h.fields(), vec!["x".to_string(), "y".to_string()]);
        let data = batch(&[("x", vec![3.0].into()), ("y", vec![4.0].into())]);
        assert!(matches!(h.fill(&data), Err(Error::UnresolvedGoal(_))));
        assert!(h.plan().is_none());
    }

    #[test]
    fn json_definition_roundtrip() {
        let value = json!({
            "axes": [{"type": "profile", "expr": "y"}, {"type": "intbin", "expr": "n", "min": 0, "max": 3}],
            "weight": "w",
            "count_type": "f32"
        });
        let h = Hist::from_json(&value).unwrap();
        assert_eq!(h.config().count_type, CountType::F32);
        assert_eq!(h.shape(), &[6, 4]);
        let again = Hist::from_json(&serde_json::to_value(h.to_spec()).unwrap()).unwrap();
        assert_eq!(again.to_spec(), h.to_spec());
        assert_eq!(h.to_string(), r#"Hist(intbin("n", 0, 3), profile("y"), weight="w")"#);
    }
}
