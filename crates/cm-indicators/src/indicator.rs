//! Checked indicators.
//!
//! An [`Indicator`] pairs an immutable [`IndicatorDefinition`] with the raw
//! index it wraps. Calling it runs, per invocation,
//!
//! ```text
//! Start → InputValidated → UnitsResolved → Computed → Masked → Annotated → Done
//! ```
//!
//! with failure exits to `Rejected`. Everything up to period resolution runs
//! in [`IndicatorCall::build`], so configuration errors surface before any
//! numeric work; the rest is captured in the returned [`Deferred`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use cm_array::{LabeledArray, Provenance};
use cm_core::errors::{Error, Result};
use cm_core::{ensure, ensure_post, Deferred, NoticeSink, Real, Severity, TracingSink};
use cm_indices::ResampleOp;
use cm_time::{Frequency, Grouping};
use cm_units::{registry, PhysicalKind, Quantity};

use crate::metadata::{annotate, CallSummary, UnitRule};
use crate::missing::{mask_invalid, MissingPolicy};
use crate::options::{Settings, ValidationMode};

/// Signature of a wrapped raw index: unit-resolved inputs in declaration
/// order, the resolved periods and the native-unit parameters.
pub type ComputeFn = fn(&[LabeledArray], &Grouping, &IndexArgs) -> Result<LabeledArray>;

// ── Definitions ─────────────────────────────────────────────────────────────

/// One declared input variable.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    name: &'static str,
    kind: PhysicalKind,
    units: Option<&'static str>,
    match_units_of: Option<usize>,
}

impl InputSpec {
    /// An input named `name` of physical kind `kind`, used in its own units.
    pub fn new(name: &'static str, kind: PhysicalKind) -> Self {
        Self {
            name,
            kind,
            units: None,
            match_units_of: None,
        }
    }

    /// Convert the input into `units` before computing.
    pub fn in_units(mut self, units: &'static str) -> Self {
        self.units = Some(units);
        self
    }

    /// Convert the input into the units of an earlier input.
    pub fn matching_units_of(mut self, input: usize) -> Self {
        self.match_units_of = Some(input);
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Expected physical kind.
    pub fn kind(&self) -> PhysicalKind {
        self.kind
    }
}

/// What a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A quantity converted into the units of input number `input`.
    Quantity {
        /// Index of the input whose units the quantity is resolved into.
        input: usize,
    },
    /// A positive whole number (window lengths).
    Count,
    /// A resample op.
    Op,
}

/// One declared keyword parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    name: &'static str,
    kind: ParamKind,
    default: &'static str,
}

impl ParamSpec {
    /// A threshold-like quantity resolved against input `input`.
    pub fn quantity(name: &'static str, input: usize, default: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Quantity { input },
            default,
        }
    }

    /// A positive count.
    pub fn count(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Count,
            default,
        }
    }

    /// A resample op.
    pub fn op(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Op,
            default,
        }
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parameter kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Default value, as text.
    pub fn default_value(&self) -> &'static str {
        self.default
    }
}

/// Immutable declaration of an indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDefinition {
    identifier: &'static str,
    long_name: &'static str,
    description: &'static str,
    standard_name: Option<&'static str>,
    cell_methods: &'static str,
    units: UnitRule,
    temperature_difference: bool,
    src_freq: &'static str,
    default_freq: &'static str,
    missing: Option<MissingPolicy>,
    inputs: Vec<InputSpec>,
    params: Vec<ParamSpec>,
}

impl IndicatorDefinition {
    /// A definition with daily input, annual output and units following the
    /// first input.
    pub fn new(identifier: &'static str) -> Self {
        Self {
            identifier,
            long_name: "",
            description: "",
            standard_name: None,
            cell_methods: "",
            units: UnitRule::SameAsInput,
            temperature_difference: false,
            src_freq: "D",
            default_freq: "YS",
            missing: None,
            inputs: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Set the `long_name` template.
    pub fn with_long_name(mut self, template: &'static str) -> Self {
        self.long_name = template;
        self
    }

    /// Set the `description` template.
    pub fn with_description(mut self, template: &'static str) -> Self {
        self.description = template;
        self
    }

    /// Set the CF standard name of the output.
    pub fn with_standard_name(mut self, name: &'static str) -> Self {
        self.standard_name = Some(name);
        self
    }

    /// Set the cell method the indicator adds (`time: maximum over days`).
    pub fn with_cell_methods(mut self, methods: &'static str) -> Self {
        self.cell_methods = methods;
        self
    }

    /// Set the output units rule.
    pub fn with_units(mut self, rule: UnitRule) -> Self {
        self.units = rule;
        self
    }

    /// Mark a temperature output as a difference rather than a point on a
    /// scale.
    pub fn as_temperature_difference(mut self) -> Self {
        self.temperature_difference = true;
        self
    }

    /// Set the expected input sampling frequency.
    pub fn with_src_freq(mut self, code: &'static str) -> Self {
        self.src_freq = code;
        self
    }

    /// Set the default resampling frequency.
    pub fn with_default_freq(mut self, code: &'static str) -> Self {
        self.default_freq = code;
        self
    }

    /// Set a masking policy that replaces the global default for this
    /// indicator. A per-call policy still wins.
    pub fn with_missing(mut self, policy: MissingPolicy) -> Self {
        self.missing = Some(policy);
        self
    }

    /// Declare the next input.
    pub fn with_input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    /// Declare a keyword parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Identifier, also the output variable name.
    pub fn identifier(&self) -> &'static str {
        self.identifier
    }

    /// `long_name` template.
    pub fn long_name(&self) -> &'static str {
        self.long_name
    }

    /// `description` template.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// CF standard name.
    pub fn standard_name(&self) -> Option<&'static str> {
        self.standard_name
    }

    /// Cell method added by the indicator.
    pub fn cell_methods(&self) -> &'static str {
        self.cell_methods
    }

    /// Output units rule.
    pub fn units(&self) -> UnitRule {
        self.units
    }

    /// `true` if a temperature output is a difference.
    pub fn is_temperature_difference(&self) -> bool {
        self.temperature_difference
    }

    /// Expected input sampling frequency code.
    pub fn src_freq(&self) -> &'static str {
        self.src_freq
    }

    /// Default resampling frequency code.
    pub fn default_freq(&self) -> &'static str {
        self.default_freq
    }

    /// Indicator-level masking policy.
    pub fn missing(&self) -> Option<MissingPolicy> {
        self.missing
    }

    /// Declared inputs.
    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    /// Declared parameters.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

// ── Parameters ──────────────────────────────────────────────────────────────

/// A parameter value as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text to be parsed according to the parameter kind (`"25 degC"`,
    /// `"5"`, `"max"`).
    Text(String),
    /// A quantity.
    Quantity(Quantity),
    /// A count.
    Count(usize),
    /// A resample op.
    Op(ResampleOp),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<Quantity> for ParamValue {
    fn from(q: Quantity) -> Self {
        ParamValue::Quantity(q)
    }
}

impl From<usize> for ParamValue {
    fn from(n: usize) -> Self {
        ParamValue::Count(n)
    }
}

impl From<ResampleOp> for ParamValue {
    fn from(op: ResampleOp) -> Self {
        ParamValue::Op(op)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s.trim()),
            ParamValue::Quantity(q) => write!(f, "{q}"),
            ParamValue::Count(n) => write!(f, "{n}"),
            ParamValue::Op(op) => write!(f, "{op}"),
        }
    }
}

/// A resolved parameter, in the native units of its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue {
    /// A magnitude.
    Number(Real),
    /// A count.
    Count(usize),
    /// A resample op.
    Op(ResampleOp),
}

/// Resolved parameters handed to a raw index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexArgs {
    values: BTreeMap<String, ArgValue>,
}

impl IndexArgs {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one argument.
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Look up an argument.
    pub fn get(&self, name: &str) -> Option<ArgValue> {
        self.values.get(name).copied()
    }

    /// A magnitude argument.
    pub fn number(&self, name: &str) -> Result<Real> {
        match self.get(name) {
            Some(ArgValue::Number(v)) => Ok(v),
            _ => Err(wrong_arg(name, "a magnitude")),
        }
    }

    /// A count argument.
    pub fn count(&self, name: &str) -> Result<usize> {
        match self.get(name) {
            Some(ArgValue::Count(n)) => Ok(n),
            _ => Err(wrong_arg(name, "a count")),
        }
    }

    /// An op argument.
    pub fn op(&self, name: &str) -> Result<ResampleOp> {
        match self.get(name) {
            Some(ArgValue::Op(op)) => Ok(op),
            _ => Err(wrong_arg(name, "a resample op")),
        }
    }
}

fn wrong_arg(name: &str, what: &str) -> Error {
    Error::InvalidArgument(format!("argument `{name}` is not {what}"))
}

// ── Indicator ───────────────────────────────────────────────────────────────

/// A checked indicator: a definition plus the raw index it wraps.
///
/// Indicators are immutable and can be shared freely between threads.
#[derive(Clone)]
pub struct Indicator {
    definition: IndicatorDefinition,
    compute: ComputeFn,
}

impl fmt::Debug for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indicator")
            .field("identifier", &self.definition.identifier)
            .finish_non_exhaustive()
    }
}

impl Indicator {
    /// Wrap `compute` with `definition`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a definition without inputs, a
    /// parameter or unit match pointing at a missing input, or malformed
    /// frequency codes.
    pub fn new(definition: IndicatorDefinition, compute: ComputeFn) -> Result<Self> {
        let id = definition.identifier;
        if definition.inputs.is_empty() {
            return Err(Error::InvalidArgument(format!("`{id}` declares no input")));
        }
        for (i, input) in definition.inputs.iter().enumerate() {
            if input.match_units_of.is_some_and(|j| j >= i) {
                return Err(Error::InvalidArgument(format!(
                    "`{id}`: input `{}` can only match the units of an earlier input",
                    input.name
                )));
            }
        }
        for param in &definition.params {
            if let ParamKind::Quantity { input } = param.kind {
                if input >= definition.inputs.len() {
                    return Err(Error::InvalidArgument(format!(
                        "`{id}`: parameter `{}` refers to input #{input}",
                        param.name
                    )));
                }
            }
        }
        Frequency::parse(definition.src_freq)?;
        Frequency::parse(definition.default_freq)?;
        Ok(Self { definition, compute })
    }

    /// The definition.
    pub fn definition(&self) -> &IndicatorDefinition {
        &self.definition
    }

    /// Identifier.
    pub fn identifier(&self) -> &'static str {
        self.definition.identifier
    }

    /// Start a call.
    pub fn call(&self) -> IndicatorCall<'_> {
        IndicatorCall {
            indicator: self,
            inputs: BTreeMap::new(),
            params: BTreeMap::new(),
            freq: None,
            missing: None,
            validation: None,
            keep_history: None,
            sink: Arc::new(TracingSink),
        }
    }
}

/// Builder for one indicator invocation.
///
/// ```no_run
/// # use cm_indicators::catalog;
/// # fn run(tasmax: &cm_array::LabeledArray) -> cm_core::Result<()> {
/// let hot_days = catalog()?
///     .get("tx_days_above")?
///     .call()
///     .input("tasmax", tasmax)
///     .param("thresh", "30 degC")
///     .freq("MS")
///     .compute()?;
/// # Ok(()) }
/// ```
pub struct IndicatorCall<'a> {
    indicator: &'a Indicator,
    inputs: BTreeMap<String, LabeledArray>,
    params: BTreeMap<String, ParamValue>,
    freq: Option<String>,
    missing: Option<MissingPolicy>,
    validation: Option<ValidationMode>,
    keep_history: Option<bool>,
    sink: Arc<dyn NoticeSink>,
}

impl<'a> IndicatorCall<'a> {
    /// Supply the input called `name`.
    pub fn input(mut self, name: &str, array: &LabeledArray) -> Self {
        self.inputs.insert(name.to_string(), array.clone());
        self
    }

    /// Supply a keyword parameter.
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Resampling frequency (defaults to the definition's).
    pub fn freq(mut self, code: &str) -> Self {
        self.freq = Some(code.to_string());
        self
    }

    /// Masking policy for this call.
    pub fn missing(mut self, policy: MissingPolicy) -> Self {
        self.missing = Some(policy);
        self
    }

    /// Handling of recoverable input problems for this call.
    pub fn validation(mut self, mode: ValidationMode) -> Self {
        self.validation = Some(mode);
        self
    }

    /// Whether to write the `history` attribute for this call.
    pub fn keep_history(mut self, keep: bool) -> Self {
        self.keep_history = Some(keep);
        self
    }

    /// Where notices go (defaults to [`TracingSink`]).
    pub fn sink(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate the call and resolve units and periods; return the numeric
    /// work as a deferred handle.
    ///
    /// # Errors
    /// Every configuration error: unknown inputs or parameters,
    /// [`Error::InputKind`], [`Error::MissingUnits`], unit errors,
    /// [`Error::Frequency`], and [`Error::FrequencyMismatch`] in
    /// [`ValidationMode::Raise`].
    #[tracing::instrument(level = "debug", skip(self), fields(indicator = self.indicator.identifier()))]
    pub fn build(self) -> Result<Deferred<LabeledArray>> {
        let id = self.indicator.identifier();
        transition(id, "Start");
        match self.prepare() {
            Ok(plan) => Ok(plan.into_deferred()),
            Err(e) => {
                tracing::debug!(indicator = id, stage = %e.stage(), error = %e, "Rejected");
                Err(e)
            }
        }
    }

    /// [`build`][Self::build] and force in one go.
    #[tracing::instrument(level = "debug", skip(self), fields(indicator = self.indicator.identifier()))]
    pub fn compute(self) -> Result<LabeledArray> {
        self.build()?.into_inner()
    }

    fn prepare(mut self) -> Result<Plan> {
        let indicator = self.indicator;
        let def = &indicator.definition;
        let id = def.identifier;
        let options = Settings::instance().options();
        let validation = self.validation.unwrap_or(options.data_validation);

        if let Some(extra) = self.inputs.keys().find(|k| !def.inputs.iter().any(|i| i.name == k.as_str())) {
            return Err(Error::InvalidArgument(format!("`{id}` has no input `{extra}`")));
        }
        if let Some(extra) = self.params.keys().find(|k| !def.params.iter().any(|p| p.name == k.as_str())) {
            return Err(Error::InvalidArgument(format!("`{id}` has no parameter `{extra}`")));
        }

        // Start → InputValidated
        let src_freq = Frequency::parse(def.src_freq)?;
        let mut inputs = Vec::with_capacity(def.inputs.len());
        for spec in &def.inputs {
            let array = self
                .inputs
                .remove(spec.name)
                .ok_or_else(|| Error::InvalidArgument(format!("`{id}` needs input `{}`", spec.name)))?;
            check_kind(id, spec, &array, validation, self.sink.as_ref())?;
            check_frequency(id, &src_freq, &array, validation, self.sink.as_ref())?;
            inputs.push(array);
        }
        let first = &inputs[0];
        for other in &inputs[1..] {
            first.ensure_aligned(other)?;
        }
        transition(id, "InputValidated");

        // InputValidated → UnitsResolved
        let mut resolved: Vec<LabeledArray> = Vec::with_capacity(inputs.len());
        for (spec, array) in def.inputs.iter().zip(inputs) {
            let target = match (spec.units, spec.match_units_of) {
                (Some(u), _) => Some(u.to_string()),
                (None, Some(j)) => Some(resolved[j].require_units()?.to_string()),
                (None, None) => None,
            };
            let array = match target {
                Some(units) => array.convert_units(&units, spec.kind.context())?,
                None => array,
            };
            resolved.push(array);
        }
        let mut args = IndexArgs::new();
        let mut shown = BTreeMap::new();
        for spec in &def.params {
            let value = self
                .params
                .remove(spec.name)
                .unwrap_or_else(|| ParamValue::Text(spec.default.to_string()));
            shown.insert(spec.name.to_string(), value.to_string());
            let arg = resolve_param(id, spec, value, def, &resolved)?;
            args = args.with(spec.name, arg);
        }
        transition(id, "UnitsResolved");

        let freq = Frequency::parse(self.freq.as_deref().unwrap_or(def.default_freq))?;
        let time = resolved[0].time();
        let sampling = match time.sampling_frequency() {
            Some(sampling) => sampling,
            None if time.len() < 2 => src_freq,
            None => {
                return Err(Error::frequency(
                    "irregular",
                    format!("cannot determine the sampling step of `{}`", resolved[0].name()),
                ))
            }
        };
        let grouping = Grouping::resolve(time, &freq, Some(&sampling))?;

        let policy = match (self.missing, options.check_missing) {
            (Some(p), _) => p,
            (None, false) => MissingPolicy::None,
            (None, true) => def.missing.unwrap_or(options.missing),
        };
        policy.check()?;

        Ok(Plan {
            definition: def.clone(),
            compute: indicator.compute,
            inputs: resolved,
            grouping,
            args,
            policy,
            summary: CallSummary {
                freq,
                params: shown,
                missing: policy,
                keep_history: self.keep_history.unwrap_or(options.keep_history),
            },
        })
    }
}

/// Everything the numeric phase needs, fully resolved.
struct Plan {
    definition: IndicatorDefinition,
    compute: ComputeFn,
    inputs: Vec<LabeledArray>,
    grouping: Grouping,
    args: IndexArgs,
    policy: MissingPolicy,
    summary: CallSummary,
}

impl Plan {
    fn into_deferred(self) -> Deferred<LabeledArray> {
        Deferred::new(move || self.run())
    }

    fn run(self) -> Result<LabeledArray> {
        let id = self.definition.identifier;
        let raw = (self.compute)(&self.inputs, &self.grouping, &self.args)?;
        ensure_post!(
            raw.n_times() == self.grouping.len() && raw.n_locations() == self.inputs[0].n_locations(),
            "`{id}` returned {} periods x {} locations, expected {} x {}",
            raw.n_times(),
            raw.n_locations(),
            self.grouping.len(),
            self.inputs[0].n_locations()
        );
        transition(id, "Computed");

        let counts = self
            .inputs
            .iter()
            .map(|a| a.count_valid(&self.grouping))
            .collect::<Result<Vec<_>>>()?;
        let masked = mask_invalid(&raw, &self.grouping, &counts, self.policy)?;
        transition(id, "Masked");

        let annotated = annotate(&self.definition, &self.summary, &self.inputs, &masked)?;
        transition(id, "Annotated");

        let out = annotated.with_provenance(Provenance {
            indicator: id.to_string(),
            computed_at: Utc::now(),
        });
        transition(id, "Done");
        Ok(out)
    }
}

fn transition(indicator: &str, stage: &str) {
    tracing::debug!(indicator, stage, "state transition");
}

fn report(mode: ValidationMode, sink: &dyn NoticeSink, error: Error) -> Result<()> {
    match mode {
        ValidationMode::Raise => Err(error),
        ValidationMode::Warn => {
            sink.emit(Severity::Warning, &error.to_string());
            Ok(())
        }
        ValidationMode::Log => {
            sink.emit(Severity::Info, &error.to_string());
            Ok(())
        }
    }
}

fn check_kind(id: &str, spec: &InputSpec, array: &LabeledArray, mode: ValidationMode, sink: &dyn NoticeSink) -> Result<()> {
    let units = array.units().ok_or_else(|| Error::MissingUnits {
        variable: array.name().to_string(),
    })?;
    let kind_error = |expected: String, found: String| Error::InputKind {
        indicator: id.to_string(),
        parameter: spec.name.to_string(),
        expected,
        found,
    };
    if let Some(declared) = array.kind() {
        if declared.family() != spec.kind.family() {
            return Err(kind_error(spec.kind.to_string(), declared.to_string()));
        }
        if declared != spec.kind {
            report(mode, sink, kind_error(spec.kind.to_string(), declared.to_string()))?;
        }
    }
    let dimension = registry().dimension_of(units)?;
    if !spec.kind.accepts_dimension(dimension) {
        return Err(kind_error(
            format!("{} ({})", spec.kind, spec.kind.dimension()),
            format!("`{units}` ({dimension})"),
        ));
    }
    Ok(())
}

fn check_frequency(
    id: &str,
    expected: &Frequency,
    array: &LabeledArray,
    mode: ValidationMode,
    sink: &dyn NoticeSink,
) -> Result<()> {
    match array.time().infer_frequency() {
        Some(found) if found.same_as(expected) => Ok(()),
        Some(found) => report(
            mode,
            sink,
            Error::FrequencyMismatch {
                indicator: id.to_string(),
                expected: expected.code().to_string(),
                found: found.code().to_string(),
            },
        ),
        None if array.n_times() < 3 => {
            tracing::debug!(indicator = id, input = array.name(), "too few samples to infer a frequency");
            Ok(())
        }
        None => report(
            mode,
            sink,
            Error::FrequencyMismatch {
                indicator: id.to_string(),
                expected: expected.code().to_string(),
                found: "irregular".to_string(),
            },
        ),
    }
}

fn resolve_param(
    id: &str,
    spec: &ParamSpec,
    value: ParamValue,
    def: &IndicatorDefinition,
    inputs: &[LabeledArray],
) -> Result<ArgValue> {
    match spec.kind {
        ParamKind::Quantity { input } => {
            let quantity = match value {
                ParamValue::Text(text) => Quantity::parse(&text)?,
                ParamValue::Quantity(q) => q,
                other => {
                    return Err(Error::unparseable_unit(
                        other.to_string(),
                        format!("`{id}` parameter `{}` needs a quantity with units", spec.name),
                    ))
                }
            };
            let native = inputs[input].require_units()?;
            let context = def.inputs[input].kind.context();
            Ok(ArgValue::Number(quantity.value_in_with(native, context)?))
        }
        ParamKind::Count => {
            let n = match value {
                ParamValue::Count(n) => n,
                ParamValue::Text(text) => text.trim().parse::<usize>().map_err(|_| {
                    Error::InvalidArgument(format!("`{id}` parameter `{}` needs a count, got `{text}`", spec.name))
                })?,
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "`{id}` parameter `{}` needs a count, got `{other}`",
                        spec.name
                    )))
                }
            };
            ensure!(n > 0, "`{id}` parameter `{}` must be positive", spec.name);
            Ok(ArgValue::Count(n))
        }
        ParamKind::Op => match value {
            ParamValue::Op(op) => Ok(ArgValue::Op(op)),
            ParamValue::Text(text) => Ok(ArgValue::Op(text.parse()?)),
            other => Err(Error::InvalidArgument(format!(
                "`{id}` parameter `{}` needs a resample op, got `{other}`",
                spec.name
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::CollectingSink;
    use cm_time::{CalendarKind, CfDate, TimeAxis};

    fn passthrough(inputs: &[LabeledArray], grouping: &Grouping, args: &IndexArgs) -> Result<LabeledArray> {
        let shift = args.number("thresh")?;
        inputs[0].map(move |v| v - shift).resample(grouping, cm_array::Reducer::Max)
    }

    fn indicator() -> Indicator {
        Indicator::new(
            IndicatorDefinition::new("shifted_max")
                .with_long_name("{freq} maximum above {thresh}")
                .with_cell_methods("time: maximum over days")
                .with_input(InputSpec::new("tasmax", PhysicalKind::MaxAirTemperature))
                .with_param(ParamSpec::quantity("thresh", 0, "0 degC")),
            passthrough,
        )
        .unwrap()
    }

    fn tasmax(n: usize, units: &str) -> LabeledArray {
        let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::NoLeap, 2001, 1, 1).unwrap(), n);
        LabeledArray::builder("tasmax", axis)
            .values((0..n).map(|d| 273.15 + d as Real).collect())
            .units(units)
            .kind(PhysicalKind::MaxAirTemperature)
            .build()
            .unwrap()
    }

    #[test]
    fn thresholds_resolve_into_input_units() {
        let out = indicator().call().input("tasmax", &tasmax(365, "K")).compute().unwrap();
        assert_eq!(out.name(), "shifted_max");
        assert!((out.get(0, 0) - 364.0).abs() < 1e-9);
        assert_eq!(out.attr("long_name"), Some("annual maximum above 0 degC"));
        assert_eq!(out.provenance().unwrap().indicator, "shifted_max");
    }

    #[test]
    fn definition_checks() {
        let no_input = Indicator::new(IndicatorDefinition::new("x"), passthrough);
        assert!(no_input.is_err());
        let dangling = Indicator::new(
            IndicatorDefinition::new("x")
                .with_input(InputSpec::new("tas", PhysicalKind::AirTemperature))
                .with_param(ParamSpec::quantity("thresh", 1, "0 K")),
            passthrough,
        );
        assert!(dangling.is_err());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let ind = indicator();
        let arr = tasmax(365, "K");
        assert!(ind.call().input("tas", &arr).build().is_err());
        assert!(ind.call().input("tasmax", &arr).param("nope", "1 K").build().is_err());
        assert!(ind.call().build().is_err());
    }

    #[test]
    fn errors_surface_at_build_time() {
        let ind = indicator();
        let arr = tasmax(365, "K");
        let err = ind.call().input("tasmax", &arr).param("thresh", "20 furlongs").build().unwrap_err();
        assert!(err.is_unit_error());
        let err = ind.call().input("tasmax", &arr).param("thresh", "20 mm").build().unwrap_err();
        assert!(err.is_unit_error());
        let err = ind.call().input("tasmax", &arr).freq("fortnightly").build().unwrap_err();
        assert!(err.is_frequency_error());
    }

    #[test]
    fn deferred_until_forced() {
        let handle = indicator().call().input("tasmax", &tasmax(365, "K")).build().unwrap();
        assert!(!handle.is_materialized());
        assert_eq!(handle.force().unwrap().n_times(), 1);
        assert!(handle.is_materialized());
    }

    #[test]
    fn same_family_kind_warns() {
        let sink = CollectingSink::shared();
        let arr = tasmax(365, "K").with_kind(Some(PhysicalKind::AirTemperature));
        indicator()
            .call()
            .input("tasmax", &arr)
            .validation(ValidationMode::Warn)
            .sink(sink.clone())
            .compute()
            .unwrap();
        assert_eq!(sink.at_least(Severity::Warning).len(), 1);
        let err = indicator()
            .call()
            .input("tasmax", &arr)
            .validation(ValidationMode::Raise)
            .build()
            .unwrap_err();
        assert!(err.is_input_kind_error());
    }

    #[test]
    fn axis_without_common_step_fails_at_build() {
        let day = 86_400;
        let axis = TimeAxis::new(CalendarKind::NoLeap, vec![0, day, 2 * day + 7_200, 5 * day]).unwrap();
        let arr = LabeledArray::builder("tasmax", axis)
            .values(vec![280.0; 4])
            .units("K")
            .kind(PhysicalKind::MaxAirTemperature)
            .build()
            .unwrap();
        let sink = CollectingSink::shared();
        let err = indicator()
            .call()
            .input("tasmax", &arr)
            .validation(ValidationMode::Warn)
            .sink(sink.clone())
            .build()
            .unwrap_err();
        assert!(err.is_frequency_error());
        let warnings = sink.at_least(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("irregular"));
    }

    #[test]
    fn args_are_typed() {
        let args = IndexArgs::new()
            .with("thresh", ArgValue::Number(1.0))
            .with("window", ArgValue::Count(3));
        assert_eq!(args.number("thresh").unwrap(), 1.0);
        assert_eq!(args.count("window").unwrap(), 3);
        assert!(args.count("thresh").is_err());
        assert!(args.op("missing").is_err());
    }
}
