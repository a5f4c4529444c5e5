//! CF-style metadata of indicator outputs.
//!
//! Everything written here is a function of the definition, the call
//! parameters and the inputs' own attributes: no clock, no randomness. The
//! only time stamp lives in the separate [`cm_array::Provenance`].

use std::collections::BTreeMap;

use cm_array::LabeledArray;
use cm_core::errors::{Error, Result};
use cm_indices::ResampleOp;
use cm_time::Frequency;
use cm_units::{registry, Dimension};

use crate::indicator::{IndicatorDefinition, ParamKind};
use crate::missing::MissingPolicy;

/// Attributes set by a raw index that survive annotation.
const PASS_THROUGH: [&str; 2] = ["is_dayofyear", "calendar"];

/// How the output units follow from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRule {
    /// Units of the first input, after its unit resolution.
    SameAsInput,
    /// Units reported by the raw index (accumulations, melt amounts).
    FromCompute,
    /// Always these units (`days` for counts, `""` for ratios).
    Fixed(&'static str),
}

/// What a single indicator call looked like, as far as metadata goes.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSummary {
    /// Resampling frequency.
    pub freq: Frequency,
    /// Parameters as given by the caller (or defaulted), by name.
    pub params: BTreeMap<String, String>,
    /// Masking policy in effect.
    pub missing: MissingPolicy,
    /// Whether to write the `history` attribute.
    pub keep_history: bool,
}

impl CallSummary {
    /// The `history` line of this call.
    pub fn history_line(&self, identifier: &str) -> String {
        let mut args: Vec<String> = self.params.iter().map(|(k, v)| format!("{k}='{v}'")).collect();
        args.push(format!("freq='{}'", self.freq.code()));
        format!(
            "{identifier}({}) with missing policy {} - climind {}",
            args.join(", "),
            self.missing,
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// Substitute `{freq}` and `{<param>}` placeholders. Unknown placeholders
/// are left in place.
pub fn fill_template(template: &str, freq: &Frequency, params: &BTreeMap<String, String>) -> String {
    let mut out = template.replace("{freq}", freq.adjective());
    for (name, value) in params {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

/// Attach the output name, units and descriptive attributes to `computed`.
///
/// Annotating an array that was already annotated with the same definition
/// and call gives identical attributes.
///
/// # Errors
/// [`Error::MissingUnits`] when the units rule needs units that are absent,
/// and [`Error::UnparseableUnit`] for a malformed fixed unit.
pub fn annotate(
    definition: &IndicatorDefinition,
    call: &CallSummary,
    inputs: &[LabeledArray],
    computed: &LabeledArray,
) -> Result<LabeledArray> {
    let units = output_units(definition, inputs, computed)?;

    let mut attrs = BTreeMap::new();
    for key in PASS_THROUGH {
        if let Some(v) = computed.attr(key) {
            attrs.insert(key.to_string(), v.to_string());
        }
    }
    attrs.insert(
        "long_name".into(),
        fill_template(definition.long_name(), &call.freq, &call.params),
    );
    attrs.insert(
        "description".into(),
        fill_template(definition.description(), &call.freq, &call.params),
    );
    if let Some(standard_name) = definition.standard_name() {
        attrs.insert("standard_name".into(), standard_name.to_string());
    }
    attrs.insert("cell_methods".into(), cell_methods(definition, call, inputs));
    attrs.insert("units".into(), units.clone());
    if let Some(meta) = units_metadata(definition, &units)? {
        attrs.insert("units_metadata".into(), meta.to_string());
    }
    if call.keep_history {
        attrs.insert("history".into(), history(definition, call, inputs, computed));
    }

    Ok(computed
        .clone()
        .with_name(definition.identifier())
        .with_kind(None)
        .with_attrs(attrs)
        .with_units(Some(&units))?)
}

fn output_units(definition: &IndicatorDefinition, inputs: &[LabeledArray], computed: &LabeledArray) -> Result<String> {
    let units = match definition.units() {
        UnitRule::Fixed(u) => u.to_string(),
        UnitRule::FromCompute => computed.require_units()?.to_string(),
        UnitRule::SameAsInput => {
            let first = inputs.first().ok_or_else(|| {
                Error::InvalidArgument(format!("`{}` has no input to take units from", definition.identifier()))
            })?;
            first.require_units()?.to_string()
        }
    };
    Ok(units)
}

fn units_metadata(definition: &IndicatorDefinition, units: &str) -> Result<Option<&'static str>> {
    if registry().dimension_of(units)? != Dimension::TEMPERATURE {
        return Ok(None);
    }
    Ok(Some(if definition.is_temperature_difference() {
        "temperature: difference"
    } else {
        "temperature: on_scale"
    }))
}

/// The definition's cell methods with `{<op param>}` replaced by the method
/// of the chosen op, appended to whatever the first input already carries.
fn cell_methods(definition: &IndicatorDefinition, call: &CallSummary, inputs: &[LabeledArray]) -> String {
    let mut own = definition.cell_methods().to_string();
    for spec in definition.params().iter().filter(|p| p.kind() == ParamKind::Op) {
        if let Some(op) = call.params.get(spec.name()).and_then(|v| v.parse::<ResampleOp>().ok()) {
            own = own.replace(&format!("{{{}}}", spec.name()), op.cell_method());
        }
    }
    match inputs.first().and_then(|a| a.attr("cell_methods")) {
        Some(inherited) if !inherited.is_empty() && !inherited.ends_with(own.as_str()) => format!("{inherited} {own}"),
        _ => own,
    }
}

fn history(definition: &IndicatorDefinition, call: &CallSummary, inputs: &[LabeledArray], computed: &LabeledArray) -> String {
    let mut lines: Vec<String> = Vec::new();
    let sources = inputs.iter().chain(std::iter::once(computed));
    for line in sources.filter_map(|a| a.attr("history")).flat_map(str::lines) {
        if !line.is_empty() && !lines.iter().any(|l| l == line) {
            lines.push(line.to_string());
        }
    }
    let own = call.history_line(definition.identifier());
    if !lines.contains(&own) {
        lines.push(own);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn templates_fill_known_placeholders() {
        let freq = Frequency::parse("QS-DEC").unwrap();
        let text = fill_template(
            "{freq} number of days with tasmax > {thresh} ({other})",
            &freq,
            &params(&[("thresh", "25 degC")]),
        );
        assert_eq!(text, "seasonal number of days with tasmax > 25 degC ({other})");
    }

    #[test]
    fn history_line_is_deterministic() {
        let call = CallSummary {
            freq: Frequency::parse("YS").unwrap(),
            params: params(&[("thresh", "25 degC"), ("a", "1")]),
            missing: MissingPolicy::AnyMissing,
            keep_history: true,
        };
        let line = call.history_line("tx_days_above");
        assert!(line.starts_with("tx_days_above(a='1', thresh='25 degC', freq='YS') with missing policy any_missing"));
        assert_eq!(line, call.history_line("tx_days_above"));
    }
}
