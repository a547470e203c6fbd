//! ## Column Rules
//!
//! A [`Rule`] describes what happens to one column of a dataset during preprocessing: an optional
//! policy for its missing values ([`FillNa`]) followed by an optional column transform ([`Proc`]).
//! Rules are plain data; the [`crate::interpreter`] turns an ordered list of them into pipeline
//! steps.
//!
//! Rule lists are normally taken from the [`crate::registry`], but a [`RuleSet`] can also be read
//! from (and written to) JSON:
//!
//! ```json
//! {
//!   "rules": [
//!     { "field": "Ticket", "display_name": "ticket number", "proc": { "kind": "drop" } },
//!     {
//!       "field": "Embarked",
//!       "display_name": "port of embarkation",
//!       "fill_na": { "policy": "mode" },
//!       "proc": { "kind": "one_hot_encode" }
//!     },
//!     {
//!       "field": "Year",
//!       "display_name": "release year",
//!       "proc": {
//!         "kind": "bin",
//!         "spec": { "kind": "boundaries", "edges": [1970, 1990, "inf"], "labels": [0, 1] },
//!         "narration": ["release years were grouped into two periods"]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Unbounded bin edges are written as the strings `"inf"` and `"-inf"`.

use crate::exceptions::{PreprocError, PreprocResult};
use datafusion::arrow::datatypes::DataType;
use datafusion::scalar::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of narration lines a binning rule may carry.
pub const MAX_NARRATION_LINES: usize = 3;

/// A fixed replacement for missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl FillValue {
    /// Converts the value to a literal suited to a column of `data_type`.
    /// Whole numbers filled into integer columns stay integers.
    pub fn to_scalar(&self, data_type: &DataType) -> ScalarValue {
        match self {
            FillValue::Number(n) if data_type.is_integer() && n.fract() == 0.0 => {
                ScalarValue::Int64(Some(*n as i64))
            }
            FillValue::Number(n) => ScalarValue::Float64(Some(*n)),
            FillValue::Text(s) => ScalarValue::Utf8(Some(s.clone())),
        }
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Number(n) => write!(f, "{}", n),
            FillValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<f64> for FillValue {
    fn from(value: f64) -> Self {
        FillValue::Number(value)
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        FillValue::Text(value.to_string())
    }
}

/// How missing values of a column are replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FillNa {
    /// A fixed number or text.
    Value { value: FillValue },
    /// The most frequent non-missing value of the column.
    Mode,
    /// The median of the rows sharing the same `group_field` value.
    GroupMedian {
        group_field: String,
        group_display_name: String,
    },
}

impl FillNa {
    pub fn value(value: impl Into<FillValue>) -> Self {
        FillNa::Value {
            value: value.into(),
        }
    }

    pub fn group_median(
        group_field: impl Into<String>,
        group_display_name: impl Into<String>,
    ) -> Self {
        FillNa::GroupMedian {
            group_field: group_field.into(),
            group_display_name: group_display_name.into(),
        }
    }
}

/// How the values of a binned column are partitioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BinSpec {
    /// `bins` equal-frequency bins labelled `0..bins`.
    Quantiles { bins: usize },
    /// Explicit edges; `labels[i]` names the bin between `edges[i]` and `edges[i + 1]`.
    Boundaries {
        #[serde(with = "edge_list")]
        edges: Vec<f64>,
        labels: Vec<i64>,
    },
}

/// The column transform applied after the missing-value policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proc {
    Drop,
    IndexEncode,
    OneHotEncode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        baseline: Option<String>,
    },
    Bin {
        spec: BinSpec,
        narration: Vec<String>,
    },
}

impl Proc {
    pub fn one_hot() -> Self {
        Proc::OneHotEncode { baseline: None }
    }

    pub fn one_hot_with_baseline(baseline: impl Into<String>) -> Self {
        Proc::OneHotEncode {
            baseline: Some(baseline.into()),
        }
    }

    pub fn bin_quantiles(bins: usize, narration: &[&str]) -> Self {
        Proc::Bin {
            spec: BinSpec::Quantiles { bins },
            narration: narration.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn bin_edges(edges: &[f64], labels: &[i64], narration: &[&str]) -> Self {
        Proc::Bin {
            spec: BinSpec::Boundaries {
                edges: edges.to_vec(),
                labels: labels.to_vec(),
            },
            narration: narration.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Preprocessing instructions for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Name of the column in the table.
    pub field: String,
    /// Name of the column as shown in the transformation log.
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_na: Option<FillNa>,
    /// Fill missing values even when this column is the prediction target.
    #[serde(default)]
    pub target_exempt_from_drop: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc: Option<Proc>,
}

impl Rule {
    pub fn new(field: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            display_name: display_name.into(),
            fill_na: None,
            target_exempt_from_drop: false,
            proc: None,
        }
    }

    pub fn fill(mut self, fill_na: FillNa) -> Self {
        self.fill_na = Some(fill_na);
        self
    }

    pub fn exempt(mut self) -> Self {
        self.target_exempt_from_drop = true;
        self
    }

    pub fn with_proc(mut self, proc: Proc) -> Self {
        self.proc = Some(proc);
        self
    }

    /// Checks that the rule is well formed. Column existence is checked when the rule runs.
    pub fn validate(&self) -> PreprocResult<()> {
        if self.field.trim().is_empty() {
            return Err(PreprocError::InvalidParameter(
                "Rule field cannot be empty".to_string(),
            ));
        }
        match &self.fill_na {
            Some(FillNa::Value {
                value: FillValue::Number(n),
            }) if !n.is_finite() => {
                return Err(PreprocError::InvalidParameter(format!(
                    "Rule '{}': fill value {} must be finite",
                    self.field, n
                )));
            }
            Some(FillNa::GroupMedian { group_field, .. }) if group_field.trim().is_empty() => {
                return Err(PreprocError::InvalidParameter(format!(
                    "Rule '{}': group field cannot be empty",
                    self.field
                )));
            }
            _ => {}
        }
        match &self.proc {
            Some(Proc::OneHotEncode {
                baseline: Some(baseline),
            }) if baseline.is_empty() => Err(PreprocError::InvalidParameter(format!(
                "Rule '{}': baseline category cannot be empty",
                self.field
            ))),
            Some(Proc::Bin { spec, narration }) => {
                if narration.is_empty() || narration.len() > MAX_NARRATION_LINES {
                    return Err(PreprocError::InvalidParameter(format!(
                        "Rule '{}': binning needs 1 to {} narration lines, got {}",
                        self.field,
                        MAX_NARRATION_LINES,
                        narration.len()
                    )));
                }
                validate_bin_spec(&self.field, spec)
            }
            _ => Ok(()),
        }
    }
}

fn validate_bin_spec(field: &str, spec: &BinSpec) -> PreprocResult<()> {
    match spec {
        BinSpec::Quantiles { bins } if *bins == 0 => Err(PreprocError::InvalidParameter(format!(
            "Rule '{}': number of quantile bins must be at least 1",
            field
        ))),
        BinSpec::Quantiles { .. } => Ok(()),
        BinSpec::Boundaries { edges, labels } => {
            if edges.len() < 2 || labels.len() != edges.len() - 1 {
                return Err(PreprocError::InvalidParameter(format!(
                    "Rule '{}': {} edges cannot describe {} bins",
                    field,
                    edges.len(),
                    labels.len()
                )));
            }
            if edges.iter().any(|e| e.is_nan()) || edges.windows(2).any(|p| p[0] >= p[1]) {
                return Err(PreprocError::InvalidParameter(format!(
                    "Rule '{}': bin edges must be strictly increasing, got {:?}",
                    field, edges
                )));
            }
            Ok(())
        }
    }
}

/// An ordered list of rules with a JSON representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parses and validates a rule set.
    ///
    /// Well-formed JSON that does not describe valid rules (an unknown `kind` or `policy`, a
    /// missing field) is reported as `InvalidParameter`; malformed JSON stays a `SerdeError`.
    pub fn from_json(json: &str) -> PreprocResult<Self> {
        let set: RuleSet = serde_json::from_str(json).map_err(|err| {
            if err.is_data() {
                PreprocError::InvalidParameter(format!("Invalid rule set: {}", err))
            } else {
                PreprocError::from(err)
            }
        })?;
        set.validate()?;
        Ok(set)
    }

    pub fn to_json(&self) -> PreprocResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> PreprocResult<()> {
        self.rules.iter().try_for_each(Rule::validate)
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}

/// Bin edges as JSON numbers, with infinities spelled `"inf"` / `"-inf"`.
mod edge_list {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Edge {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(edges: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(edges.iter().map(|&e| {
            if e == f64::INFINITY {
                Edge::Text("inf".to_string())
            } else if e == f64::NEG_INFINITY {
                Edge::Text("-inf".to_string())
            } else {
                Edge::Number(e)
            }
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Edge>::deserialize(deserializer)?
            .into_iter()
            .map(|edge| match edge {
                Edge::Number(n) => Ok(n),
                Edge::Text(t) => match t.to_ascii_lowercase().as_str() {
                    "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                    "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                    _ => Err(D::Error::custom(format!("invalid bin edge '{}'", t))),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::ErrorKind;

    #[test]
    fn test_rule_set_json_with_infinite_edges() {
        let json = r#"{
            "rules": [
                {"field": "Year", "display_name": "year",
                 "proc": {"kind": "bin",
                          "spec": {"kind": "boundaries", "edges": [1970, 1990, "inf"], "labels": [0, 1]},
                          "narration": ["years were grouped"]}},
                {"field": "Alley", "display_name": "alley", "target_exempt_from_drop": true,
                 "fill_na": {"policy": "value", "value": "None"}}
            ]
        }"#;
        let set = RuleSet::from_json(json).unwrap();
        assert_eq!(
            set.rules[0].proc,
            Some(Proc::bin_edges(
                &[1970.0, 1990.0, f64::INFINITY],
                &[0, 1],
                &["years were grouped"]
            ))
        );
        assert!(set.rules[1].target_exempt_from_drop);
        assert_eq!(set.rules[1].fill_na, Some(FillNa::value("None")));

        let again = RuleSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(again, set);
    }

    #[test]
    fn test_validate_rejects_malformed_bins() {
        let no_narration = Rule::new("Fare", "fare").with_proc(Proc::bin_quantiles(4, &[]));
        assert!(matches!(
            no_narration.validate(),
            Err(PreprocError::InvalidParameter(_))
        ));

        let mismatched = Rule::new("Fare", "fare").with_proc(Proc::bin_edges(
            &[0.0, 1.0, 2.0],
            &[0],
            &["fares were grouped"],
        ));
        assert!(mismatched.validate().is_err());

        let decreasing = Rule::new("Fare", "fare").with_proc(Proc::bin_edges(
            &[0.0, 2.0, 1.0],
            &[0, 1],
            &["fares were grouped"],
        ));
        assert!(decreasing.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_or_kind_is_a_configuration_error() {
        let json = r#"{"rules": [{"field": "Age", "display_name": "age", "fill_na": {"policy": "mean"}}]}"#;
        assert!(matches!(
            RuleSet::from_json(json),
            Err(PreprocError::InvalidParameter(_))
        ));

        let json = r#"{"rules": [{"field": "Age", "display_name": "age", "proc": {"kind": "standardize"}}]}"#;
        let err = RuleSet::from_json(json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_malformed_json_is_a_serde_error() {
        assert!(matches!(
            RuleSet::from_json(r#"{"rules": ["#),
            Err(PreprocError::SerdeError(_))
        ));
    }

    #[test]
    fn test_fill_value_scalar_follows_column_type() {
        assert_eq!(
            FillValue::Number(0.0).to_scalar(&DataType::Int64),
            ScalarValue::Int64(Some(0))
        );
        assert_eq!(
            FillValue::Number(0.0).to_scalar(&DataType::Float64),
            ScalarValue::Float64(Some(0.0))
        );
        assert_eq!(FillValue::Number(0.0).to_string(), "0");
        assert_eq!(FillValue::from("U").to_string(), "\"U\"");
    }
}
