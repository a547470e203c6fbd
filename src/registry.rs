//! ## Rule Registry
//!
//! Static, ordered rule lists for the datasets the engine knows about. Rule order is significant:
//! the interpreter applies the rules exactly in the order listed here.

use crate::exceptions::{PreprocError, PreprocResult};
use crate::rules::{FillNa, Proc, Rule};
use std::fmt;
use std::str::FromStr;

/// Datasets with a registered rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Titanic,
    Lego,
    House,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Titanic, Dataset::Lego, Dataset::House];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Titanic => "titanic",
            Dataset::Lego => "lego",
            Dataset::House => "house",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = PreprocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                PreprocError::UnknownDataset(format!(
                    "'{}' (expected one of: titanic, lego, house)",
                    s
                ))
            })
    }
}

/// Rules of a dataset, in application order.
pub fn rules_for(dataset: Dataset) -> Vec<Rule> {
    match dataset {
        Dataset::Titanic => titanic_rules(),
        Dataset::Lego => lego_rules(),
        Dataset::House => house_rules(),
    }
}

/// Rules of the dataset named `dataset_id`.
pub fn rules_for_id(dataset_id: &str) -> PreprocResult<Vec<Rule>> {
    Ok(rules_for(dataset_id.parse()?))
}

fn titanic_rules() -> Vec<Rule> {
    vec![
        Rule::new("PassengerId", "passenger ID").with_proc(Proc::Drop),
        Rule::new("Sex", "sex").with_proc(Proc::IndexEncode),
        Rule::new("Ticket", "ticket number").with_proc(Proc::Drop),
        Rule::new("Fare", "fare").with_proc(Proc::bin_quantiles(
            4,
            &["fare was split into 4 quantile bins; the bin index was added as FareBin"],
        )),
        Rule::new("Embarked", "port of embarkation")
            .fill(FillNa::Mode)
            .with_proc(Proc::one_hot()),
    ]
}

const INF: f64 = f64::INFINITY;

fn by_theme() -> FillNa {
    FillNa::group_median("Theme", "theme")
}

fn lego_rules() -> Vec<Rule> {
    vec![
        Rule::new("SetId", "set ID").with_proc(Proc::Drop),
        Rule::new("Name", "product name").with_proc(Proc::Drop),
        Rule::new("Year", "release year").with_proc(Proc::bin_edges(
            &[1970.0, 1980.0, 1990.0, 2000.0, 2010.0, INF],
            &[0, 1, 2, 3, 4],
            &[
                "release year was grouped by decade (1970s, 1980s, ...); the decade index",
                "was added as YearBin",
            ],
        )),
        Rule::new("Theme", "theme").with_proc(Proc::IndexEncode),
        Rule::new("ThemeGroup", "theme group")
            .fill(FillNa::value("Unknown"))
            .with_proc(Proc::one_hot()),
        Rule::new("Subtheme", "subtheme")
            .fill(FillNa::value("Unknown"))
            .with_proc(Proc::IndexEncode),
        Rule::new("Category", "category").with_proc(Proc::one_hot_with_baseline("Normal")),
        Rule::new("Packaging", "packaging")
            .with_proc(Proc::one_hot_with_baseline("{Not specified}")),
        Rule::new("Availability", "availability")
            .with_proc(Proc::one_hot_with_baseline("{Not specified}")),
        Rule::new("Pieces", "piece count")
            .fill(by_theme())
            .with_proc(Proc::bin_edges(
                &[0.0, 100.0, 500.0, 1000.0, 2000.0, INF],
                &[0, 1, 2, 3, 4],
                &[
                    "piece count was grouped as follows; the group index was added as PiecesBin",
                    "(0-100, 101-500, 501-1000, 1001-2000, over 2000)",
                ],
            )),
        Rule::new("Minifigures", "minifigure count")
            .fill(FillNa::value(0.0))
            .exempt(),
        Rule::new("Owned", "owner count")
            .fill(by_theme())
            .with_proc(Proc::bin_edges(
                &[0.0, 500.0, 1000.0, 5000.0, 10000.0, INF],
                &[0, 1, 2, 3, 4],
                &[
                    "owner count was grouped as follows; the group index was added as OwnedBin",
                    "(0-500, 501-1000, 1001-5000, 5001-10000, over 10000)",
                ],
            )),
        Rule::new("Rating", "rating").with_proc(Proc::bin_edges(
            &[0.0, 1.0, 2.0, 3.0, 4.0, INF],
            &[0, 1, 2, 3, 4],
            &[
                "rating was grouped as follows; the group index was added as RatingBin",
                "(0.0-1.0, 1.0-2.0, 2.0-3.0, 3.0-4.0, over 4.0)",
            ],
        )),
        Rule::new("UsdMsrp", "retail price (USD)")
            .fill(by_theme())
            .with_proc(Proc::bin_edges(
                &[0.0, 50.0, 100.0, 300.0, 500.0, INF],
                &[0, 1, 2, 3, 4],
                &[
                    "retail price (USD) was grouped as follows; the group index was added",
                    "as UsdMsrpBin",
                    "(0-50, 50-100, 100-300, 300-500, over 500)",
                ],
            )),
        Rule::new("TotalQuantity", "total quantity")
            .fill(FillNa::value(0.0))
            .with_proc(Proc::bin_edges(
                &[0.0, 50.0, 100.0, 200.0, 300.0, INF],
                &[0, 1, 2, 3, 4],
                &[
                    "total quantity was grouped as follows; the group index was added as TotalQuantityBin",
                    "(0-50, 51-100, 101-200, 201-300, over 300)",
                ],
            )),
        Rule::new("CurrentPrice", "current price (USD)")
            .fill(by_theme())
            .with_proc(Proc::bin_edges(
                &[0.0, 50.0, 100.0, 300.0, 500.0, 1000.0, INF],
                &[0, 1, 2, 3, 4, 5],
                &[
                    "current price (USD) was grouped as follows; the group index was added",
                    "as CurrentPriceBin",
                    "(0-50, 50-100, 100-300, 300-500, 500-1000, over 1000)",
                ],
            )),
    ]
}

fn index(field: &str, display_name: &str) -> Rule {
    Rule::new(field, display_name).with_proc(Proc::IndexEncode)
}

/// Index-encoded column whose missing entries mean "not present" rather than "unknown".
fn absent_as_none(field: &str, display_name: &str) -> Rule {
    index(field, display_name)
        .fill(FillNa::value("None"))
        .exempt()
}

fn house_rules() -> Vec<Rule> {
    vec![
        Rule::new("HouseId", "house ID").with_proc(Proc::Drop),
        index("MSSubClass", "dwelling type"),
        index("MSZoning", "zoning"),
        Rule::new("LotFrontage", "street frontage").fill(FillNa::value(0.0)),
        index("Street", "street access type"),
        absent_as_none("Alley", "alley access type"),
        index("LotShape", "lot shape"),
        index("LandContour", "land flatness"),
        index("Utilities", "utilities"),
        index("LotConfig", "lot configuration"),
        index("LandSlope", "land slope"),
        index("Neighborhood", "neighborhood"),
        index("Condition1", "condition 1"),
        index("Condition2", "condition 2"),
        index("BldgType", "building type"),
        index("HouseStyle", "house style"),
        index("RoofStyle", "roof style"),
        index("RoofMatl", "roof material"),
        index("Exterior1st", "exterior covering 1"),
        index("Exterior2nd", "exterior covering 2"),
        absent_as_none("MasVnrType", "masonry veneer type"),
        Rule::new("MasVnrArea", "masonry veneer area")
            .fill(FillNa::value(0.0))
            .exempt(),
        index("ExterQual", "exterior quality"),
        index("ExterCond", "exterior condition"),
        index("Foundation", "foundation"),
        absent_as_none("BsmtQual", "basement quality"),
        absent_as_none("BsmtCond", "basement condition"),
        absent_as_none("BsmtExposure", "basement exposure"),
        absent_as_none("BsmtFinType1", "basement finish type 1"),
        absent_as_none("BsmtFinType2", "basement finish type 2"),
        index("Heating", "heating"),
        index("HeatingQC", "heating quality and condition"),
        index("CentralAir", "central air conditioning"),
        index("Electrical", "electrical system").fill(FillNa::value("SBrkr")),
        index("KitchenQual", "kitchen quality"),
        index("Functional", "functionality"),
        absent_as_none("FireplaceQu", "fireplace quality"),
        absent_as_none("GarageType", "garage type"),
        Rule::new("GarageYrBlt", "garage year built")
            .fill(FillNa::value(0.0))
            .exempt(),
        absent_as_none("GarageFinish", "garage finish"),
        absent_as_none("GarageQual", "garage quality"),
        absent_as_none("GarageCond", "garage condition"),
        index("PavedDrive", "paved driveway"),
        absent_as_none("PoolQC", "pool quality and condition"),
        absent_as_none("Fence", "fence"),
        absent_as_none("MiscFeature", "miscellaneous feature"),
        index("SaleType", "sale type"),
        index("SaleCondition", "sale condition"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_from_str() {
        assert_eq!("lego".parse::<Dataset>().unwrap(), Dataset::Lego);
        assert!(matches!(
            "iris".parse::<Dataset>(),
            Err(PreprocError::UnknownDataset(_))
        ));
    }

    #[test]
    fn test_rules_by_identifier() {
        assert_eq!(rules_for_id("house").unwrap(), rules_for(Dataset::House));
        assert!(matches!(
            rules_for_id("Titanic"),
            Err(PreprocError::UnknownDataset(_))
        ));
    }

    #[test]
    fn test_registered_rules_are_valid() {
        for dataset in Dataset::ALL {
            let rules = rules_for(dataset);
            assert!(!rules.is_empty());
            for rule in &rules {
                rule.validate().unwrap();
            }
        }
    }

    #[test]
    fn test_titanic_rule_order() {
        let fields: Vec<String> = rules_for(Dataset::Titanic)
            .into_iter()
            .map(|r| r.field)
            .collect();
        assert_eq!(
            fields,
            vec!["PassengerId", "Sex", "Ticket", "Fare", "Embarked"]
        );
    }

    #[test]
    fn test_house_rules_cover_all_fields_once() {
        let rules = rules_for(Dataset::House);
        assert_eq!(rules.len(), 48);
        let mut fields: Vec<&str> = rules.iter().map(|r| r.field.as_str()).collect();
        fields.sort_unstable();
        fields.dedup();
        assert_eq!(fields.len(), rules.len());
    }
}
