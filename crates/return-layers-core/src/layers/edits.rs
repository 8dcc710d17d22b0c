use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReturnLayersError;
use crate::types::Percent;
use crate::ReturnLayersResult;

use super::assets::{FormulaVariant, GlobalParameters, ReturnLayersInput};

/// Editable per-asset fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetField {
    GrossReturn,
    Expenses,
}

/// Editable global parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalField {
    Inflation,
    TaxRate,
    BorrowingCost,
    PercentDebt,
}

/// Lowercase and drop separators so `grossReturn`, `gross_return` and
/// `gross-return` all compare equal.
fn normalise_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for AssetField {
    type Err = ReturnLayersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_field_name(s).as_str() {
            "grossreturn" | "gross" => Ok(AssetField::GrossReturn),
            "expenses" => Ok(AssetField::Expenses),
            _ => Err(ReturnLayersError::InvalidInput {
                field: s.to_string(),
                reason: "Unknown asset field. Use: gross_return, expenses".into(),
            }),
        }
    }
}

impl FromStr for GlobalField {
    type Err = ReturnLayersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_field_name(s).as_str() {
            "inflation" => Ok(GlobalField::Inflation),
            "taxrate" => Ok(GlobalField::TaxRate),
            "borrowingcost" => Ok(GlobalField::BorrowingCost),
            "percentdebt" => Ok(GlobalField::PercentDebt),
            _ => Err(ReturnLayersError::InvalidInput {
                field: s.to_string(),
                reason: "Unknown global parameter. Use: inflation, tax_rate, borrowing_cost, percent_debt"
                    .into(),
            }),
        }
    }
}

impl fmt::Display for AssetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetField::GrossReturn => write!(f, "gross_return"),
            AssetField::Expenses => write!(f, "expenses"),
        }
    }
}

impl fmt::Display for GlobalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalField::Inflation => write!(f, "inflation"),
            GlobalField::TaxRate => write!(f, "tax_rate"),
            GlobalField::BorrowingCost => write!(f, "borrowing_cost"),
            GlobalField::PercentDebt => write!(f, "percent_debt"),
        }
    }
}

impl GlobalField {
    pub fn get(&self, globals: &GlobalParameters) -> Percent {
        match self {
            GlobalField::Inflation => globals.inflation,
            GlobalField::TaxRate => globals.tax_rate,
            GlobalField::BorrowingCost => globals.borrowing_cost,
            GlobalField::PercentDebt => globals.percent_debt,
        }
    }

    fn set(&self, globals: &mut GlobalParameters, value: Percent) {
        match self {
            GlobalField::Inflation => globals.inflation = value,
            GlobalField::TaxRate => globals.tax_rate = value,
            GlobalField::BorrowingCost => globals.borrowing_cost = value,
            GlobalField::PercentDebt => globals.percent_debt = value,
        }
    }
}

/// Convert raw form text into a percentage.
///
/// Non-numeric or empty text is rejected here so it never reaches the
/// calculator.
pub fn parse_field_value(field: &str, raw: &str) -> ReturnLayersResult<Percent> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ReturnLayersError::InvalidInput {
            field: field.to_string(),
            reason: "Value is empty".into(),
        });
    }
    let parsed = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed));
    parsed.map_err(|_| ReturnLayersError::InvalidInput {
        field: field.to_string(),
        reason: format!("'{trimmed}' is not a number"),
    })
}

/// A single form edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum FieldEdit {
    Asset {
        name: String,
        field: AssetField,
        value: Percent,
    },
    Global {
        field: GlobalField,
        value: Percent,
    },
}

impl FromStr for FieldEdit {
    type Err = ReturnLayersError;

    /// Parses `"<asset name>.<field>=<value>"` or `"<global field>=<value>"`.
    /// The asset name may itself contain dots; the last dot separates the field.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, raw) = s.split_once('=').ok_or_else(|| ReturnLayersError::InvalidInput {
            field: s.to_string(),
            reason: "Edit must look like 'field=value' or 'Asset.field=value'".into(),
        })?;
        let target = target.trim();

        match target.rsplit_once('.') {
            Some((name, field)) => {
                let field: AssetField = field.parse()?;
                Ok(FieldEdit::Asset {
                    name: name.trim().to_string(),
                    field,
                    value: parse_field_value(target, raw)?,
                })
            }
            None => {
                let field: GlobalField = target.parse()?;
                Ok(FieldEdit::Global {
                    field,
                    value: parse_field_value(target, raw)?,
                })
            }
        }
    }
}

impl ReturnLayersInput {
    /// New input with one field of one asset replaced.
    pub fn with_asset_field(
        &self,
        name: &str,
        field: AssetField,
        value: Percent,
    ) -> ReturnLayersResult<Self> {
        let mut next = self.clone();
        let asset = next
            .assets
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| ReturnLayersError::UnknownAsset(name.to_string()))?;
        match field {
            AssetField::GrossReturn => asset.gross_return = value,
            AssetField::Expenses => asset.expenses = value,
        }
        Ok(next)
    }

    /// New input with one global parameter replaced.
    pub fn with_global(&self, field: GlobalField, value: Percent) -> Self {
        let mut next = self.clone();
        field.set(&mut next.globals, value);
        next
    }

    pub fn with_risk_free_asset(&self, name: &str) -> ReturnLayersResult<Self> {
        if self.asset(name).is_none() {
            return Err(ReturnLayersError::UnknownAsset(name.to_string()));
        }
        let mut next = self.clone();
        next.risk_free_asset = name.to_string();
        Ok(next)
    }

    pub fn with_variant(&self, variant: FormulaVariant) -> Self {
        let mut next = self.clone();
        next.variant = variant;
        next
    }

    pub fn apply_edit(&self, edit: &FieldEdit) -> ReturnLayersResult<Self> {
        match edit {
            FieldEdit::Asset { name, field, value } => self.with_asset_field(name, *field, *value),
            FieldEdit::Global { field, value } => Ok(self.with_global(*field, *value)),
        }
    }
}
