use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReturnLayersError;
use crate::types::Percent;
use crate::ReturnLayersResult;

/// One asset class row. All figures are percentages (8.0 = 8%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClass {
    /// Display label, unique within the input list
    pub name: String,
    /// Expected gross nominal return
    #[serde(alias = "grossReturn")]
    pub gross_return: Percent,
    /// Expense drag (fees, trading costs); must not be negative
    pub expenses: Percent,
}

impl AssetClass {
    pub fn new(name: impl Into<String>, gross_return: Percent, expenses: Percent) -> Self {
        Self {
            name: name.into(),
            gross_return,
            expenses,
        }
    }
}

/// Economic parameters shared by every asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameters {
    pub inflation: Percent,
    #[serde(alias = "taxRate")]
    pub tax_rate: Percent,
    #[serde(alias = "borrowingCost")]
    pub borrowing_cost: Percent,
    /// Share of the position financed with debt, `0 <= percent_debt < 100`
    #[serde(alias = "percentDebt")]
    pub percent_debt: Percent,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        Self {
            inflation: dec!(2.1),
            tax_rate: dec!(20),
            borrowing_cost: dec!(4),
            percent_debt: dec!(20),
        }
    }
}

/// Which family of formulas turns inputs into return layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaVariant {
    /// Leverage scaled by D/E, Fisher deflation for real returns, and a
    /// geometric risk premium.
    #[default]
    Compounding,
    /// Leverage scaled by the debt share, inflation and the after-tax
    /// risk-free rate simply subtracted. Also reports tax and inflation impact.
    Linear,
}

impl FormulaVariant {
    pub fn describe(&self) -> &'static str {
        match self {
            FormulaVariant::Compounding => {
                "Compounding: leverage d/(1-d), Fisher deflation, geometric risk premium"
            }
            FormulaVariant::Linear => {
                "Linear approximation: leverage d, real = nominal - inflation, arithmetic risk premium"
            }
        }
    }
}

impl fmt::Display for FormulaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaVariant::Compounding => write!(f, "compounding"),
            FormulaVariant::Linear => write!(f, "linear"),
        }
    }
}

impl FromStr for FormulaVariant {
    type Err = ReturnLayersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compounding" | "a" => Ok(FormulaVariant::Compounding),
            "linear" | "b" => Ok(FormulaVariant::Linear),
            other => Err(ReturnLayersError::InvalidInput {
                field: "variant".into(),
                reason: format!("Unknown formula variant '{other}'. Use: compounding, linear"),
            }),
        }
    }
}

/// Complete calculator state: the asset list, the global parameters, the
/// asset that supplies the risk-free rate and the formula family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLayersInput {
    pub assets: Vec<AssetClass>,
    pub globals: GlobalParameters,
    /// Name of the asset whose gross return is the risk-free rate
    #[serde(alias = "riskFreeAsset", alias = "riskFreeAssetId")]
    pub risk_free_asset: String,
    #[serde(default)]
    pub variant: FormulaVariant,
}

impl ReturnLayersInput {
    /// The three-asset teaching example: equities, corporate bonds and
    /// T-bills as the risk-free proxy.
    pub fn sample() -> Self {
        Self {
            assets: vec![
                AssetClass::new("Equities", dec!(8.0), dec!(0.5)),
                AssetClass::new("Corporate Bonds", dec!(6.5), dec!(0.3)),
                AssetClass::new("Treasury Bills", dec!(2.5), dec!(0.0)),
            ],
            globals: GlobalParameters::default(),
            risk_free_asset: "Treasury Bills".into(),
            variant: FormulaVariant::Compounding,
        }
    }

    pub fn asset(&self, name: &str) -> Option<&AssetClass> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// Gross return of the designated risk-free asset, in percent.
    pub fn risk_free_rate(&self) -> ReturnLayersResult<Percent> {
        self.asset(&self.risk_free_asset)
            .map(|a| a.gross_return)
            .ok_or_else(|| ReturnLayersError::UnknownAsset(self.risk_free_asset.clone()))
    }

    /// Structural checks that concern the list as a whole.
    pub fn validate_assets(&self) -> ReturnLayersResult<()> {
        if self.assets.is_empty() {
            return Err(ReturnLayersError::InsufficientData(
                "At least one asset class is required".into(),
            ));
        }
        for (i, asset) in self.assets.iter().enumerate() {
            if self.assets[..i].iter().any(|a| a.name == asset.name) {
                return Err(ReturnLayersError::DuplicateAsset(asset.name.clone()));
            }
        }
        Ok(())
    }
}
