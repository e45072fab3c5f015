use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::state::config_path;
use crate::{ClientError, ClientResult};

pub const DEFAULT_DISCREPANCY_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub sheets: SheetNames,
    pub reconciliation: ReconciliationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetNames {
    pub orders: String,
    pub supplier_invoices: String,
    pub allocations: String,
    pub kitchen_sales: String,
    pub kitchen_mapping: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            orders: "Orders".to_string(),
            supplier_invoices: "SupplierInvoices".to_string(),
            allocations: "Allocations".to_string(),
            kitchen_sales: "KitchenSales".to_string(),
            kitchen_mapping: "KitchenMapping".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconciliationConfig {
    /// Largest allocated-vs-invoiced difference, in currency units, that is
    /// still treated as equal.
    pub discrepancy_epsilon: f64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            discrepancy_epsilon: DEFAULT_DISCREPANCY_EPSILON,
        }
    }
}

impl LedgerConfig {
    /// Reads `<home>/config.toml`; a missing file yields the defaults.
    pub fn load(home: &Path) -> ClientResult<Self> {
        let path = config_path(home);
        if !path.exists() {
            return Ok(Self::default());
        }

        let body = fs::read_to_string(&path)
            .map_err(|error| ClientError::config_invalid(&path, &error.to_string()))?;
        Self::parse(&body).map_err(|detail| ClientError::config_invalid(&path, &detail))
    }

    pub fn parse(body: &str) -> Result<Self, String> {
        let config = toml::from_str::<Self>(body).map_err(|error| error.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let epsilon = self.reconciliation.discrepancy_epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err("reconciliation.discrepancy_epsilon must be a non-negative number".into());
        }

        let names = [
            ("sheets.orders", &self.sheets.orders),
            ("sheets.supplier_invoices", &self.sheets.supplier_invoices),
            ("sheets.allocations", &self.sheets.allocations),
            ("sheets.kitchen_sales", &self.sheets.kitchen_sales),
            ("sheets.kitchen_mapping", &self.sheets.kitchen_mapping),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(format!("{key} must not be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_DISCREPANCY_EPSILON, LedgerConfig};

    #[test]
    fn empty_body_yields_defaults() {
        let parsed = LedgerConfig::parse("");
        assert!(parsed.is_ok());
        if let Ok(config) = parsed {
            assert_eq!(config.sheets.orders, "Orders");
            assert_eq!(config.sheets.kitchen_mapping, "KitchenMapping");
            assert_eq!(
                config.reconciliation.discrepancy_epsilon,
                DEFAULT_DISCREPANCY_EPSILON
            );
        }
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let parsed = LedgerConfig::parse(
            "[sheets]\norders = \"Franchise Orders\"\n\n[reconciliation]\ndiscrepancy_epsilon = 0.5\n",
        );
        assert!(parsed.is_ok());
        if let Ok(config) = parsed {
            assert_eq!(config.sheets.orders, "Franchise Orders");
            assert_eq!(config.sheets.allocations, "Allocations");
            assert_eq!(config.reconciliation.discrepancy_epsilon, 0.5);
        }
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(LedgerConfig::parse("[sheets]\ninvoices = \"X\"\n").is_err());
        assert!(LedgerConfig::parse("[reconciliation]\ndiscrepancy_epsilon = -1.0\n").is_err());
        assert!(LedgerConfig::parse("[sheets]\norders = \"  \"\n").is_err());
    }
}
