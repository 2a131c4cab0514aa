//! Technician Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{RawAmount, to_decimal_or_zero};

pub type TechnicianId = i64;

/// Technician / subcontractor row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianRecord {
    pub id: TechnicianId,
    pub name: String,
    /// Percentage (0-100) of job NET paid to the technician
    #[serde(default)]
    pub commission_rate: Option<RawAmount>,
}

impl TechnicianRecord {
    /// Commission rate as a decimal percentage; null or non-numeric means 0
    pub fn rate(&self) -> Decimal {
        to_decimal_or_zero(self.commission_rate.as_ref(), "commission_rate")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_number_or_string() {
        let techs: Vec<TechnicianRecord> = serde_json::from_str(
            r#"[{"id":1,"name":"Alice","commission_rate":75},
                {"id":2,"name":"Bob","commission_rate":"37.5"},
                {"id":3,"name":"Cara","commission_rate":"n/a"},
                {"id":4,"name":"Dan"}]"#,
        )
        .unwrap();
        let rates: Vec<String> = techs.iter().map(|t| t.rate().to_string()).collect();
        assert_eq!(rates, vec!["75", "37.5", "0", "0"]);
    }
}
