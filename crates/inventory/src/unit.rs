use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockbook_core::DomainError;

/// Unit-of-measure label shown next to a quantity.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    #[default]
    Piece,
    Kilogram,
    Gram,
    Litre,
    Metre,
    Box,
    Packet,
    Carton,
    Unit,
    Package,
}

impl UnitOfMeasure {
    pub const ALL: [UnitOfMeasure; 10] = [
        UnitOfMeasure::Piece,
        UnitOfMeasure::Kilogram,
        UnitOfMeasure::Gram,
        UnitOfMeasure::Litre,
        UnitOfMeasure::Metre,
        UnitOfMeasure::Box,
        UnitOfMeasure::Packet,
        UnitOfMeasure::Carton,
        UnitOfMeasure::Unit,
        UnitOfMeasure::Package,
    ];

    /// Short label, e.g. `"kg"`.
    pub fn label(self) -> &'static str {
        match self {
            UnitOfMeasure::Piece => "pcs",
            UnitOfMeasure::Kilogram => "kg",
            UnitOfMeasure::Gram => "g",
            UnitOfMeasure::Litre => "l",
            UnitOfMeasure::Metre => "m",
            UnitOfMeasure::Box => "box",
            UnitOfMeasure::Packet => "packet",
            UnitOfMeasure::Carton => "carton",
            UnitOfMeasure::Unit => "unit",
            UnitOfMeasure::Package => "pkg",
        }
    }

    /// Code stored by the shop forms.
    pub fn code(self) -> &'static str {
        match self {
            UnitOfMeasure::Piece => "dona",
            UnitOfMeasure::Kilogram => "kg",
            UnitOfMeasure::Gram => "gramm",
            UnitOfMeasure::Litre => "litr",
            UnitOfMeasure::Metre => "metr",
            UnitOfMeasure::Box => "quti",
            UnitOfMeasure::Packet => "paket",
            UnitOfMeasure::Carton => "korobka",
            UnitOfMeasure::Unit => "shtuk",
            UnitOfMeasure::Package => "qadoq",
        }
    }

    /// `"12 kg"`.
    pub fn display_quantity(self, quantity: i64) -> String {
        format!("{quantity} {}", self.label())
    }
}

impl core::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the short label, the stored code or the lowercase variant name.
impl FromStr for UnitOfMeasure {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        UnitOfMeasure::ALL
            .into_iter()
            .find(|u| {
                u.label() == needle
                    || u.code() == needle
                    || format!("{u:?}").to_lowercase() == needle
            })
            .ok_or_else(|| DomainError::validation(format!("unknown unit of measure: {s:?}")))
    }
}
