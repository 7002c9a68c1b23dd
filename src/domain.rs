use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest shipment identifier the warehouse issues.
pub const SHIPMENT_ID_FLOOR: i64 = 4_000_000;

/// Inclusive customer identifier range.
pub const CUSTOMER_ID_MIN: i64 = 10_000;
pub const CUSTOMER_ID_MAX: i64 = 35_000;

/// The exact column set an uploaded data set must carry, in storage order.
/// Shared by the schema check and the query layer's projection.
pub const EXPECTED_COLUMNS: [&str; 12] = [
    "shipment_id",
    "customer_id",
    "origin",
    "destination",
    "weight",
    "volume",
    "carrier",
    "mode",
    "status",
    "arrival_date",
    "departure_date",
    "delivered_date",
];

/// Columns that must be non-null for a shipment row to be complete.
/// `departure_date` and `delivered_date` are conditional on status and are
/// checked by the record validator instead.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "shipment_id",
    "customer_id",
    "origin",
    "destination",
    "weight",
    "volume",
    "carrier",
    "mode",
    "status",
    "arrival_date",
];

/// Destination country codes served by the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Destination {
    Guy,
    Svg,
    Slu,
    Bim,
    Dom,
    Grd,
    Skn,
    Anu,
    Sxm,
    Fsxm,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Guy => "GUY",
            Destination::Svg => "SVG",
            Destination::Slu => "SLU",
            Destination::Bim => "BIM",
            Destination::Dom => "DOM",
            Destination::Grd => "GRD",
            Destination::Skn => "SKN",
            Destination::Anu => "ANU",
            Destination::Sxm => "SXM",
            Destination::Fsxm => "FSXM",
        }
    }
}

impl FromStr for Destination {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GUY" => Ok(Destination::Guy),
            "SVG" => Ok(Destination::Svg),
            "SLU" => Ok(Destination::Slu),
            "BIM" => Ok(Destination::Bim),
            "DOM" => Ok(Destination::Dom),
            "GRD" => Ok(Destination::Grd),
            "SKN" => Ok(Destination::Skn),
            "ANU" => Ok(Destination::Anu),
            "SXM" => Ok(Destination::Sxm),
            "FSXM" => Ok(Destination::Fsxm),
            other => Err(AnalyticsError::InvariantViolation {
                field: "destination",
                rule: format!("unknown destination code '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping carriers the warehouse receives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Carrier {
    Fedex,
    Dhl,
    Usps,
    Ups,
    Amazon,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Fedex => "FEDEX",
            Carrier::Dhl => "DHL",
            Carrier::Usps => "USPS",
            Carrier::Ups => "UPS",
            Carrier::Amazon => "AMAZON",
        }
    }
}

impl FromStr for Carrier {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FEDEX" => Ok(Carrier::Fedex),
            "DHL" => Ok(Carrier::Dhl),
            "USPS" => Ok(Carrier::Usps),
            "UPS" => Ok(Carrier::Ups),
            "AMAZON" => Ok(Carrier::Amazon),
            other => Err(AnalyticsError::InvariantViolation {
                field: "carrier",
                rule: format!("unknown carrier '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Air,
    Sea,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Air => "air",
            Mode::Sea => "sea",
        }
    }
}

impl FromStr for Mode {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "air" => Ok(Mode::Air),
            "sea" => Ok(Mode::Sea),
            other => Err(AnalyticsError::InvariantViolation {
                field: "mode",
                rule: format!("unknown mode '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forward-only shipment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    Received,
    Intransit,
    Delivered,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Received => "received",
            ShipmentStatus::Intransit => "intransit",
            ShipmentStatus::Delivered => "delivered",
        }
    }
}

impl FromStr for ShipmentStatus {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(ShipmentStatus::Received),
            "intransit" => Ok(ShipmentStatus::Intransit),
            "delivered" => Ok(ShipmentStatus::Delivered),
            other => Err(AnalyticsError::InvariantViolation {
                field: "status",
                rule: format!("unknown status '{other}'"),
            }),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shipment row as it travels through the system: the shape parsed from
/// an upload, persisted in the store, and returned by the query layer.
///
/// Every field is optional because raw uploads may carry gaps; the record
/// validator enforces field bounds and cross-field rules, while genuinely
/// missing values are the missing-value handler's concern. Dates stay
/// `YYYY-MM-DD` strings end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRow {
    pub shipment_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub weight: Option<i64>,
    pub volume: Option<i64>,
    pub carrier: Option<String>,
    pub mode: Option<String>,
    pub status: Option<String>,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub delivered_date: Option<String>,
}

impl ShipmentRow {
    /// Map a storage row selected with [`projection`] back into the domain shape.
    pub(crate) fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(ShipmentRow {
            shipment_id: row.get(0)?,
            customer_id: row.get(1)?,
            origin: row.get(2)?,
            destination: row.get(3)?,
            weight: row.get(4)?,
            volume: row.get(5)?,
            carrier: row.get(6)?,
            mode: row.get(7)?,
            status: row.get(8)?,
            arrival_date: row.get(9)?,
            departure_date: row.get(10)?,
            delivered_date: row.get(11)?,
        })
    }
}

/// Column projection matching [`ShipmentRow::from_sql`]'s ordering.
pub(crate) fn projection() -> String {
    EXPECTED_COLUMNS.join(", ")
}
