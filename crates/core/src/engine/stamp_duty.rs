use serde::{Deserialize, Serialize};

use crate::engine::money::{format_gbp, round_currency};
use crate::errors::CalcError;

/// One marginal-rate band. `upper_threshold` is `None` for the unbounded
/// top band. Thresholds within a table are strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StampDutyBand {
    pub upper_threshold: Option<f64>,
    pub rate: f64,
}

/// SDLT bands for England and Northern Ireland, 2024/25.
pub const STANDARD_BANDS: [StampDutyBand; 4] = [
    StampDutyBand { upper_threshold: Some(250_000.0), rate: 0.0 },
    StampDutyBand { upper_threshold: Some(925_000.0), rate: 0.05 },
    StampDutyBand { upper_threshold: Some(1_500_000.0), rate: 0.10 },
    StampDutyBand { upper_threshold: None, rate: 0.12 },
];

pub const FIRST_TIME_BUYER_BANDS: [StampDutyBand; 2] = [
    StampDutyBand { upper_threshold: Some(425_000.0), rate: 0.0 },
    StampDutyBand { upper_threshold: Some(625_000.0), rate: 0.05 },
];

/// Relief is withdrawn entirely above this value: a first-time buyer at
/// £625,001 pays standard rates on the whole price. The boundary itself is
/// inclusive.
pub const FIRST_TIME_BUYER_CAP: f64 = 625_000.0;

/// Flat surcharge on the full purchase price for buyers who already own
/// property. Applied on top of the banded tax, not instead of it.
pub const ADDITIONAL_PROPERTY_SURCHARGE: f64 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct StampDutyQuery {
    pub property_value: f64,
    #[serde(default)]
    pub is_first_time_buyer: bool,
    #[serde(default)]
    pub is_additional_property: bool,
}

/// One breakdown line. `band` and `rate` are presentation strings owned by
/// this layer, e.g. `"£250,000 - £925,000"` and `"5%"`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BandBreakdown {
    pub band: String,
    pub rate: String,
    pub tax: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StampDutyResult {
    pub stamp_duty: f64,
    pub effective_rate: f64,
    pub surcharge: f64,
    pub breakdown: Vec<BandBreakdown>,
}

/// UK Stamp Duty Land Tax for a purchase.
///
/// Walks the applicable band table in order, taxing the slice of the price
/// that falls in each band at that band's marginal rate. Only bands that
/// actually collect tax appear in the breakdown.
pub fn compute_stamp_duty(query: &StampDutyQuery) -> Result<StampDutyResult, CalcError> {
    if !query.property_value.is_finite() || query.property_value <= 0.0 {
        return Err(CalcError::invalid("property_value", "Property value must be positive"));
    }

    let bands: &[StampDutyBand] =
        if query.is_first_time_buyer && query.property_value <= FIRST_TIME_BUYER_CAP {
            &FIRST_TIME_BUYER_BANDS
        } else {
            &STANDARD_BANDS
        };

    let mut banded_tax = 0.0;
    let mut remaining = query.property_value;
    let mut previous_threshold = 0.0;
    let mut breakdown = Vec::new();

    for band in bands {
        if remaining <= 0.0 {
            break;
        }
        let band_size = band.upper_threshold.map_or(f64::INFINITY, |t| t - previous_threshold);
        let taxable = remaining.min(band_size);
        let tax_for_band = taxable * band.rate;
        banded_tax += tax_for_band;

        if tax_for_band > 0.0 {
            breakdown.push(BandBreakdown {
                band: band_label(previous_threshold, band.upper_threshold),
                rate: rate_label(band.rate),
                tax: round_currency(tax_for_band),
            });
        }

        remaining -= taxable;
        if let Some(threshold) = band.upper_threshold {
            previous_threshold = threshold;
        }
    }

    let surcharge = if query.is_additional_property {
        query.property_value * ADDITIONAL_PROPERTY_SURCHARGE
    } else {
        0.0
    };
    let stamp_duty = banded_tax + surcharge;
    let effective_rate = stamp_duty / query.property_value * 100.0;

    Ok(StampDutyResult {
        stamp_duty: round_currency(stamp_duty),
        effective_rate: round_currency(effective_rate),
        surcharge: round_currency(surcharge),
        breakdown,
    })
}

fn band_label(low: f64, high: Option<f64>) -> String {
    match high {
        Some(high) => format!("{} - {}", format_gbp(low), format_gbp(high)),
        None => format!("over {}", format_gbp(low)),
    }
}

fn rate_label(rate: f64) -> String {
    format!("{}%", (rate * 100.0).round_ties_even())
}
