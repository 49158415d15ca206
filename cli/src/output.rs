//! Result rendering for the terminal.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::Serialize;

use calcx_calc::Calculation;
use calcx_fx::{ConversionResult, RateSnapshot, ReferenceRate};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render a conversion.
pub fn conversion(result: &ConversionResult, json: bool) -> anyhow::Result<String> {
    if json {
        return to_json(result);
    }

    Ok(format!(
        "{} {} = {:.4} {}\nRates as of {}",
        result.source_amount,
        result.source,
        result.target_amount,
        result.target,
        result.as_of.format(TIMESTAMP_FORMAT)
    ))
}

/// Render the reference rate table.
pub fn reference_rates(snapshot: &RateSnapshot, json: bool) -> anyhow::Result<String> {
    if json {
        return to_json(snapshot);
    }

    let mut out = String::new();
    for row in ReferenceRate::table(snapshot) {
        if row.currency.is_base() {
            writeln!(out, "{:<4} 1", row.currency)?;
        } else {
            writeln!(out, "{:<4} {:.4}", row.currency, row.rate_to_base)?;
        }
    }
    write!(
        out,
        "Updated {}",
        snapshot.retrieved_at().format(TIMESTAMP_FORMAT)
    )?;
    Ok(out)
}

/// Render a tax or retention result.
pub fn calculation<C>(label: &str, result: &C, json: bool) -> anyhow::Result<String>
where
    C: Calculation + Serialize,
{
    if json {
        return to_json(result);
    }

    let percent = (result.rate() * Decimal::ONE_HUNDRED).normalize();
    Ok(format!(
        "Gross: {:.2}\nNet: {:.2}\n{} ({}%): {:.2}",
        result.gross_amount(),
        result.net_amount(),
        label,
        percent,
        result.deduction_amount()
    ))
}
