//! CalcX Calculation Engines
//!
//! Pure, synchronous gross/net calculators:
//!
//! - [`TaxCalculator`]: value added tax on an order (19% by default)
//! - [`RetentionCalculator`]: withholding on professional fees (14.5% by default)
//!
//! Amounts are rounded half away from zero to two fractional digits and the
//! deduction is always `gross - net`.

pub mod calculator;
pub mod error;
pub mod mode;
pub mod retention;
pub mod tax;

pub use calculator::{Calculation, Calculator};
pub use error::{CalcError, CalcResult};
pub use mode::InputMode;
pub use retention::{HonorariumCalculation, RetentionCalculator};
pub use tax::{OrderCalculation, TaxCalculator};
