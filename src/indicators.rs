//! Technical indicators over close-price series.
//!
//! Pure functions: no state, `None` whenever the series is too short to
//! produce a value.

use rust_decimal::Decimal;

/// Simple moving average of the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values[values.len() - period..].iter().sum();
    Some(sum / Decimal::from(period as u64))
}

/// Classic RSI over the last `period` consecutive differences.
///
/// Requires `values.len() > period`. A fully flat window (zero gains and
/// zero losses) is neutral and returns 50; gains with zero losses return 100.
pub fn rsi(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() <= period {
        return None;
    }

    let mut gain_sum = Decimal::ZERO;
    let mut loss_sum = Decimal::ZERO;
    for i in values.len() - period..values.len() {
        let diff = values[i] - values[i - 1];
        if diff > Decimal::ZERO {
            gain_sum += diff;
        } else if diff < Decimal::ZERO {
            loss_sum -= diff;
        }
    }

    if gain_sum.is_zero() && loss_sum.is_zero() {
        return Some(Decimal::from(50));
    }
    if loss_sum.is_zero() {
        return Some(Decimal::from(100));
    }

    let period_dec = Decimal::from(period as u64);
    let avg_gain = gain_sum / period_dec;
    let avg_loss = loss_sum / period_dec;
    let rs = avg_gain / avg_loss;
    Some(Decimal::from(100) - Decimal::from(100) / (Decimal::ONE + rs))
}

/// Mean absolute fractional move per candle over the last `window` pairs
/// (or all pairs when the series is shorter), used as a volatility proxy.
///
/// Pairs whose prior close is zero or negative are skipped; `None` when no
/// valid pair exists.
pub fn average_abs_return(values: &[Decimal], window: usize) -> Option<Decimal> {
    if window == 0 || values.len() < 2 {
        return None;
    }

    let pairs = window.min(values.len() - 1);
    let mut sum = Decimal::ZERO;
    let mut count: u64 = 0;
    for i in values.len() - pairs..values.len() {
        let prev = values[i - 1];
        if prev <= Decimal::ZERO {
            continue;
        }
        sum += ((values[i] - prev) / prev).abs();
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(sum / Decimal::from(count))
}
