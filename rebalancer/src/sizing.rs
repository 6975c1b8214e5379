//! Position sizing: how many shares each target slot gets.
//!
//! Equity is in cents, leverage in basis points and prices in micro-dollars.
//! `cents × bps` is exactly the slot budget in micro-dollars, so
//! `floor(equity × leverage / slots / price)` is computed without rounding
//! anything but the final share count.

use signal_broker::Price;

/// Capital allotted to one slot, `equity × leverage / slots`, in micro-dollars.
///
/// Returns 0 for non-positive equity or zero slots.
pub fn slot_allocation_micros(equity_cents: i64, leverage_bps: u32, slots_per_side: u32) -> i128 {
    if equity_cents <= 0 || slots_per_side == 0 {
        return 0;
    }
    equity_cents as i128 * leverage_bps as i128 / slots_per_side as i128
}

/// Slot allocation rounded down to whole cents, for reporting.
pub fn slot_allocation_cents(equity_cents: i64, leverage_bps: u32, slots_per_side: u32) -> i64 {
    let micros = slot_allocation_micros(equity_cents, leverage_bps, slots_per_side);
    (micros / Price::MICROS_PER_CENT as i128).min(i64::MAX as i128) as i64
}

/// Whole shares purchasable for one slot at `price`.
///
/// Returns 0 for non-positive equity or price. Never negative.
pub fn target_quantity(
    equity_cents: i64,
    leverage_bps: u32,
    slots_per_side: u32,
    price: Price,
) -> u64 {
    if price.micros() <= 0 {
        return 0;
    }
    let alloc = slot_allocation_micros(equity_cents, leverage_bps, slots_per_side);
    (alloc / price.micros() as i128).min(u64::MAX as i128) as u64
}
