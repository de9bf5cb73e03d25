use crate::error::DeployError;

/// Decimals of a SOL amount
pub const SOL_DECIMALS: u32 = 9;

/// Converts a decimal string into base units, like `parseEther` does for
/// 18 decimals. The conversion is exact: extra fractional digits are rejected.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u64, DeployError> {
    let invalid = || DeployError::InvalidAmount(amount.to_string());
    let trimmed = amount.trim();

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > decimals as usize {
        return Err(invalid());
    }

    let scale = 10u64.checked_pow(decimals).ok_or_else(invalid)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| invalid())?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padding = 10u64.pow(decimals - fraction.len() as u32);
        fraction.parse::<u64>().map_err(|_| invalid())? * padding
    };

    whole_units
        .checked_mul(scale)
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or_else(invalid)
}

/// Parses a SOL amount into lamports
pub fn parse_sol(amount: &str) -> Result<u64, DeployError> {
    parse_units(amount, SOL_DECIMALS)
}
