// The DAC is driven through an amplifier stage whose output spans -4V to 8V,
// so code 0 corresponds to MIN_VOLTAGE and full scale to MAX_VOLTAGE.

pub const MIN_VOLTAGE: f64 = -4.0;
pub const MAX_VOLTAGE: f64 = 8.0;
pub const DAC_FULL_SCALE: u16 = u16::MAX;

/// Converts a voltage into the 16 bit code the DAC expects.
///
/// Out of range voltages are clamped first, and the scaled value is truncated
/// (not rounded), so `voltage_to_dac(2.0) == 32767`. A NaN input maps to 0.
#[inline]
pub fn voltage_to_dac(voltage: f64) -> u16 {
    let clamped = voltage.clamp(MIN_VOLTAGE, MAX_VOLTAGE);
    let scaled = (clamped - MIN_VOLTAGE) / (MAX_VOLTAGE - MIN_VOLTAGE);
    // Saturating float to int cast, scaled is already within [0, 1]
    (scaled * DAC_FULL_SCALE as f64) as u16
}
