//! LED color commands

use cuebridge::{BridgeError, Rgb};
use cuebridge_abi::{LedLuid, led_key};

use crate::commands::{Context, open_keyboard};
use crate::error::CliError;
use crate::output;

/// Resolve a key name (`G1`, `Esc`) or a numeric LUID (`0x00010001`, `65537`).
pub fn parse_led(key: &str) -> Result<LedLuid, CliError> {
    if let Some(luid) = led_key(key) {
        return Ok(luid);
    }
    let parsed = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => key.parse::<u32>().ok(),
    };
    parsed
        .map(LedLuid)
        .ok_or_else(|| BridgeError::UnknownKey(key.to_string()).into())
}

/// Set one LED on the first keyboard.
pub fn set(
    ctx: &Context,
    key: &str,
    color: Rgb,
    exclusive: bool,
    timeout_ms: u64,
) -> Result<(), CliError> {
    let luid = parse_led(key)?;
    let bridge = ctx.loaded_bridge()?;
    let keyboard = open_keyboard(&bridge, exclusive, timeout_ms)?;

    if !bridge.set_key_color(&keyboard.device().id, luid, color)? {
        return Err(CliError::CommandFailed(format!(
            "iCUE rejected the color for {key}"
        )));
    }
    let what = format!("{key} = #{:02x}{:02x}{:02x}", color.r, color.g, color.b);
    output::print_applied(&what, keyboard.device(), ctx.json);
    keyboard.disconnect();
    Ok(())
}

/// Turn one LED, or every G-key, off.
pub fn off(
    ctx: &Context,
    key: Option<&str>,
    exclusive: bool,
    timeout_ms: u64,
) -> Result<(), CliError> {
    let luid = key.map(parse_led).transpose()?;
    let bridge = ctx.loaded_bridge()?;
    let keyboard = open_keyboard(&bridge, exclusive, timeout_ms)?;

    let applied = match luid {
        Some(luid) => bridge.set_key_color(&keyboard.device().id, luid, Rgb::BLACK)?,
        None => keyboard.turn_off_all_keys()?,
    };
    if !applied {
        return Err(CliError::CommandFailed("iCUE rejected the update".to_string()));
    }
    let what = key.map_or_else(|| "G1-G12 off".to_string(), |k| format!("{k} off"));
    output::print_applied(&what, keyboard.device(), ctx.json);
    keyboard.disconnect();
    Ok(())
}
