//! Key tables

use cuebridge_abi::{LED_KEYS, MACRO_KEYS};

use crate::commands::Context;
use crate::error::CliError;
use crate::output;

/// Print the named LEDs and macro keys. Needs no SDK.
pub fn execute(ctx: &Context) -> Result<(), CliError> {
    let leds: Vec<(&str, String)> = LED_KEYS
        .iter()
        .map(|(name, luid)| (*name, luid.to_string()))
        .collect();
    output::print_keys(&leds, &MACRO_KEYS, ctx.json);
    Ok(())
}
