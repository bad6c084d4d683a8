//! Library discovery report

use cuebridge::Bridge;

use crate::commands::Context;
use crate::error::CliError;
use crate::output;

/// Show the search order and try to load the library.
pub fn execute(ctx: &Context) -> Result<(), CliError> {
    let bridge = Bridge::new(ctx.bridge_config()?)?;
    let candidates = bridge.candidates();

    match bridge.load_library() {
        Ok(info) => {
            output::print_probe(&candidates, &info, ctx.json);
            bridge.shutdown();
            Ok(())
        }
        Err(e) => {
            if !ctx.json {
                output::print_candidates(&candidates);
            }
            Err(e.into())
        }
    }
}
