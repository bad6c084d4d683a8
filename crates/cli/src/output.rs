//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use cuebridge::{
    BridgeError, Candidate, CandidateAttempt, DeviceDescriptor, KeyAction, LibraryInfo,
    SessionDetails,
};
use serde_json::{Value, json};

use crate::error::CliError;

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

fn bridge_error(error: &Error) -> Option<&BridgeError> {
    error.downcast_ref::<BridgeError>().or_else(|| {
        error.downcast_ref::<CliError>().and_then(|e| match e {
            CliError::Bridge(inner) => Some(inner),
            _ => None,
        })
    })
}

fn attempts_json(attempts: &[CandidateAttempt]) -> Vec<Value> {
    attempts
        .iter()
        .map(|a| json!({ "path": a.path, "reason": a.failure.to_string() }))
        .collect()
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let kind = error
        .downcast_ref::<CliError>()
        .map_or("error", CliError::kind);
    let attempts = bridge_error(error).map_or(&[][..], BridgeError::attempts);
    let body = if attempts.is_empty() {
        json!({ "message": error.to_string(), "type": kind })
    } else {
        json!({
            "message": error.to_string(),
            "type": kind,
            "attempts": attempts_json(attempts),
        })
    };
    print_json(&json!({ "success": false, "error": body }));
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    if let Some(bridge) = bridge_error(error) {
        for attempt in bridge.attempts() {
            eprintln!("  {} {}", "Tried:".yellow(), attempt);
        }
    }

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print the search order and the outcome of a probe.
pub fn print_probe(candidates: &[Candidate], info: &LibraryInfo, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "candidates": candidates,
            "loaded": {
                "path": info.path,
                "origin": info.origin,
                "index": info.candidate_index,
            },
            "attempts": attempts_json(&info.attempts),
        }));
        return;
    }

    print_candidates(candidates);
    for attempt in &info.attempts {
        println!("  {} {}", "✗".red(), attempt);
    }
    println!(
        "{} {} ({})",
        "Loaded:".green().bold(),
        info.path.display(),
        info.origin
    );
}

/// Print the candidate list.
pub fn print_candidates(candidates: &[Candidate]) {
    println!("{}", "Search order:".bold());
    for (index, candidate) in candidates.iter().enumerate() {
        println!(
            "  {:>2}. {} {}",
            index + 1,
            candidate.path.display(),
            format!("[{}]", candidate.origin).dimmed()
        );
    }
}

/// Print enumerated devices.
pub fn print_devices(devices: &[DeviceDescriptor], details: Option<&SessionDetails>, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "session": details,
            "devices": devices,
        }));
        return;
    }

    if let Some(details) = details {
        println!(
            "{} client {}, server {}, host {}",
            "iCUE:".bold(),
            details.client_version,
            details.server_version,
            details.server_host_version
        );
    }
    if devices.is_empty() {
        println!("{}", "No devices found".yellow());
        return;
    }
    println!("{}", "Devices:".bold());
    for device in devices {
        println!(
            "  {} {} ({})",
            "●".green(),
            device.model.bold(),
            device.id.dimmed()
        );
        println!(
            "    Type: {}  LEDs: {}  Channels: {}",
            device.device_type.label(),
            device.led_count,
            device.channel_count
        );
    }
}

/// Print one key action from the watch loop.
pub fn print_key_action(action: &KeyAction, json: bool) {
    if json {
        match serde_json::to_string(action) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format key action as JSON: {e}"),
        }
    } else if action.pressed {
        println!("{} {}", "▼".green(), action.key.bold());
    } else {
        println!("{} {}", "▲".dimmed(), action.key);
    }
}

/// Print the outcome of a color command.
pub fn print_applied(what: &str, device: &DeviceDescriptor, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "device": device.id,
            "applied": what,
        }));
    } else {
        println!("{} {} on {}", "✓".green(), what, device.model);
    }
}

/// Print the LED and macro key tables.
pub fn print_keys(leds: &[(&str, String)], macros: &[(&str, i32)], json: bool) {
    if json {
        let leds: Vec<Value> = leds
            .iter()
            .map(|(name, luid)| json!({ "name": name, "luid": luid }))
            .collect();
        let macros: Vec<Value> = macros
            .iter()
            .map(|(name, id)| json!({ "name": name, "keyId": id }))
            .collect();
        print_json(&json!({ "success": true, "leds": leds, "macroKeys": macros }));
        return;
    }

    println!("{}", "LED keys:".bold());
    for (name, luid) in leds {
        println!("  {name:<4} {}", luid.dimmed());
    }
    println!("{}", "Macro keys:".bold());
    for (name, id) in macros {
        println!("  {name:<4} {id}");
    }
}
