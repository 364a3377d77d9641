// SPDX-License-Identifier: MIT

//! Shared helpers for the `M'SS"/km` pace encoding.
//!
//! Paces are stored and exchanged as strings like `5'30"/km`. For any
//! comparison or arithmetic they are converted to decimal minutes per
//! kilometre; a lower value means a faster pace.

/// Parse a `M'SS"/km` pace string into decimal minutes per kilometre.
///
/// Returns `None` for anything that does not match the encoding.
pub fn parse_min_per_km(pace: &str) -> Option<f64> {
    let rest = pace.trim().strip_suffix("/km").unwrap_or(pace.trim());
    let (minutes, rest) = rest.split_once('\'')?;
    let seconds = rest.strip_suffix('"')?;

    let minutes: f64 = minutes.trim().parse().ok()?;
    let seconds: f64 = seconds.trim().parse().ok()?;
    if minutes < 0.0 || seconds < 0.0 {
        return None;
    }

    Some(minutes + seconds / 60.0)
}

/// Format decimal minutes per kilometre as `M'SS"/km`.
pub fn format_min_per_km(pace: f64) -> String {
    if !pace.is_finite() || pace <= 0.0 {
        return "0'00\"/km".to_string();
    }

    let minutes = pace as u32;
    let seconds = ((pace - minutes as f64) * 60.0) as u32;
    format!("{}'{:02}\"/km", minutes, seconds)
}

/// True if `pace` is at least as fast as `threshold` (numerically not
/// slower). Unparseable paces never match a threshold.
pub fn at_least_as_fast(pace: &str, threshold: &str) -> bool {
    match (parse_min_per_km(pace), parse_min_per_km(threshold)) {
        (Some(p), Some(t)) => p <= t,
        _ => false,
    }
}
