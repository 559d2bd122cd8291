use anyhow::{anyhow, Context, Result};
use clap::builder::{
    styling::{AnsiColor, Effects},
    Styles,
};
use std::time::Duration;

/// Parse time limit string into Duration.
///
/// Supported formats:
/// - `"HH:MM:SS"` — hours:minutes:seconds
/// - `"MM:SS"` — minutes:seconds
/// - `"MM"` — minutes
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use slaunch::utils::parse_time_limit;
///
/// assert_eq!(parse_time_limit("30").unwrap(), Duration::from_secs(1800));
/// assert_eq!(parse_time_limit("30:45").unwrap(), Duration::from_secs(1845));
/// assert_eq!(parse_time_limit("48:00:00").unwrap(), Duration::from_secs(172800));
/// ```
pub fn parse_time_limit(time_str: &str) -> Result<Duration> {
    let parts: Vec<&str> = time_str.split(':').collect();

    match parts.len() {
        1 => {
            // Minutes as a single number
            let val = time_str
                .parse::<u64>()
                .context("Invalid time format. Expected number of minutes")?;
            Ok(Duration::from_secs(val * 60))
        }
        2 => {
            // MM:SS
            let minutes = parts[0]
                .parse::<u64>()
                .context("Invalid minutes in MM:SS format")?;
            let seconds = parts[1]
                .parse::<u64>()
                .context("Invalid seconds in MM:SS format")?;
            Ok(Duration::from_secs(minutes * 60 + seconds))
        }
        3 => {
            // HH:MM:SS
            let hours = parts[0]
                .parse::<u64>()
                .context("Invalid hours in HH:MM:SS format")?;
            let minutes = parts[1]
                .parse::<u64>()
                .context("Invalid minutes in HH:MM:SS format")?;
            let seconds = parts[2]
                .parse::<u64>()
                .context("Invalid seconds in HH:MM:SS format")?;
            Ok(Duration::from_secs(hours * 3600 + minutes * 60 + seconds))
        }
        _ => Err(anyhow!(
            "Invalid time format. Expected formats: HH:MM:SS, MM:SS, or MM"
        )),
    }
}

/// Format a duration the way the scheduler's `--time` directive expects,
/// `HH:MM:SS` with hours allowed past 24.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use slaunch::utils::format_slurm_time;
///
/// assert_eq!(format_slurm_time(Duration::from_secs(45)), "00:00:45");
/// assert_eq!(format_slurm_time(Duration::from_secs(9045)), "02:30:45");
/// assert_eq!(format_slurm_time(Duration::from_secs(172800)), "48:00:00");
/// ```
pub fn format_slurm_time(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse memory limit string into megabytes.
///
/// Supported formats:
/// - `"100G"` or `"100g"` — gigabytes (converted to MB)
/// - `"1024M"` or `"1024m"` — megabytes
/// - `"100"` — megabytes (default unit)
///
/// # Examples
///
/// ```
/// use slaunch::utils::parse_memory_limit;
///
/// assert_eq!(parse_memory_limit("100").unwrap(), 100);
/// assert_eq!(parse_memory_limit("1024M").unwrap(), 1024);
/// assert_eq!(parse_memory_limit("64G").unwrap(), 65536);
/// ```
pub fn parse_memory_limit(memory_str: &str) -> Result<u64> {
    let memory_str = memory_str.trim();

    if memory_str.is_empty() {
        return Err(anyhow!("Memory limit cannot be empty"));
    }

    // Check if ends with 'G' or 'g' (gigabytes)
    if memory_str.ends_with('G') || memory_str.ends_with('g') {
        let value = memory_str[..memory_str.len() - 1]
            .trim()
            .parse::<u64>()
            .context("Invalid memory value in GB format")?;
        Ok(value * 1024) // Convert GB to MB
    }
    // Check if ends with 'M' or 'm' (megabytes)
    else if memory_str.ends_with('M') || memory_str.ends_with('m') {
        let value = memory_str[..memory_str.len() - 1]
            .trim()
            .parse::<u64>()
            .context("Invalid memory value in MB format")?;
        Ok(value)
    }
    // Otherwise, treat as megabytes
    else {
        memory_str
            .parse::<u64>()
            .context("Invalid memory format. Expected formats: 100G, 1024M, or 100 (MB)")
    }
}

/// Format memory in MB for the `--mem` directive (e.g. `"64G"`, `"512M"`).
///
/// # Examples
///
/// ```
/// use slaunch::utils::format_memory;
///
/// assert_eq!(format_memory(100), "100M");
/// assert_eq!(format_memory(1024), "1G");
/// assert_eq!(format_memory(65536), "64G");
/// ```
pub fn format_memory(memory_mb: u64) -> String {
    if memory_mb >= 1024 && memory_mb % 1024 == 0 {
        format!("{}G", memory_mb / 1024)
    } else {
        format!("{}M", memory_mb)
    }
}

pub const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_limit_minutes() {
        assert_eq!(parse_time_limit("90").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_parse_time_limit_invalid() {
        assert!(parse_time_limit("abc").is_err());
        assert!(parse_time_limit("1:2:3:4").is_err());
        assert!(parse_time_limit("").is_err());
    }

    #[test]
    fn test_time_roundtrip() {
        let limit = parse_time_limit("48:00:00").unwrap();
        assert_eq!(format_slurm_time(limit), "48:00:00");
    }

    #[test]
    fn test_parse_memory_limit_units() {
        assert_eq!(parse_memory_limit("2G").unwrap(), 2048);
        assert_eq!(parse_memory_limit("2g").unwrap(), 2048);
        assert_eq!(parse_memory_limit("512M").unwrap(), 512);
        assert_eq!(parse_memory_limit("512").unwrap(), 512);
    }

    #[test]
    fn test_parse_memory_limit_invalid() {
        assert!(parse_memory_limit("").is_err());
        assert!(parse_memory_limit("G").is_err());
        assert!(parse_memory_limit("12K").is_err());
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(1536), "1536M");
        assert_eq!(format_memory(2048), "2G");
    }
}
