use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Read `name` from the environment and parse it.
///
/// Unset or blank variables yield `Ok(None)`; a value that does not parse is
/// an error naming the variable.
pub fn parse_env<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} environment variable: {e}")),
        _ => Ok(None),
    }
}

/// Read a non-blank string variable.
pub fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
