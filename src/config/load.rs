use anyhow::{bail, Context, Result};
use std::fmt::Display;
use std::str::FromStr;

/// Fails with the full list of `keys` that are absent or blank.
pub(super) fn ensure_present(
    lookup: &impl Fn(&str) -> Option<String>,
    keys: &[&str],
) -> Result<()> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| optional(lookup, key).is_none())
        .collect();

    if !missing.is_empty() {
        bail!(
            "Missing required configuration: {}. Check your env file.",
            missing.join(", ")
        );
    }
    Ok(())
}

/// A required value, returned untrimmed.
pub(super) fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    optional(lookup, key).with_context(|| format!("`{key}` environment variable must be set"))
}

/// A value that counts as absent when blank.
pub(super) fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

pub(super) fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(lookup, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value `{raw}` for `{key}`: {e}")),
    }
}
