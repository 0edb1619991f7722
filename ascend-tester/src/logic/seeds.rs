use anyhow::{Context, Result, bail};
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_SPAN: u64 = 100_000;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Accepts literal integers (negative values use their magnitude) and
/// Rust-style ranges such as `1..5` or `1..=5`. An empty input falls back to
/// [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            pending.extend(expand_range(token, start, end)?);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(DEFAULT_SEED);
    }

    Ok(pending)
}

fn expand_range(token: &str, start: &str, end: &str) -> Result<Vec<u64>> {
    let (end, inclusive) = match end.strip_prefix('=') {
        Some(rest) => (rest, true),
        None => (end, false),
    };
    let start: u64 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start in {token}"))?;
    let end: u64 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid range end in {token}"))?;
    let end = if inclusive { end.saturating_add(1) } else { end };
    if end < start {
        bail!("Seed range {token} runs backwards");
    }
    if end - start > MAX_RANGE_SPAN {
        bail!("Seed range {token} spans more than {MAX_RANGE_SPAN} seeds");
    }
    Ok((start..end).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn defaults_when_empty() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(resolve_seed_inputs(&tokens(&[""])).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn parses_literals_and_dedups_in_order() {
        let seeds = resolve_seed_inputs(&tokens(&["7", "-3", "7", "18446744073709551615"])).unwrap();
        assert_eq!(seeds, vec![7, 3, u64::MAX]);
    }

    #[test]
    fn expands_ranges() {
        assert_eq!(resolve_seed_inputs(&tokens(&["1..4"])).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            resolve_seed_inputs(&tokens(&["2", "1..=3"])).unwrap(),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["5..2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..1000000"])).is_err());
    }
}
