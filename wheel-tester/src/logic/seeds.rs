use anyhow::{Context, Result, bail};

pub const DEFAULT_SEED: u64 = 1337;

/// Cap on how many seeds one `start..end` range may expand to.
const MAX_RANGE_LEN: u64 = 10_000;

/// Resolve CLI seed arguments into a deduplicated list, keeping first-seen order.
///
/// Supports literal integers (negative values use their magnitude) and
/// half-open ranges such as `10..20`. An empty list falls back to [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    let mut push = |seed: u64| {
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    };

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            let start: u64 = start
                .trim()
                .parse()
                .with_context(|| format!("invalid range start in {token}"))?;
            let end: u64 = end
                .trim()
                .parse()
                .with_context(|| format!("invalid range end in {token}"))?;
            if end <= start {
                bail!("Empty seed range: {token}");
            }
            if end - start > MAX_RANGE_LEN {
                bail!("Seed range {token} is longer than {MAX_RANGE_LEN}");
            }
            (start..end).for_each(&mut push);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}
