//! Predicate diversifier for differential testing
//!
//! Produces structurally mutated variants of predicate strings: purely a
//! generator of additional comparison inputs, with no contract back into
//! the core. Mutations are textual, one randomly chosen strategy per row.

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Apply one randomly chosen mutation strategy.
pub fn diversify(predicate: &str, rng: &mut impl Rng) -> String {
    match rng.gen_range(0..5) {
        0 => swap_connectives(predicate),
        1 => negate_comparison(predicate),
        2 => add_clause(predicate, rng),
        3 => keep_first_operand(predicate),
        _ => append_tautology(predicate, rng),
    }
}

fn swap_connectives(predicate: &str) -> String {
    if predicate.contains("&&") {
        predicate.replace("&&", "||")
    } else if predicate.contains("||") {
        predicate.replace("||", "&&")
    } else {
        predicate.to_string()
    }
}

/// Flip the first comparison family found; multi-char operators checked
/// before their single-char prefixes
fn negate_comparison(predicate: &str) -> String {
    for (from, to) in [("==", "!="), ("!=", "=="), ("<=", ">"), (">=", "<"), ("<", ">="), (">", "<=")]
    {
        if predicate.contains(from) {
            return predicate.replace(from, to);
        }
    }
    format!("!({predicate})")
}

fn add_clause(predicate: &str, rng: &mut impl Rng) -> String {
    let clauses = [
        format!("({predicate}) || (a < b)"),
        format!("({predicate}) && (a > b)"),
        format!("({predicate}) || (msg.value > 0)"),
        format!("({predicate}) && (msg.value == 0)"),
    ];
    clauses[rng.gen_range(0..clauses.len())].clone()
}

fn keep_first_operand(predicate: &str) -> String {
    if predicate.contains("&&") || predicate.contains("||") {
        let first = predicate.split("&&").next().unwrap_or(predicate).trim();
        return first.split("||").next().unwrap_or(first).trim().to_string();
    }
    predicate.to_string()
}

fn append_tautology(predicate: &str, rng: &mut impl Rng) -> String {
    let variants = [
        format!("({predicate}) && (true)"),
        format!("({predicate}) || (false)"),
        format!("({predicate}) && (msg.sender != address(0))"),
        format!("({predicate}) || (block.number > 0)"),
    ];
    variants[rng.gen_range(0..variants.len())].clone()
}

/// Read `input`, append a `diversified_predicate` column, write `output`.
/// Returns the number of rows processed.
pub fn run(input: &Path, output: &Path, seed: Option<u64>) -> Result<usize> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("opening {}", input.display()))?;
    let headers = reader.headers().context("reading CSV header")?.clone();
    let predicate_index = headers
        .iter()
        .position(|h| h == "predicate")
        .ok_or_else(|| anyhow!("{} has no `predicate` column", input.display()))?;

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("creating {}", output.display()))?;
    let mut out_headers = headers.clone();
    out_headers.push_field("diversified_predicate");
    writer.write_record(&out_headers)?;

    let mut rows = 0;
    for record in reader.records() {
        let record = record.with_context(|| format!("reading row {}", rows + 2))?;
        let predicate = record
            .get(predicate_index)
            .ok_or_else(|| anyhow!("row {} is missing the predicate field", rows + 2))?;
        let mut out = record.clone();
        out.push_field(&diversify(predicate, &mut rng));
        writer.write_record(&out)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}
