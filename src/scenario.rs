use anyhow::{bail, Context, Result};
use rand::Rng;
use std::fs;

use crate::registry::{Position, Velocity};

/// One aircraft to inject at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioEntry {
    pub id: u32,
    pub position: Position,
    pub velocity: Velocity,
    /// Seconds in the airspace; 0 = stays until removed.
    pub lifetime: u64,
}

/// Load a traffic scenario file: one aircraft per line as
/// `id x y z vx vy vz lifetime`, with `#` comments and blank lines ignored.
pub fn load_scenario(path: &str) -> Result<Vec<ScenarioEntry>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read scenario: {}", path))?;
    parse_scenario(&contents).with_context(|| format!("Failed to parse scenario: {}", path))
}

pub fn parse_scenario(contents: &str) -> Result<Vec<ScenarioEntry>> {
    let mut entries = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 8 {
            bail!(
                "line {}: expected 8 fields (id x y z vx vy vz lifetime), got {}",
                lineno + 1,
                fields.len()
            );
        }
        let parse_f = |s: &str, what: &str| -> Result<f64> {
            s.parse()
                .with_context(|| format!("line {}: bad {}: {}", lineno + 1, what, s))
        };
        entries.push(ScenarioEntry {
            id: fields[0]
                .parse()
                .with_context(|| format!("line {}: bad id: {}", lineno + 1, fields[0]))?,
            position: Position::new(
                parse_f(fields[1], "x")?,
                parse_f(fields[2], "y")?,
                parse_f(fields[3], "z")?,
            ),
            velocity: Velocity::new(
                parse_f(fields[4], "vx")?,
                parse_f(fields[5], "vy")?,
                parse_f(fields[6], "vz")?,
            ),
            lifetime: fields[7]
                .parse()
                .with_context(|| format!("line {}: bad lifetime: {}", lineno + 1, fields[7]))?,
        });
    }
    Ok(entries)
}

/// Generate random demo traffic: aircraft scattered over a 100k x 100k
/// block between FL100 and FL300, cruising in arbitrary directions.
pub fn random_traffic(count: usize) -> Vec<ScenarioEntry> {
    let mut rng = rand::thread_rng();
    (1..=count)
        .map(|id| ScenarioEntry {
            id: id as u32,
            position: Position::new(
                rng.gen_range(0.0..100_000.0),
                rng.gen_range(0.0..100_000.0),
                rng.gen_range(10_000.0..30_000.0),
            ),
            velocity: Velocity::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-50.0..50.0),
            ),
            lifetime: rng.gen_range(60..600),
        })
        .collect()
}
