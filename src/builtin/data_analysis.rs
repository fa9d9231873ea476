//! Statistical analysis skill for numerical data.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::skills::discovery::SkillFactoryRegistration;
use crate::skills::skill::{Skill, StaticSkill, StaticSkillBuilder};
use crate::tools::skill_tool::{SkillTool, ToolOutput};
use crate::utilities::errors::{BoxError, SkillError};

fn number_list(args: &Value, key: &str) -> Result<Vec<f64>, BoxError> {
    let values = args
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| BoxError::from(format!("'{}' must be an array of numbers", key)))?;
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        out.push(
            value
                .as_f64()
                .ok_or_else(|| BoxError::from(format!("'{}' must contain only numbers", key)))?,
        );
    }
    if out.is_empty() {
        return Err(format!("'{}' cannot be empty", key).into());
    }
    Ok(out)
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn median(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64
}

fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    let cov: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let denom = (x.iter().map(|a| (a - mx) * (a - mx)).sum::<f64>()
        * y.iter().map(|b| (b - my) * (b - my)).sum::<f64>())
    .sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}

fn calculate_statistics(args: Value) -> Result<ToolOutput, BoxError> {
    let data = number_list(&args, "data")?;
    let metrics = args
        .get("metrics")
        .and_then(|v| v.as_str())
        .unwrap_or("all");

    let requested: Vec<&str> = if metrics == "all" {
        vec!["mean", "median", "std", "var", "min", "max", "count"]
    } else {
        metrics.split(',').map(str::trim).collect()
    };

    let mut lines = vec!["Statistical Analysis Results:".to_string(), String::new()];
    for metric in requested {
        let line = match metric {
            "mean" => format!("- mean: {:.4}", mean(&data)),
            "median" => format!("- median: {:.4}", median(&data)),
            "std" => format!("- std: {:.4}", std_dev(&data)),
            "var" => format!("- variance: {:.4}", variance(&data)),
            "min" => format!(
                "- min: {:.4}",
                data.iter().cloned().fold(f64::INFINITY, f64::min)
            ),
            "max" => format!(
                "- max: {:.4}",
                data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            ),
            "count" => format!("- count: {}", data.len()),
            // Unknown metric names are skipped.
            _ => continue,
        };
        lines.push(line);
    }
    Ok(ToolOutput::text(lines.join("\n")))
}

fn analyze_correlation(args: Value) -> Result<ToolOutput, BoxError> {
    let x = number_list(&args, "data_x")?;
    let y = number_list(&args, "data_y")?;
    if x.len() != y.len() {
        return Err("datasets must have the same length".into());
    }

    let r = pearson(&x, &y);
    let strength = match r.abs() {
        v if v >= 0.9 => "Very Strong",
        v if v >= 0.7 => "Strong",
        v if v >= 0.5 => "Moderate",
        v if v >= 0.3 => "Weak",
        _ => "Very Weak",
    };
    let direction = if r > 0.0 { "Positive" } else { "Negative" };

    Ok(ToolOutput::text(format!(
        "Pearson correlation coefficient: {:.4}\nStrength: {}\nDirection: {}",
        r, strength, direction
    )))
}

fn builder() -> StaticSkillBuilder {
    StaticSkill::builder(
        "data_analysis",
        "Statistics and summaries for numerical data.",
    )
    .tag("data")
    .tag("statistics")
    .tag("analysis")
    .tool(SkillTool::operation(
        "calculate_statistics",
        "Calculate statistical metrics for numerical data.",
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "array",
                    "items": { "type": "number" },
                    "description": "Numerical values to analyze"
                },
                "metrics": {
                    "type": "string",
                    "description": "Comma-separated metrics (mean, median, std, var, min, max, count) or 'all'"
                }
            },
            "required": ["data"]
        }),
        Arc::new(calculate_statistics),
    ))
    .tool(SkillTool::operation(
        "analyze_correlation",
        "Analyze the Pearson correlation between two datasets.",
        json!({
            "type": "object",
            "properties": {
                "data_x": { "type": "array", "items": { "type": "number" } },
                "data_y": { "type": "array", "items": { "type": "number" } }
            },
            "required": ["data_x", "data_y"]
        }),
        Arc::new(analyze_correlation),
    ))
}

/// The skill, without a backing directory.
pub fn skill() -> Arc<dyn Skill> {
    builder().build_arc()
}

/// Factory entry point used by directory discovery.
pub fn factory(dir: &Path) -> Result<Box<dyn Skill>, SkillError> {
    Ok(Box::new(builder().skill_dir(dir).build()))
}

inventory::submit! {
    SkillFactoryRegistration {
        name: "data_analysis",
        factory,
    }
}
