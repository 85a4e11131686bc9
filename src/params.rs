//! Parameter-sweep analysis: how sampling settings relate to pass rate.
//!
//! Works on raw results documents, where each response may carry the
//! configuration label and sampling parameters it was generated with.

use serde::{Deserialize, Serialize};

use crate::persistence::{ModelParams, ResultsResponse, ResultsTask};

/// Label for responses that carry no configuration name.
pub const UNNAMED_CONFIG: &str = "unnamed";

pub const PARAMETERS: [&str; 4] = ["temperature", "top_p", "top_k", "num_predict"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPerformance {
    pub config_name: String,
    pub success_rate: f64,
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub avg_code_length: f64,
    /// Parameters of the first response seen with this configuration.
    pub parameters: ModelParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamCorrelation {
    pub param: String,
    /// Pearson coefficient against pass (1) / no pass (0). `None` when
    /// fewer than two responses carry the parameter or either side is
    /// constant.
    pub coefficient: Option<f64>,
}

impl ParamCorrelation {
    pub fn strength(&self) -> &'static str {
        match self.coefficient.map(f64::abs) {
            Some(c) if c > 0.3 => "strong",
            Some(c) if c > 0.1 => "moderate",
            Some(_) => "weak",
            None => "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterImpact {
    pub total_tasks: usize,
    pub total_responses: usize,
    pub overall_success_rate: f64,
    /// In order of first appearance.
    pub configurations: Vec<ConfigPerformance>,
    pub correlations: Vec<ParamCorrelation>,
}

impl ParameterImpact {
    pub fn configurations_tested(&self) -> usize {
        self.configurations.len()
    }

    /// Highest success rate; earliest configuration on ties.
    pub fn best(&self) -> Option<&ConfigPerformance> {
        self.configurations
            .iter()
            .fold(None, |best: Option<&ConfigPerformance>, c| match best {
                Some(b) if b.success_rate >= c.success_rate => Some(b),
                _ => Some(c),
            })
    }

    /// Lowest success rate; earliest configuration on ties.
    pub fn worst(&self) -> Option<&ConfigPerformance> {
        self.configurations
            .iter()
            .fold(None, |worst: Option<&ConfigPerformance>, c| match worst {
                Some(w) if w.success_rate <= c.success_rate => Some(w),
                _ => Some(c),
            })
    }

    /// Parameter with the largest absolute coefficient.
    pub fn strongest(&self) -> Option<&ParamCorrelation> {
        self.correlations
            .iter()
            .filter(|c| c.coefficient.is_some())
            .fold(None, |top: Option<&ParamCorrelation>, c| match top {
                Some(t) if abs_coef(t) >= abs_coef(c) => Some(t),
                _ => Some(c),
            })
    }
}

fn abs_coef(c: &ParamCorrelation) -> f64 {
    c.coefficient.map(f64::abs).unwrap_or(0.0)
}

struct ConfigAcc {
    name: String,
    attempts: usize,
    passed: usize,
    code_chars: usize,
    parameters: ModelParams,
}

pub fn parameter_impact(tasks: &[ResultsTask]) -> ParameterImpact {
    let responses: Vec<&ResultsResponse> = tasks.iter().flat_map(|t| &t.responses).collect();

    let mut configs: Vec<ConfigAcc> = Vec::new();
    for r in &responses {
        let name = r.config_name.as_deref().unwrap_or(UNNAMED_CONFIG);
        let idx = match configs.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                configs.push(ConfigAcc {
                    name: name.to_string(),
                    attempts: 0,
                    passed: 0,
                    code_chars: 0,
                    parameters: r.model_params.clone().unwrap_or_default(),
                });
                configs.len() - 1
            }
        };

        let acc = &mut configs[idx];
        acc.attempts += 1;
        acc.code_chars += r.code.chars().count();
        if r.test_result.is_passed() {
            acc.passed += 1;
        }
    }

    let passed_total = responses.iter().filter(|r| r.test_result.is_passed()).count();

    let configurations = configs
        .into_iter()
        .map(|c| ConfigPerformance {
            success_rate: ratio(c.passed as f64, c.attempts),
            avg_code_length: ratio(c.code_chars as f64, c.attempts),
            total_attempts: c.attempts,
            successful_attempts: c.passed,
            parameters: c.parameters,
            config_name: c.name,
        })
        .collect();

    let correlations = PARAMETERS
        .iter()
        .map(|&param| {
            let (xs, ys): (Vec<f64>, Vec<f64>) = responses
                .iter()
                .filter_map(|r| {
                    let value = param_value(r.model_params.as_ref()?, param)?;
                    let pass = if r.test_result.is_passed() { 1.0 } else { 0.0 };
                    Some((value, pass))
                })
                .unzip();
            ParamCorrelation {
                param: param.to_string(),
                coefficient: pearson(&xs, &ys),
            }
        })
        .collect();

    tracing::debug!(
        tasks = tasks.len(),
        responses = responses.len(),
        "parameter impact computed"
    );

    ParameterImpact {
        total_tasks: tasks.len(),
        total_responses: responses.len(),
        overall_success_rate: ratio(passed_total as f64, responses.len()),
        configurations,
        correlations,
    }
}

fn param_value(params: &ModelParams, name: &str) -> Option<f64> {
    match name {
        "temperature" => params.temperature,
        "top_p" => params.top_p,
        "top_k" => params.top_k.map(f64::from),
        "num_predict" => params.num_predict.map(|n| n as f64),
        _ => None,
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

fn ratio(num: f64, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num / den as f64
    }
}
