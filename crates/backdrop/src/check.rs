use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use renderer::compile::{compile_stage, link_stages};
use renderer::shader::{FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};
use renderer::ShaderStage;
use serde::Serialize;
use tracing::info;

use crate::cli::CheckArgs;

#[derive(Debug, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub source: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub valid: bool,
    pub stages: Vec<StageReport>,
    /// `None` when a stage failed and linking was not attempted.
    pub linked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_log: Option<String>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let (vertex_label, vertex) = load_stage(args.vertex.as_deref(), VERTEX_SHADER_GLSL)?;
    let (fragment_label, fragment) =
        load_stage(args.fragment.as_deref(), FRAGMENT_SHADER_GLSL)?;
    let report = check_sources(
        (vertex_label.as_str(), vertex.as_str()),
        (fragment_label.as_str(), fragment.as_str()),
    );

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{text}");
    } else {
        print_report(&report);
    }

    if !report.valid {
        bail!("shader validation failed");
    }
    info!("shader sources validated");
    Ok(())
}

/// Returns the source label and text of one stage.
fn load_stage(path: Option<&Path>, bundled: &str) -> Result<(String, String)> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read shader {}", path.display()))?;
            Ok((path.display().to_string(), text))
        }
        None => Ok(("bundled".to_string(), bundled.to_string())),
    }
}

pub fn check_sources(vertex: (&str, &str), fragment: (&str, &str)) -> CheckReport {
    let compiled_vertex = compile_stage(ShaderStage::Vertex, vertex.1);
    let compiled_fragment = compile_stage(ShaderStage::Fragment, fragment.1);

    let stages = vec![
        stage_report(ShaderStage::Vertex, vertex.0, compiled_vertex.as_ref().err()),
        stage_report(ShaderStage::Fragment, fragment.0, compiled_fragment.as_ref().err()),
    ];

    let (linked, link_log) = match (&compiled_vertex, &compiled_fragment) {
        (Ok(vertex), Ok(fragment)) => match link_stages(vertex, fragment) {
            Ok(()) => (Some(true), None),
            Err(log) => (Some(false), Some(log)),
        },
        _ => (None, None),
    };

    CheckReport {
        valid: linked == Some(true),
        stages,
        linked,
        link_log,
    }
}

fn stage_report(stage: ShaderStage, source: &str, error: Option<&String>) -> StageReport {
    StageReport {
        stage: stage.to_string(),
        source: source.to_string(),
        ok: error.is_none(),
        log: error.cloned(),
    }
}

fn print_report(report: &CheckReport) {
    for stage in &report.stages {
        let status = if stage.ok { "ok" } else { "FAILED" };
        println!("{:<8} {:<6} {}", stage.stage, status, stage.source);
        if let Some(log) = &stage.log {
            for line in log.lines() {
                println!("    {line}");
            }
        }
    }
    match report.linked {
        Some(true) => println!("link     ok"),
        Some(false) => {
            println!("link     FAILED");
            if let Some(log) = &report.link_log {
                for line in log.lines() {
                    println!("    {line}");
                }
            }
        }
        None => println!("link     skipped"),
    }
}
