use anyhow::{ensure, Result};

use iris::config::IrisConfig;
use iris::decompose::Decomposer;
use iris::pipeline::{Pipeline, PipelineOptions, RunReport};
use iris::refine::extract::FallbackPolicy;
use iris::refine::{Critic, Refiner, StopReason};

/// Flags that override the config for a single `refine` invocation.
#[derive(Debug, Default)]
pub struct RefineArgs {
    pub max_passes: Option<u32>,
    pub stop_score: Option<u8>,
    pub no_memory: bool,
    pub decompose: bool,
    pub permissive: bool,
    pub json: bool,
}

/// Run the full pipeline for one prompt and print the outcome.
pub fn refine(config: &IrisConfig, prompt: &str, args: &RefineArgs) -> Result<()> {
    ensure!(!prompt.trim().is_empty(), "prompt must not be empty");

    let mut options = PipelineOptions::from_config(&config.refinement, &config.recall);
    if let Some(n) = args.max_passes {
        options.max_passes = n;
    }
    if let Some(s) = args.stop_score {
        ensure!((1..=10).contains(&s), "stop score must be between 1 and 10");
        options.stop_score = s;
    }
    if args.no_memory {
        options.recall_enabled = false;
    }
    if args.permissive {
        options.extraction = FallbackPolicy::Permissive;
    }

    let client = super::completion_client(config)?;
    let mut critic = Critic::new(client.clone());
    if let Some(ref template) = config.refinement.system_prompt {
        critic = critic.with_template(template.as_str());
    }

    let mut pipeline = Pipeline::new(super::memory_store(config)?, Refiner::new(critic), options);
    if args.decompose || config.refinement.decompose {
        pipeline = pipeline.with_decomposer(Decomposer::new(client));
    }

    let report = pipeline.run(prompt.trim())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let stop = match report.stop_reason {
        StopReason::AutoStop { pass } => format!("auto-stop at pass {pass}"),
        StopReason::Exhausted => "pass budget exhausted".to_string(),
    };
    let clarity = report
        .clarity
        .map(|c| format!("{c}/10"))
        .unwrap_or_else(|| "unrated".into());

    println!("Final prompt:\n{}\n", report.final_prompt);
    println!("Clarity:          {clarity}");
    println!("Passes:           {} ({stop})", report.passes);
    println!("Memory context:   {}", if report.memory_context_used { "used" } else { "not used" });
    println!("Saved as memory:  #{}", report.memory_id);
}
