//! Minimal CLI: compile one root, or check every root in a model.
use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::model::Model;
use crate::synth;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile a typed data-model description into a JSON Schema (draft-07) document
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile one root type and print (or write) the schema document
    Compile(CompileOut),
    /// compile every concrete declaration as a root and report failures
    Check(CheckSettings),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more model documents. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// name of the root type to compile
    #[arg(long)]
    root: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckSettings {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Compile(target) => {
                let model = crate::load::load_model(&target.input_settings.input)?;
                let text = synth::compile(&model, &target.root)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &text)?;
                } else {
                    println!("{text}");
                }
                Ok(())
            }
            Command::Check(target) => {
                let model = crate::load::load_model(&target.input_settings.input)?;
                run_check(&model)
            }
        }
    }
}

fn run_check(model: &Model) -> anyhow::Result<()> {
    let mut concrete = Vec::new();
    for decl in &model.types {
        if decl.params().is_empty() {
            concrete.push(decl.name().to_string());
        } else {
            println!("{} {} (generic)", "skip".yellow(), decl.name());
        }
    }

    // Each root compiles against a fresh registry; roots are independent.
    let results: Vec<(String, Result<(), crate::SchemaError>)> = concrete
        .into_par_iter()
        .map(|name| {
            let outcome = synth::compile(model, &name).map(drop);
            (name, outcome)
        })
        .collect();

    let mut failed = 0usize;
    for (name, outcome) in results {
        match outcome {
            Ok(()) => println!("{} {name}", "ok".green()),
            Err(err) => {
                failed += 1;
                println!("{} {name}: {err}", "error".red());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} root(s) failed to compile");
    }
    Ok(())
}
