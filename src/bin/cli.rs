use anyhow::{anyhow, bail, Context, Result};
use crabhdr::config::CrabHdrConfig;
use crabhdr::fusion::{fuse_with, FusionOptions};
use crabhdr::storage::{load_frame, save_frame};
use crabhdr::{bracket, ExposureRange, ExposureStep};
use std::env;
use std::time::Instant;

fn main() -> Result<()> {
    crabhdr::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabhdr-cli <plan|fuse|config> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "plan" => cmd_plan(&args),
        "fuse" => cmd_fuse(&args),
        "config" => cmd_config(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_plan(args: &[String]) -> Result<()> {
    // plan <shots> <ev_spacing> <lower> <upper> <ev_per_index> [--json]
    let positional: Vec<&String> = args[2..].iter().filter(|a| !a.starts_with("--")).collect();
    if positional.len() < 5 {
        eprintln!("Usage: crabhdr-cli plan <shots> <ev_spacing> <lower> <upper> <ev_per_index> [--json]");
        std::process::exit(1);
    }

    let shots: u32 = positional[0].parse().context("shots must be an integer")?;
    let ev_spacing: f32 = positional[1].parse().context("ev_spacing must be a number")?;
    let lower: i32 = positional[2].parse().context("lower must be an integer")?;
    let upper: i32 = positional[3].parse().context("upper must be an integer")?;
    let step: f32 = positional[4].parse().context("ev_per_index must be a number")?;

    let range = ExposureRange::new(lower, upper);
    let step = ExposureStep::new(step)?;
    let plan = bracket::plan(shots, ev_spacing, range, step);

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&plan)?);
    } else {
        for (index, ev) in plan.indices().iter().zip(plan.ev_offsets(step)) {
            println!("{:>4}  {:+.2} EV", index, ev);
        }
        if plan.has_duplicates() {
            eprintln!("warning: plan repeats exposure indices");
        }
    }
    Ok(())
}

fn cmd_fuse(args: &[String]) -> Result<()> {
    // fuse <output> <input>... [--quality <n>] [--strategy <s>] [--filter <f>] [--allow-single] [--json]
    let mut output = None;
    let mut inputs = Vec::new();
    let mut quality = 95u8;
    let mut options = FusionOptions::default();
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--quality" => {
                i += 1;
                quality = next_value(args, i, "--quality")?.parse()?;
            }
            "--strategy" => {
                i += 1;
                options.strategy = next_value(args, i, "--strategy")?.parse()?;
            }
            "--filter" => {
                i += 1;
                options.resize_filter = next_value(args, i, "--filter")?.parse()?;
            }
            "--allow-single" => options.allow_single_frame = true,
            "--json" => json = true,
            _ => {
                if output.is_none() {
                    output = Some(args[i].clone());
                } else {
                    inputs.push(args[i].clone());
                }
            }
        }
        i += 1;
    }

    let output = output.ok_or_else(|| anyhow!("output path required"))?;

    let start = Instant::now();
    let frames = inputs
        .iter()
        .map(|path| load_frame(path).with_context(|| format!("loading {}", path)))
        .collect::<Result<Vec<_>>>()?;

    let fused = fuse_with(&frames, &options)?;
    save_frame(&fused, &output, quality).with_context(|| format!("writing {}", output))?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "output": output,
                "width": fused.width,
                "height": fused.height,
                "channels": fused.channels,
                "sources": frames.len(),
                "processing_time_ms": elapsed_ms,
            })
        );
    } else {
        println!(
            "Fused {} frames into {} ({}x{}) in {}ms",
            frames.len(),
            output,
            fused.width,
            fused.height,
            elapsed_ms
        );
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> Result<()> {
    // config [--path <file>] [--write-default]
    let mut path = CrabHdrConfig::default_path();
    let mut write_default = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--path" => {
                i += 1;
                path = next_value(args, i, "--path")?.into();
            }
            "--write-default" => write_default = true,
            other => bail!("unknown config option: {}", other),
        }
        i += 1;
    }

    if write_default {
        CrabHdrConfig::default().save_to_file(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = CrabHdrConfig::load_from_file(&path)?;
    config.validate()?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn next_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} needs a value", flag))
}
