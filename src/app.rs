//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the log subscriber
//! - runs the fit (or the synthetic generator)
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;

use crate::cli::{Cli, Command, FitArgs, PlotArgs, SynthArgs};
use crate::domain::{CurveParams, FitConfig, ParamBounds, SynthConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `spiral` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_logging(verbose: u8) -> Result<(), AppError> {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::new(2, format!("Failed to initialise logging: {e}")))
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.ingest.stats, &run.fit, &config)
    );
    println!(
        "Verification ({} rows, written to {}):",
        run.samples.len(),
        config.output_path.display()
    );
    println!("{}", crate::report::format_samples(&run.samples));

    println!("{}", crate::report::format_error_spread(&run.residuals));
    if config.top_n > 0 {
        println!("{}", crate::report::format_worst_points(&run.worst));
    }

    if config.plot {
        let curve = crate::report::sample_curve(
            &run.fit.params,
            config.grid_start,
            config.grid_end,
            crate::io::CURVE_SAMPLES,
        );
        let highlight: Vec<usize> = run.worst.iter().map(|r| r.index).collect();
        let plot = crate::plot::render_fit_plot(
            &run.ingest.observations,
            &curve,
            &highlight,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_fit {
        let fit_file = crate::io::build_fit_file(&run.fit, &run.ingest, &config);
        crate::io::write_fit_json(path, &fit_file)?;
        info!(path = %path.display(), "wrote fit JSON");
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let data = crate::data::generate_sample(&config)?;
    crate::io::write_observations_csv(&config.output_path, &data.observations)?;

    info!(
        path = %config.output_path.display(),
        n_points = data.observations.len(),
        outliers = data.outliers.len(),
        "wrote synthetic dataset"
    );
    println!(
        "Wrote {} points ({} outliers) to {}",
        data.observations.len(),
        data.outliers.len(),
        config.output_path.display()
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let fit_file = crate::io::read_fit_json(&args.fit)?;
    let plot = crate::plot::render_fit_file_plot(&fit_file, args.width, args.height);

    println!("{plot}");
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        grid_start: args.grid_start,
        grid_end: args.grid_end,
        sample_count: args.sample_count,
        bounds: ParamBounds {
            theta: (args.theta_min_deg.to_radians(), args.theta_max_deg.to_radians()),
            m: (args.m_min, args.m_max),
            x_offset: (args.x_min, args.x_max),
        },
        loss: args.loss,
        tolerance: args.tol,
        abs_tolerance: args.atol,
        max_generations: args.max_generations,
        popsize: args.popsize,
        seed: args.seed,
        polish: !args.no_polish,
        allow_unconverged: args.allow_unconverged,
        top_n: args.top,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_fit: args.export_fit.clone(),
    }
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        output_path: args.output.clone(),
        n_points: args.n_points,
        params: CurveParams::new(args.theta, args.m, args.x_offset),
        grid_start: args.grid_start,
        grid_end: args.grid_end,
        noise_sd: args.noise_sd,
        outlier_prob: args.outlier_prob,
        outlier_k: args.outlier_k,
        seed: args.seed,
    }
}
