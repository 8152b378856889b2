use analysis::{AnalysisEngine, DefaultReducer, JsonFileSink, JsonFileSource, Services};
use champion_rounds::cli::Cli;
use clap::Parser;
use config::Config;
use tracing::{debug, info, trace};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment variable
    // for log control. `CHAMPION_ROUNDS_LOG` can still set the level per
    // crate, e.g. `CHAMPION_ROUNDS_LOG=analysis=trace champion-rounds -q`.
    let env_filter = EnvFilter::builder()
        .with_env_var("CHAMPION_ROUNDS_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    // load config
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        _ => {
            let mut candidates = glob::glob("champion-rounds.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.sort();
            candidates.insert(0, "champion-rounds.toml".into());
            trace!(?candidates, "config file candidates");
            Config::load_multiple(candidates)?
        }
    };
    cli.apply(&mut config);
    debug!(?config, ?cli);

    if config.source.inputs.is_empty() {
        anyhow::bail!("no match files given: pass them as arguments or set `source.inputs`");
    }

    let services = Services {
        source: Box::new(JsonFileSource::from_patterns(&config.source.inputs)?),
        reducer: Box::new(DefaultReducer),
        sink: Box::new(JsonFileSink::new(&config)),
    };

    let mut engine = AnalysisEngine::new(config, services)?;
    let report = engine.run()?;

    for (reason, count) in &report.rejected {
        debug!(%reason, count, "records skipped");
    }
    info!(
        "it took {:.3?} for the analysis to finish ({} records, {} skipped as duplicate rosters, {} malformed)",
        report.elapsed,
        report.accepted,
        report.duplicate_units,
        report.malformed(),
    );
    info!("saved as {}", report.output.display());
    Ok(())
}
