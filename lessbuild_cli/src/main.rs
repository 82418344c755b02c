use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::eyre::Context as _;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
    #[clap(flatten)]
    args: lessbuild::CompileParamsBuilder,

    /// Files to compile, relative to the source dir.
    /// Searches the whole source dir when none are given
    files: Vec<Utf8PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(ErrorLayer::default())
        .init();
    color_eyre::install()?;

    let cli = Cli::parse();
    let params = cli.args.finish()?;
    let less = lessbuild::Less::new(params);

    let files = (!cli.files.is_empty()).then_some(cli.files.as_slice());
    let written = less
        .compile(files)
        .wrap_err("Failed to compile stylesheets")?;

    for path in written {
        println!("{path}");
    }

    Ok(())
}
