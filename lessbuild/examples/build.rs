fn main() -> color_eyre::Result<()> {
  // setup any logging you want,
  // if your in a build script this will only be visible if
  // the build script fails and `cargo` shows the raw stdout + stderr
  tracing_subscriber::FmtSubscriber::builder()
    .with_max_level(tracing::Level::DEBUG)
    .init();

  let params = lessbuild::CompileParams::builder()
    .with_source_dir("./styles".into())?
    .with_destination_dir("./target/css".into())
    // this shows the defaults,
    // `lessc` is searched for on the PATH unless `with_less_path` is used
    .with_compress(true)
    .with_extension("css")
    .finish()?;

  println!("cargo::rerun-if-changed={}", params.source_dir());
  let written = lessbuild::compile(params)?;
  tracing::info!(?written, "Compiled stylesheets");

  Ok(())
}
