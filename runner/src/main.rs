use {
  crate::settings::Settings,
  clap::Parser,
  tracing::{error, info, subscriber::set_global_default},
  tracing_subscriber::{EnvFilter, FmtSubscriber},
};

mod programs;
mod scenarios;
mod settings;

fn main() -> anyhow::Result<()> {
  // configure logging, RUST_LOG overrides the default level
  set_global_default(
    FmtSubscriber::builder()
      .with_env_filter(
        EnvFilter::try_from_default_env()
          .unwrap_or_else(|_| EnvFilter::new("info")),
      )
      .finish(),
  )?;

  let settings = Settings::parse();
  info!("startup settings: {settings:#?}");

  let mut failed = 0;
  for scenario in settings.scenarios() {
    match scenarios::replay(scenario, &settings) {
      Ok(()) => info!("scenario {scenario:?} behaved as expected"),
      Err(e) => {
        error!("scenario {scenario:?} diverged: {e:#}");
        failed += 1;
      }
    }
  }

  if failed != 0 {
    anyhow::bail!("{failed} scenario(s) diverged");
  }
  Ok(())
}
