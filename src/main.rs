#[macro_use]
mod utilities;
mod engine;

use std::env;
use std::path::Path;

use anyhow::Context;
use log::info;

use engine::renderer::Config;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut arguments = env::args();
    arguments.next();
    let config_path = arguments
        .next()
        .context("usage: visray <config.yaml> [output.png]")?;
    let output_path = arguments
        .next()
        .unwrap_or_else(|| String::from("render_out.png"));

    let config = Config::load(Path::new(&config_path))?;
    let buffer = config.render()?;
    buffer
        .save(&output_path)
        .with_context(|| format!("could not write image {}", output_path))?;
    info!("wrote {}", output_path);

    Ok(())
}
