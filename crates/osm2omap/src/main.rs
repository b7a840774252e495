use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter};

use osm2omap::config::Config;

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::parse();
    info!(
        "Converting {} with template {} at 1:{}",
        config.geojson.display(),
        config.template.display(),
        config.scale
    );

    let (collection, template) = osm2omap::read_inputs(&config.geojson, &config.template)
        .with_context(|| format!("Failed to read {}", config.geojson.display()))?;

    let conversion = osm2omap::convert(&collection, &config.options());
    info!("{}", conversion.stats);

    match &config.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            conversion
                .write_to(&mut BufWriter::new(file), &template)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            conversion
                .write_to(&mut io::stdout().lock(), &template)
                .context("Failed to write map to stdout")?;
        }
    }

    Ok(())
}
