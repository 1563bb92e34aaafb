use livequiz::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    livequiz::logging::init(&config.log_level, config.log_format)?;

    let catalog = TemplateCatalog::load(&DirTemplateStore::new(&config.templates_dir));
    if catalog.is_empty() {
        tracing::warn!(dir = %config.templates_dir.display(), "no quiz templates loaded");
    }

    tracing::info!(bind = %config.bind, templates = ?catalog.names(), "starting quiz server");
    let server = LiveQuizServerBuilder::from_config(&config)
        .build(catalog)
        .await?;

    server.run().await?;
    Ok(())
}
