use std::{path::PathBuf, sync::Arc};

use add_product::{AddProcess, CapturedImage, ScreenController, Snapshot};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::GraphqlRemoteService;
use shared::domain::{Category, CategoryId, NewProduct};
use storage::{LocalStore, SqliteSessionStore};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod view;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "stockctl", about = "Add products to the inventory backend")]
struct Cli {
    #[arg(long, default_value = "stockctl.toml")]
    config: PathBuf,
    #[arg(long)]
    graphql_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a product, optionally with a photo.
    AddProduct {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category_id: String,
        #[arg(long, default_value = "")]
        brand: String,
        #[arg(long, default_value = "")]
        supplier: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Fetch the company list.
    Companies,
    /// Add or rename a category in the session store.
    SeedCategory {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
    },
    Categories,
    LastProduct,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(url) = cli.graphql_url {
        settings.graphql_url = url;
    }
    if let Some(url) = cli.database_url {
        settings.database_url = config::normalize_database_url(&url);
    }
    settings.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = SqliteSessionStore::new(&settings.database_url).await?;

    match cli.command {
        Command::SeedCategory { id, name } => {
            let mut categories = store.load_categories().await?;
            let id = CategoryId::new(id);
            match categories.iter_mut().find(|c| c.id == id) {
                Some(existing) => existing.name = name,
                None => categories.push(Category { id, name }),
            }
            store.save_categories(&categories).await?;
            println!("stored {} categories", categories.len());
        }
        Command::Categories => {
            for category in store.load_categories().await? {
                println!("{}\t{}", category.id, category.name);
            }
        }
        Command::LastProduct => match store.last_saved_product().await? {
            Some(product) => println!(
                "{}\t{}\tcategory={}\tbrand={}\tsupplier={}",
                product.id, product.name, product.category_id, product.brand, product.supplier
            ),
            None => println!("no product saved in this session"),
        },
        Command::AddProduct {
            name,
            category_id,
            brand,
            supplier,
            image,
        } => {
            let controller = build_controller(&settings, &store).await?;
            let mut rx = controller.subscribe();
            let mut input = NewProduct {
                name,
                category_id,
                image: None,
                brand,
                supplier,
            };

            if let Some(path) = image {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read image '{}'", path.display()))?;
                controller.set_captured_image(Some(CapturedImage::decode_frame(&bytes)?));
                let snapshot = rx
                    .wait_for(|s| s.data.captured_image.is_some())
                    .await
                    .map_err(|_| anyhow!("controller stopped before the image was stored"))?
                    .clone();
                println!("{}", view::render_snapshot(&snapshot));
                if let Some(captured) = &snapshot.data.captured_image {
                    input.image = Some(captured.to_png_data_url()?);
                }
            }

            controller.submit_new_product(input);
            let done = follow_until_done(&mut rx).await?;
            finish(done)?;
        }
        Command::Companies => {
            let controller = build_controller(&settings, &store).await?;
            let mut rx = controller.subscribe();
            controller.load_companies();
            let done = follow_until_done(&mut rx).await?;
            for company in &done.data.companies {
                println!("{}\t{}", company.id, company.name);
            }
            finish(done)?;
        }
    }

    Ok(())
}

async fn build_controller(
    settings: &Settings,
    store: &SqliteSessionStore,
) -> Result<ScreenController> {
    let remote = GraphqlRemoteService::new(&settings.graphql_url, settings.request_timeout())?;
    info!(endpoint = %remote.endpoint(), "using graphql backend");
    Ok(ScreenController::new(
        Arc::new(remote),
        Arc::new(store.clone()),
        settings.controller_options(),
    )
    .await)
}

/// Prints every published snapshot until the running operation finishes.
async fn follow_until_done(rx: &mut watch::Receiver<Snapshot>) -> Result<Snapshot> {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        println!("{}", view::render_snapshot(&snapshot));
        if snapshot.process == AddProcess::DoneAdding {
            return Ok(snapshot);
        }
        rx.changed()
            .await
            .map_err(|_| anyhow!("controller stopped before the operation finished"))?;
    }
}

fn finish(done: Snapshot) -> Result<()> {
    if let Some(error) = done.error {
        bail!(view::render_error(&error));
    }
    Ok(())
}
