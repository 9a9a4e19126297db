use std::sync::Arc;

use backend::RestDataService;
use clap::{Parser, Subcommand};
use foundation::geo::LatLng;
use geoportal::{Event, Geoportal, GeoportalConfig, StateTransition};
use layers::registry::LayerRegistry;
use layers::surface::HeadlessSurface;
use report::form::ReportForm;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Geoportal client driven from the command line")]
struct Args {
    /// Backend base URL (overrides GEOPORTAL_URL)
    #[arg(long)]
    url: Option<String>,

    /// Backend API key (overrides GEOPORTAL_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the configured layers
    Layers,

    /// Load a layer, optionally unloading it again
    Toggle {
        id: String,

        /// Unload the layer after loading it
        #[arg(long)]
        off: bool,
    },

    /// Search neighborhood names
    Search { query: String },

    /// Distances from a point to the nearest emergency services
    Distances {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },

    /// Submit a citizen report
    Report {
        #[arg(long)]
        name: String,

        /// Report type
        #[arg(long)]
        kind: String,

        #[arg(long)]
        comments: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: String,

        #[arg(long, allow_negative_numbers = true)]
        lng: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = GeoportalConfig::from_env().with_endpoint(args.url, args.api_key);
    info!(url = %config.base_url, "geoportal backend");

    if let Command::Layers = args.command {
        for layer in LayerRegistry::default().iter() {
            println!(
                "{:<16} {:<16} {} {:?}{}",
                layer.id,
                layer.display_name,
                layer.color,
                layer.geometry,
                if layer.default_active { " (default)" } else { "" }
            );
        }
        return Ok(());
    }

    let service = Arc::new(RestDataService::new(&config.base_url, &config.api_key));
    let surface = HeadlessSurface::new(config.initial_center, config.initial_zoom);
    let mut app = Geoportal::new(&config, service, surface);

    match args.command {
        Command::Layers => {}
        Command::Toggle { id, off } => {
            let shown = app
                .handle(Event::ToggleLayer {
                    id: id.clone(),
                    visible: true,
                })
                .await;
            print_status(&app);
            if let StateTransition::LayerShown { features, .. } = shown {
                println!("{features} features rendered");
            }
            if off {
                app.handle(Event::ToggleLayer { id, visible: false }).await;
                println!("overlays attached: {}", app.surface().overlays().count());
            }
        }
        Command::Search { query } => {
            app.handle(Event::Start).await;
            if app.index().is_empty() {
                anyhow::bail!("no neighborhoods available");
            }
            if let StateTransition::SearchResults(names) = app.handle(Event::SearchInput(query)).await {
                for name in names {
                    println!("{name}");
                }
            }
        }
        Command::Distances { lat, lng } => {
            app.handle(Event::MapClicked(LatLng::new(lat, lng))).await;
            print_status(&app);
            if let Some(popup) = app.surface().popup() {
                println!("{}", popup.to_text());
            }
        }
        Command::Report {
            name,
            kind,
            comments,
            lat,
            lng,
        } => {
            app.handle(Event::ManualCoordinates { lat, lng }).await;
            app.handle(Event::EditReport(ReportForm::new(name, kind, comments)))
                .await;
            let transition = app.handle(Event::SubmitReport).await;
            print_status(&app);
            if transition != StateTransition::ReportAccepted {
                anyhow::bail!("report not accepted");
            }
        }
    }

    Ok(())
}

fn print_status(app: &Geoportal<HeadlessSurface>) {
    if let Some(msg) = app.status().latest() {
        println!("[{}] {}", msg.severity, msg.text);
    }
}
