use std::sync::Arc;

use actix_web::{middleware::Compress, web, App, HttpServer};
use anyhow::Context;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use crescent::config::{AppConfig, StoreKind};
use crescent::repo::rest::RestRepo;
use crescent::repo::SightingRepo;
use crescent::{routes_config, AppState, SecurityHeaders};

fn build_repo(cfg: &AppConfig) -> anyhow::Result<Arc<dyn SightingRepo>> {
    match cfg.store {
        StoreKind::Rest => {
            let secrets = cfg.secrets.as_ref().context("store secrets missing")?;
            info!(endpoint = %secrets.url, table = %cfg.table, "Using managed store backend");
            Ok(Arc::new(RestRepo::new(&secrets.url, &secrets.key, &cfg.table)))
        }
        #[cfg(feature = "inmem-store")]
        StoreKind::Memory => {
            info!("Using in-memory store backend (rows are lost on restart)");
            Ok(Arc::new(crescent::repo::inmem::InMemRepo::new()))
        }
        #[cfg(not(feature = "inmem-store"))]
        StoreKind::Memory => anyhow::bail!("in-memory store not compiled in"),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; deployments set real secrets.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("Set SUPABASE_URL and SUPABASE_KEY (or CRESCENT_STORE=memory for local use)");
            std::process::exit(1);
        }
    };

    info!("Bootstrapping crescent sighting server");
    let state = AppState::new(build_repo(&cfg)?);
    let hsts = cfg.enable_hsts;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(SecurityHeaders::default().with_hsts(hsts))
            .app_data(web::Data::new(state.clone()))
            .configure(routes_config)
    })
    .bind((cfg.bind_addr.as_str(), cfg.port))
    .with_context(|| format!("binding {}:{}", cfg.bind_addr, cfg.port))?;

    info!("Listening on http://{}:{}", cfg.bind_addr, cfg.port);

    server.run().await?;
    Ok(())
}
