use std::sync::Arc;

use chipmunk::App;
use chipmunk::config::Config;
use chipmunk::http::response::Response;
use chipmunk::middleware::{MemorySessionStore, Module, ModuleRegistry};
use chipmunk::routing::{Handler, Router, handler};
use chipmunk::server;

struct HomeModule;

impl Module for HomeModule {
    fn map_routes(&self, router: &mut Router<Handler>) -> chipmunk::Result<()> {
        router.map("GET", "/", handler(|_| Ok(Response::ok("Hello from chipmunk\n"))), "home")?;
        router
            .map(
                "GET",
                "/{id}-{slug}",
                handler(|c| {
                    let id = c.request().query_param("id").unwrap_or_default();
                    Ok(Response::ok(format!("post {id}")))
                }),
                "post",
            )?
            .where_param("id", "[0-9]+")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let mut cfg = Config::load()?;
    if cfg.modules.is_empty() {
        cfg.modules.push("home".to_string());
    }

    let mut registry = ModuleRegistry::new();
    registry.register("home", || Box::new(HomeModule));

    let app = App::standard(Arc::new(cfg.clone()), registry, Arc::new(MemorySessionStore::new()));

    tokio::select! {
        res = server::listener::run(&cfg, app) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
