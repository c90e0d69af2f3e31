#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Headless demo for the dashboard core.
//!
//! Mounts the dashboard against a running backend and tails the live
//! alert feed to the log until interrupted.

use sentinel_dashboard::{Dashboard, DashboardConfig};

#[tokio::main]
async fn main() {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let api_base_url =
        std::env::var("SENTINEL_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let feed_url = std::env::var("SENTINEL_FEED_URL")
        .unwrap_or_else(|_| "http://localhost:8000/stream".to_string());

    let dashboard = Dashboard::mount(DashboardConfig {
        api_base_url,
        feed_url,
        alert_capacity: sentinel_alerts::DEFAULT_CAPACITY,
    });

    let store = dashboard.store();
    let mut revisions = store.watch();

    log::info!("Tailing live alerts, ctrl-c to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                for alert in store.latest(1) {
                    log::info!(
                        "[{}] {} {} pincode {} ({} today)",
                        alert.timestamp,
                        alert.severity,
                        alert.kind,
                        alert.pincode,
                        store.total_today(),
                    );
                }
            }
        }
    }

    dashboard.unmount().await;
    log::info!("Dashboard unmounted");
}
