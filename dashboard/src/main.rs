//! Shopdesk dashboard snapshot.
//!
//! Loads every domain's list and stats from the backend, prints an overview
//! and the report metrics for one date range, then shuts down.
//!
//! # Usage
//!
//! ```bash
//! SHOPDESK_API_URL=http://localhost:5000/api SHOPDESK_API_TOKEN=... \
//!   cargo run --bin shopdesk -- 30d
//!
//! # Custom range (either bound may be omitted)
//! cargo run --bin shopdesk -- custom 2025-01-01 2025-03-31
//! ```
//!
//! Set `METRICS_ADDR=0.0.0.0:9090` to install the Prometheus recorder and
//! `RUST_LOG` to change verbosity.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shopdesk::app::{build_store, refresh_all};
use shopdesk::notify::{log_notification, BroadcastNotifier};
use shopdesk::reports::{compute_metrics, RangePreset, ReportMetrics};
use shopdesk::slice::SliceEnvironment;
use shopdesk::Config;
use shopdesk_api::ApiClient;
use shopdesk_core::environment::Clock;
use shopdesk_runtime::metrics::MetricsServer;
use shopdesk_runtime::StoreConfig;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "shopdesk=info,shopdesk_runtime=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let range = parse_range(std::env::args().skip(1).collect())?;

    info!(api_url = %config.api_url, %range, "Starting shopdesk");

    let _metrics = match config.metrics_addr {
        Some(addr) => {
            let mut server = MetricsServer::new(addr);
            server.start().context("Failed to start metrics recorder")?;
            Some(server)
        },
        None => None,
    };

    let mut client = ApiClient::new(config.api_url.clone(), config.api_timeout).context("Failed to build HTTP client")?;
    if let Some(token) = &config.api_token {
        client = client.with_token(token.clone());
    }

    let notifier = Arc::new(BroadcastNotifier::new(config.notify_capacity));
    let mut notifications = notifier.subscribe();
    let notification_log = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => log_notification(&notification),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Notification log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let env = SliceEnvironment::new(Arc::new(client), notifier);
    let store = build_store(
        env,
        StoreConfig::default().with_shutdown_timeout(config.shutdown_timeout),
    );

    let refresh = refresh_all(&store, config.api_timeout + config.api_timeout)
        .await
        .context("Dashboard refresh did not complete")?;
    if !refresh.is_clean() {
        tracing::warn!(rejected = refresh.rejected, failed = refresh.failed, "Some requests failed");
    }

    let now = store.environment().clock.now();
    let (summaries, metrics) = store
        .state(|state| {
            let window = range.resolve(now);
            (state.summaries(), compute_metrics(&state.report_inputs(), window))
        })
        .await;

    println!("{:<14} {:>6}  {:<7} error", "domain", "items", "stats");
    for summary in &summaries {
        let error = if summary.error.is_empty() {
            &summary.stats_error
        } else {
            &summary.error
        };
        println!(
            "{:<14} {:>6}  {:<7} {}",
            summary.domain,
            summary.items,
            if summary.has_stats { "yes" } else { "no" },
            error
        );
    }
    println!();
    print_report(&range, &metrics);

    store
        .shutdown(config.shutdown_timeout)
        .await
        .context("Store did not shut down cleanly")?;
    notification_log.abort();

    Ok(())
}

fn parse_range(args: Vec<String>) -> Result<RangePreset> {
    let mut args = args.into_iter();
    let Some(selector) = args.next() else {
        return Ok(RangePreset::default());
    };

    match selector.parse::<RangePreset>()? {
        RangePreset::Custom { .. } => Ok(RangePreset::Custom {
            start: args.next().map(|s| parse_day(&s, NaiveTime::MIN)).transpose()?,
            end: args
                .next()
                .map(|s| parse_day(&s, NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)))
                .transpose()?,
        }),
        preset => {
            if args.next().is_some() {
                bail!("Only a custom range takes dates");
            }
            Ok(preset)
        },
    }
}

fn parse_day(value: &str, time: NaiveTime) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("Invalid date '{value}'"))?;
    Ok(date.and_time(time).and_utc())
}

fn print_report(range: &RangePreset, m: &ReportMetrics) {
    println!(
        "Report {range}: {} .. {}",
        m.window.start.format("%Y-%m-%d"),
        m.window.end.format("%Y-%m-%d")
    );
    println!("  revenue            {:>12.2}", m.total_revenue);
    println!("  outstanding        {:>12.2}", m.outstanding_amount);
    println!(
        "  invoices           {:>12}  paid {:.1}%  avg {:.2}",
        m.invoice_count,
        m.payment_rate * 100.0,
        m.average_invoice_value
    );
    println!(
        "  appointments       {:>12}  completed {:.1}%  cancelled {:.1}%",
        m.appointment_count,
        m.appointment_completion_rate * 100.0,
        m.cancellation_rate * 100.0
    );
    println!(
        "  work orders        {:>12}  completed {:.1}%",
        m.work_order_count,
        m.work_order_completion_rate * 100.0
    );
    println!("  new customers      {:>12}", m.new_customers);

    for (status, count) in &m.invoice_status_breakdown {
        println!("  invoices {:<10}{count:>12}", status.as_str());
    }
    for service in &m.top_services {
        println!("  top service  {:<24} {:>10.2} ({}x)", service.name, service.revenue, service.count);
    }
    for load in &m.technician_workload {
        println!(
            "  technician   {:<24} {:>4} assigned, {} completed",
            load.technician_id.as_str(),
            load.assigned,
            load.completed
        );
    }
}
