use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use pricecast_core::domain::headline::Headline;
use pricecast_core::domain::report::Report;
use pricecast_core::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Template, Default)]
#[template(path = "index.html")]
struct IndexPage {
    symbol: Option<String>,
    chart: Option<String>,
    prediction: Vec<String>,
    next_trading_day: Option<String>,
    headlines: Vec<Headline>,
}

impl From<Report> for IndexPage {
    fn from(report: Report) -> Self {
        Self {
            symbol: Some(report.symbol),
            chart: report.chart_svg,
            prediction: report
                .prediction
                .map(|p| p.lines())
                .unwrap_or_default(),
            next_trading_day: report
                .next_trading_day
                .map(|d| d.format("%A, %B %-d, %Y").to_string()),
            headlines: report.headlines,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SymbolForm {
    symbol: String,
}

async fn index() -> Result<Response, StatusCode> {
    render(&IndexPage::default())
}

async fn submit(
    State(state): State<AppState>,
    Form(form): Form<SymbolForm>,
) -> Result<Response, StatusCode> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("submission", %request_id, symbol = %form.symbol);

    let report = state
        .orchestrator
        .run(&form.symbol)
        .instrument(span)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(%request_id, error = %format!("{e:#}"), "price history unavailable");
            StatusCode::BAD_GATEWAY
        })?;

    render(&IndexPage::from(report))
}

fn render<T: Template>(page: &T) -> Result<Response, StatusCode> {
    match page.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!(error = %e, "template render failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
