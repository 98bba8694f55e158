use crate::client::{ServiceClient, WifiService};
use crate::form::{form_options, ConfigForm};
use crate::presenter::present;
use crate::runner::SpeedTestRunner;
use crate::trend::build_trend_view;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

pub struct AppState<S> {
    pub client: Arc<ServiceClient<S>>,
    pub runner: Arc<SpeedTestRunner<S>>,
}

impl<S: WifiService> AppState<S> {
    pub fn new(service: S) -> Self {
        let client = ServiceClient::new(service);
        let runner = SpeedTestRunner::new(client.clone());
        Self { client, runner }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            runner: self.runner.clone(),
        }
    }
}

pub fn router<S: WifiService>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard_handler))
        .route("/optimize", get(dashboard_handler))
        .route("/speed-test", get(dashboard_handler))
        .route("/api/form", get(form_handler))
        .route("/api/analyze", post(analyze_handler::<S>))
        .route("/api/speed-test", post(start_speed_test_handler::<S>))
        .route("/api/speed-test/status", get(speed_test_status_handler::<S>))
        .route("/api/trend", get(trend_handler::<S>))
        .layer(cors)
        .with_state(state)
}

pub async fn start_web_server<S: WifiService>(state: AppState<S>, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Web server listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn form_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "data": form_options()
    }))
}

async fn analyze_handler<S: WifiService>(
    State(state): State<AppState<S>>,
    Json(form): Json<ConfigForm>,
) -> impl IntoResponse {
    let config = match form.to_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("Rejected configuration form: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "success": false })),
            )
                .into_response();
        }
    };

    match state.client.analyze(&config).await {
        Ok(recommendation) => Json(serde_json::json!({
            "success": true,
            "data": {
                "config": config,
                "recommendation": recommendation,
                "results": present(&config, &recommendation)
            }
        }))
        .into_response(),
        Err(e) => {
            error!("Analysis failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false })),
            )
                .into_response()
        }
    }
}

async fn start_speed_test_handler<S: WifiService>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    if state.runner.start() {
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "success": true })),
        )
    } else {
        (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "success": false,
                "error": "Speed test already in progress"
            })),
        )
    }
}

async fn speed_test_status_handler<S: WifiService>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "data": state.runner.status()
    }))
}

async fn trend_handler<S: WifiService>(State(state): State<AppState<S>>) -> impl IntoResponse {
    match state.client.speed_test_trend().await {
        Ok(samples) => Json(serde_json::json!({
            "success": true,
            "data": build_trend_view(&samples)
        }))
        .into_response(),
        Err(e) => {
            error!("Failed to load speed trend: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false })),
            )
                .into_response()
        }
    }
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>WiFi Speed Booster</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .chart-container { position: relative; height: 250px; }
        .tab-active { background-color: #2563eb; color: #fff; }
    </style>
</head>
<body class="bg-gray-900 text-gray-100 min-h-screen flex flex-col">
    <header class="border-b border-gray-700 bg-gray-800">
        <div class="container mx-auto px-4 py-4 flex items-center justify-between">
            <a href="/" data-nav="/optimize" class="nav-link">
                <h1 class="text-2xl font-bold text-white">WiFi Speed Booster</h1>
                <p class="text-xs text-gray-400">Optimize Your Connection</p>
            </a>
            <nav class="flex gap-2">
                <a href="/optimize" data-nav="/optimize" class="nav-link tab px-4 py-2 rounded-lg font-medium">Optimize</a>
                <a href="/speed-test" data-nav="/speed-test" class="nav-link tab px-4 py-2 rounded-lg font-medium">Speed Test</a>
            </nav>
        </div>
    </header>

    <main class="flex-1 container mx-auto px-4 py-8">
        <!-- Optimize page -->
        <section id="page-optimize" class="hidden">
            <div class="text-center mb-8">
                <h2 class="text-4xl font-bold mb-2">WiFi Optimization</h2>
                <p class="text-gray-400">Enter your current WiFi settings to receive personalized optimization recommendations and boost your download speeds.</p>
            </div>
            <div class="grid lg:grid-cols-2 gap-8">
                <div class="bg-gray-800 rounded-lg p-6 border border-gray-700">
                    <h3 class="text-lg font-semibold">WiFi Configuration</h3>
                    <p class="text-gray-400 text-sm mb-4">Enter your current WiFi settings for analysis</p>
                    <form id="config-form" class="space-y-4">
                        <div>
                            <label for="ssid" class="text-sm text-gray-400 block mb-1">Network Name (SSID)</label>
                            <input id="ssid" placeholder="MyWiFiNetwork" required class="bg-gray-700 border border-gray-600 rounded px-3 py-2 w-full">
                        </div>
                        <div class="grid grid-cols-2 gap-4">
                            <div>
                                <label for="channel" class="text-sm text-gray-400 block mb-1">Channel</label>
                                <select id="channel" class="bg-gray-700 border border-gray-600 rounded px-3 py-2 w-full"></select>
                            </div>
                            <div>
                                <label for="frequency" class="text-sm text-gray-400 block mb-1">Frequency</label>
                                <select id="frequency" class="bg-gray-700 border border-gray-600 rounded px-3 py-2 w-full"></select>
                            </div>
                        </div>
                        <div>
                            <label for="signalStrength" class="text-sm text-gray-400 block mb-1">Signal Strength (dBm)</label>
                            <input id="signalStrength" type="number" required class="bg-gray-700 border border-gray-600 rounded px-3 py-2 w-full">
                            <p class="text-xs text-gray-500 mt-1">Typical range: -30 (excellent) to -90 (poor)</p>
                        </div>
                        <div>
                            <label for="interferenceLevel" class="text-sm text-gray-400 block mb-1">Interference Level</label>
                            <select id="interferenceLevel" class="bg-gray-700 border border-gray-600 rounded px-3 py-2 w-full"></select>
                        </div>
                        <button id="analyze-btn" type="submit" class="bg-blue-600 hover:bg-blue-700 disabled:opacity-50 px-4 py-2 rounded w-full">Analyze WiFi</button>
                    </form>
                </div>
                <div id="results" class="hidden bg-gray-800 rounded-lg p-6 border border-gray-700">
                    <h3 class="text-lg font-semibold">Optimization Results</h3>
                    <p id="results-description" class="text-gray-400 text-sm mb-4"></p>
                    <div id="results-body" class="space-y-4"></div>
                </div>
            </div>
        </section>

        <!-- Speed test page -->
        <section id="page-speed-test" class="hidden">
            <div class="text-center mb-8">
                <h2 class="text-4xl font-bold mb-2">Speed Test</h2>
                <p class="text-gray-400">Test your current download speed and track improvements over time.</p>
            </div>
            <div class="grid lg:grid-cols-2 gap-8">
                <div class="bg-gray-800 rounded-lg p-6 border border-gray-700">
                    <h3 class="text-lg font-semibold">Speed Test</h3>
                    <p class="text-gray-400 text-sm mb-4">Measure your current download speed</p>
                    <div class="py-8 text-center space-y-4">
                        <div id="speed-result" class="hidden">
                            <span id="speed-value" class="text-5xl font-bold text-blue-400"></span>
                            <span class="text-2xl text-gray-400">Mbps</span>
                            <p class="text-sm text-gray-400">Download Speed</p>
                        </div>
                        <div id="speed-progress" class="hidden">
                            <div class="h-2 bg-gray-700 rounded-full overflow-hidden">
                                <div id="progress-bar" class="h-full bg-blue-500" style="width: 0%"></div>
                            </div>
                            <p id="progress-label" class="text-sm text-gray-400 mt-2">Testing... 0%</p>
                        </div>
                    </div>
                    <button id="speed-btn" class="bg-blue-600 hover:bg-blue-700 disabled:opacity-50 px-4 py-2 rounded w-full">Start Speed Test</button>
                </div>
                <div class="bg-gray-800 rounded-lg p-6 border border-gray-700">
                    <h3 class="text-lg font-semibold">Speed Trend</h3>
                    <p class="text-gray-400 text-sm mb-4">Historical download speed measurements</p>
                    <div id="trend-empty" class="py-12 text-center">
                        <h4 class="text-lg font-semibold">No Data Yet</h4>
                        <p class="text-sm text-gray-400">Run a speed test to start tracking your connection performance.</p>
                    </div>
                    <div id="trend-data" class="hidden space-y-6">
                        <div class="grid grid-cols-2 gap-4">
                            <div class="p-4 rounded-lg bg-gray-700">
                                <p class="text-sm text-gray-400">Average Speed</p>
                                <p class="text-2xl font-bold text-blue-400"><span id="trend-average">--</span> <span class="text-sm">Mbps</span></p>
                            </div>
                            <div class="p-4 rounded-lg bg-gray-700">
                                <p class="text-sm text-gray-400">Total Tests</p>
                                <p id="trend-total" class="text-2xl font-bold text-blue-400">--</p>
                            </div>
                        </div>
                        <div class="chart-container"><canvas id="trend-chart"></canvas></div>
                    </div>
                </div>
            </div>
        </section>
    </main>

    <footer class="border-t border-gray-700 bg-gray-800 py-6 text-center text-sm text-gray-400">
        <p>&copy; <span id="year"></span> WiFi Speed Booster</p>
    </footer>

    <script>
        let trendChart = null;

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        function showPage(path) {
            const speed = path === '/speed-test';
            document.getElementById('page-optimize').classList.toggle('hidden', speed);
            document.getElementById('page-speed-test').classList.toggle('hidden', !speed);
            document.querySelectorAll('.tab').forEach(tab => {
                tab.classList.toggle('tab-active', tab.dataset.nav === (speed ? '/speed-test' : '/optimize'));
            });
            if (speed) {
                updateTrend();
            }
        }

        function fillSelect(id, options, selected) {
            const select = document.getElementById(id);
            select.innerHTML = options
                .map(o => `<option value="${o.value}" ${o.value === selected ? 'selected' : ''}>${escapeHtml(o.label)}</option>`)
                .join('');
        }

        async function loadForm() {
            const response = await fetch('/api/form');
            const result = await response.json();
            const data = result.data;
            fillSelect('channel', data.channels, data.defaults.channel);
            fillSelect('frequency', data.frequencies, data.defaults.frequency);
            fillSelect('interferenceLevel', data.interference_levels, data.defaults.interferenceLevel);
            const signal = document.getElementById('signalStrength');
            signal.min = data.signal_strength_min;
            signal.max = data.signal_strength_max;
            signal.value = data.defaults.signalStrength;
            document.getElementById('ssid').value = data.defaults.ssid;
        }

        function renderResults(results) {
            document.getElementById('results').classList.remove('hidden');
            document.getElementById('results-description').textContent = results.description;
            const body = document.getElementById('results-body');
            const view = results.view;

            if (view.state === 'optimal') {
                body.innerHTML = `
                    <div class="py-8 text-center">
                        <h4 class="text-lg font-semibold">${escapeHtml(view.title)}</h4>
                        <p class="text-sm text-gray-400">${escapeHtml(view.message)}</p>
                    </div>`;
                return;
            }

            body.innerHTML = view.blocks.map(block => `
                <div class="p-4 rounded-lg bg-gray-700 space-y-2">
                    <h4 class="font-semibold">${escapeHtml(block.title)}</h4>
                    <div class="flex items-center gap-3 text-sm">
                        <span class="border border-gray-500 rounded px-2 py-1">Current: ${escapeHtml(block.current)}</span>
                        <span>&rarr;</span>
                        <span class="bg-blue-600 rounded px-2 py-1">${escapeHtml(block.recommended_label)}: ${escapeHtml(block.recommended)}</span>
                    </div>
                    <p class="text-sm text-gray-400">${escapeHtml(block.message)}</p>
                </div>`).join('');
        }

        async function onAnalyze(event) {
            event.preventDefault();
            const button = document.getElementById('analyze-btn');
            button.disabled = true;
            button.textContent = 'Analyzing...';

            const form = {
                ssid: document.getElementById('ssid').value,
                channel: document.getElementById('channel').value,
                frequency: document.getElementById('frequency').value,
                signalStrength: document.getElementById('signalStrength').value,
                interferenceLevel: document.getElementById('interferenceLevel').value,
            };

            try {
                const response = await fetch('/api/analyze', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(form),
                });
                const result = await response.json();
                if (result.success) {
                    renderResults(result.data.results);
                } else {
                    console.error('Analysis failed:', response.status);
                }
            } catch (error) {
                console.error('Analysis failed:', error);
            } finally {
                button.disabled = false;
                button.textContent = 'Analyze WiFi';
            }
        }

        function initChart() {
            const ctx = document.getElementById('trend-chart').getContext('2d');
            trendChart = new Chart(ctx, {
                type: 'line',
                data: { labels: [], datasets: [{ label: 'Mbps', data: [], borderColor: '#3b82f6', borderWidth: 3, tension: 0.3 }] },
                options: {
                    responsive: true,
                    maintainAspectRatio: false,
                    plugins: { legend: { display: false } },
                    scales: {
                        x: { ticks: { color: '#9ca3af' }, grid: { color: '#374151' } },
                        y: { ticks: { color: '#9ca3af' }, grid: { color: '#374151' }, title: { display: true, text: 'Mbps', color: '#9ca3af' } }
                    }
                }
            });
        }

        async function updateTrend() {
            try {
                const response = await fetch('/api/trend');
                const result = await response.json();
                if (!result.success) {
                    return;
                }
                const view = result.data;
                const empty = view.points.length === 0;
                document.getElementById('trend-empty').classList.toggle('hidden', !empty);
                document.getElementById('trend-data').classList.toggle('hidden', empty);
                document.getElementById('trend-average').textContent = view.average_speed.toFixed(1);
                document.getElementById('trend-total').textContent = view.total_tests;
                trendChart.data.labels = view.points.map(p => p.time);
                trendChart.data.datasets[0].data = view.points.map(p => p.speed);
                trendChart.update('none');
            } catch (error) {
                console.error('Error loading speed trend:', error);
            }
        }

        function renderStatus(status) {
            const button = document.getElementById('speed-btn');
            button.disabled = status.testing;
            button.textContent = status.testing ? 'Testing...' : 'Start Speed Test';
            document.getElementById('speed-progress').classList.toggle('hidden', !status.testing);
            document.getElementById('progress-bar').style.width = `${status.progress}%`;
            document.getElementById('progress-label').textContent = `Testing... ${Math.round(status.progress)}%`;
            const showSpeed = !status.testing && status.last_speed !== null;
            document.getElementById('speed-result').classList.toggle('hidden', !showSpeed);
            if (showSpeed) {
                document.getElementById('speed-value').textContent = status.last_speed;
            }
        }

        async function pollStatus() {
            try {
                const response = await fetch('/api/speed-test/status');
                const status = (await response.json()).data;
                renderStatus(status);
                if (status.testing) {
                    setTimeout(pollStatus, 100);
                } else {
                    updateTrend();
                }
            } catch (error) {
                console.error('Speed test failed:', error);
                renderStatus({ testing: false, progress: 0, last_speed: null });
            }
        }

        async function onStartSpeedTest() {
            document.getElementById('speed-btn').disabled = true;
            try {
                await fetch('/api/speed-test', { method: 'POST' });
            } catch (error) {
                console.error('Speed test failed:', error);
            }
            pollStatus();
        }

        document.addEventListener('DOMContentLoaded', () => {
            document.getElementById('year').textContent = new Date().getFullYear();
            initChart();
            loadForm();
            pollStatus();

            document.querySelectorAll('.nav-link').forEach(link => {
                link.addEventListener('click', event => {
                    event.preventDefault();
                    history.pushState({}, '', link.dataset.nav);
                    showPage(link.dataset.nav);
                });
            });
            window.addEventListener('popstate', () => showPage(location.pathname));

            document.getElementById('config-form').addEventListener('submit', onAnalyze);
            document.getElementById('speed-btn').addEventListener('click', onStartSpeedTest);
            showPage(location.pathname);
        });
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::FakeService;
    use crate::models::{OptimizationRecommendation, SpeedTestResult};
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_body(ssid: &str) -> Value {
        json!({
            "ssid": ssid,
            "channel": "6",
            "frequency": "2400",
            "signalStrength": "-50",
            "interferenceLevel": "0.3"
        })
    }

    #[tokio::test]
    async fn dashboard_pages_are_served() {
        let app = router(AppState::new(FakeService::default()));
        for uri in ["/", "/optimize", "/speed-test"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn analyze_renders_single_channel_block() {
        let state = AppState::new(FakeService {
            recommendation: OptimizationRecommendation {
                recommended_channel: Some(11),
                ..Default::default()
            },
            ..FakeService::default()
        });

        let (status, body) = send(router(state), post_json("/api/analyze", form_body("Home"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["config"]["channel"], 6);
        let blocks = body["data"]["results"]["view"]["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["kind"], "channel");
        assert_eq!(blocks[0]["current"], "6");
        assert_eq!(blocks[0]["recommended"], "11");
    }

    #[tokio::test]
    async fn analyze_reports_optimal_configuration() {
        let state = AppState::new(FakeService::default());
        let (status, body) = send(router(state), post_json("/api/analyze", form_body("Home"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["results"]["view"]["state"], "optimal");
    }

    #[tokio::test]
    async fn analyze_rejects_empty_ssid() {
        let state = AppState::new(FakeService::default());
        let (status, body) = send(router(state), post_json("/api/analyze", form_body(""))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false }));
    }

    #[tokio::test]
    async fn service_rejection_returns_to_idle_without_details() {
        let state = AppState::new(FakeService {
            fail: true,
            ..FakeService::default()
        });
        let (status, body) = send(router(state), post_json("/api/analyze", form_body("Home"))).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "success": false }));
    }

    #[tokio::test]
    async fn trend_endpoint_aggregates_samples() {
        let state = AppState::new(FakeService {
            samples: Mutex::new(vec![
                SpeedTestResult { timestamp: 0, download_speed: 50.0 },
                SpeedTestResult { timestamp: 1, download_speed: 100.0 },
                SpeedTestResult { timestamp: 2, download_speed: 150.0 },
            ]),
            ..FakeService::default()
        });

        let (status, body) = send(
            router(state),
            Request::get("/api/trend").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["average_speed"], 100.0);
        assert_eq!(body["data"]["total_tests"], 3);
        assert_eq!(body["data"]["points"].as_array().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_conflicts_while_testing() {
        let state = AppState::new(FakeService::default());
        let app = router(state.clone());

        let (first, _) = send(app.clone(), Request::post("/api/speed-test").body(Body::empty()).unwrap()).await;
        let (second, _) = send(app.clone(), Request::post("/api/speed-test").body(Body::empty()).unwrap()).await;
        assert_eq!(first, StatusCode::ACCEPTED);
        assert_eq!(second, StatusCode::CONFLICT);

        let (_, body) = send(
            app,
            Request::get("/api/speed-test/status").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(body["data"]["testing"], true);

        state
            .runner
            .subscribe()
            .wait_for(|status| !status.testing)
            .await
            .unwrap();
        assert_eq!(state.client.speed_test_trend().await.unwrap().len(), 1);
    }
}
