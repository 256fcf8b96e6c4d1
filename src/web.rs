use crate::accordion::SearchOutcome;
use crate::config::PlaybookConfig;
use crate::counter::ClickCounter;
use crate::dom::Element;
use crate::form::{COPY_KEY_ATTR, CopyButton, FormBinding};
use crate::guide::GuideSource;
use crate::markup::{self, ContentClass};
use crate::placeholder;
use crate::render::{LOAD_FAILURE_MESSAGE, RenderContext, SEARCH_INPUT_ID, VIDEO_HUB_CLASS};
use crate::session::{NoClipboard, PageSession};
use crate::strategy::{Activation, StrategyRegistry};
use crate::timing::{ACK_REVERT, DEEP_LINK_DELAY, FADE, HIGHLIGHT, PLACEHOLDER_INTERVAL, SEARCH_PROMPTS, VIDEO_HUB_INTERVAL, VIDEO_HUB_TEXTS};
use askama::Html as HtmlEscaper;
use askama::{MarkupDisplay, Template};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info};

type SharedState = Arc<AppState>;
type SafeMarkup = MarkupDisplay<HtmlEscaper, String>;

const PAGE_TITLE: &str = "TGR Playbook";
const PAGE_STATE_FORM: &str = "page-state";
const MAX_REF_ID_LEN: usize = 64;
const RESERVED_PARAMS: &[&str] = &["refid", "guide", "q", "open", "toggle", "generate"];

#[derive(Clone)]
pub struct AppState {
    pub playbook: PlaybookConfig,
    pub registry: StrategyRegistry,
    pub counter: ClickCounter,
    pub theme: WebTheme,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum WebTheme {
    #[default]
    Tailwind,
    Bootstrap,
}

impl fmt::Display for WebTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebTheme::Tailwind => write!(f, "tailwind"),
            WebTheme::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    use_tailwind: bool,
    use_bootstrap: bool,
    body_class: &'static str,
    main_class: &'static str,
    card_class: &'static str,
    headline_class: &'static str,
    lede_class: &'static str,
    alert_class: &'static str,
    button_class: &'static str,
}

impl Chrome {
    fn new(theme: WebTheme) -> Self {
        match theme {
            WebTheme::Tailwind => Self {
                use_tailwind: true,
                use_bootstrap: false,
                body_class: "bg-slate-50 text-slate-900",
                main_class: "min-h-screen flex flex-col items-center justify-start py-8 px-4",
                card_class: "max-w-3xl w-full space-y-6",
                headline_class: "text-3xl font-extrabold tracking-tight",
                lede_class: "text-lg text-slate-600",
                alert_class: "rounded-md border border-red-300 bg-red-50 px-4 py-3 text-red-800",
                button_class: "inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800 transition-colors",
            },
            WebTheme::Bootstrap => Self {
                use_tailwind: false,
                use_bootstrap: true,
                body_class: "bg-light text-dark",
                main_class: "container py-4",
                card_class: "mx-auto col-lg-8",
                headline_class: "display-6 fw-bold",
                lede_class: "lead mb-4",
                alert_class: "alert alert-danger",
                button_class: "btn btn-primary px-4 py-2",
            },
        }
    }
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub theme: WebTheme,
    pub base_url: String,
    pub playbook: PlaybookConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            theme: WebTheme::default(),
            base_url: "http://127.0.0.1:8080".to_string(),
            playbook: PlaybookConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let counter = config.playbook.counter();
    let state = Arc::new(AppState {
        playbook: config.playbook.clone(),
        registry: StrategyRegistry::default(),
        counter: counter.clone(),
        theme: config.theme,
        base_url: config.base_url.trim_end_matches('/').to_string(),
    });
    let router = build_router(state);
    info!(
        %config.addr,
        theme = %config.theme,
        base = %config.base_url,
        guides = ?config.playbook.guides,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    counter.flush();
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/go/video-hub", get(video_hub))
        .route("/api/guides", get(api_guides))
        .route("/api/search", get(api_search))
        .route("/api/forms/:id/generate", axum::routing::post(api_generate))
        .route("/api/clicks", get(api_clicks).post(api_click))
        .route("/healthz", get(health))
        .route("/sitemap.xml", get(sitemap_xml))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// A page visit: query parameters replayed as user events, in order.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageRequest {
    ref_id: Option<String>,
    guide: Option<String>,
    query: Option<String>,
    open: Option<usize>,
    toggle: Option<usize>,
    generate: Option<String>,
    fields: BTreeMap<String, String>,
}

impl PageRequest {
    fn from_params(mut params: BTreeMap<String, String>) -> Self {
        let index = |value: Option<String>| value.and_then(|v| v.trim().parse::<usize>().ok());
        let request = Self {
            ref_id: params.remove("refid").as_deref().and_then(sanitize_ref_id),
            guide: params.remove("guide"),
            query: params.remove("q"),
            open: index(params.remove("open")),
            toggle: index(params.remove("toggle")),
            generate: params.remove("generate").filter(|id| !id.is_empty()),
            fields: BTreeMap::new(),
        };
        Self {
            fields: params
                .into_iter()
                .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
                .collect(),
            ..request
        }
    }
}

/// Referral ids are spliced into trusted markup, so only plain handles pass.
fn sanitize_ref_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_REF_ID_LEN
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    valid.then(|| trimmed.to_string())
}

fn build_session(state: &AppState, request: &PageRequest) -> PageSession {
    let options = state.playbook.page_options(request.ref_id.as_deref());
    let mut session = PageSession::load(
        state.playbook.load_guides(),
        &options,
        &state.registry,
        NoClipboard,
    )
    .with_counter(state.counter.clone());
    if let Some(open) = request.open {
        session.activate_header(open);
    }
    if let Some(toggle) = request.toggle {
        session.activate_header(toggle);
    }
    let landing = request.open.is_none() && request.toggle.is_none();
    if landing && session.deep_link(request.guide.as_deref()).is_some() {
        session.advance(DEEP_LINK_DELAY);
    }
    if let Some(query) = &request.query {
        session.search(query);
    }
    for (id, value) in &request.fields {
        session.set_field(id, value);
    }
    if let Some(form_id) = &request.generate {
        session.activate_action(form_id);
    }
    session
}

/// Turns the rendered tree into a working no-script page: headers, action
/// controls and inputs submit the shared page-state form, and copy controls
/// carry their clipboard text and feedback for the inline script. Items carry
/// their lowercased title and content so the script can filter as you type.
struct Enhancement {
    copy_texts: HashMap<String, String>,
    resting_labels: HashMap<String, String>,
    search_texts: HashMap<String, String>,
}

impl Enhancement {
    fn from_context(ctx: &RenderContext) -> Self {
        let copy_texts = ctx
            .copy_buttons()
            .into_iter()
            .filter_map(|button| ctx.copy_text(&button).map(|text| (button.key(), text)))
            .collect();
        let resting_labels = ctx
            .forms()
            .iter()
            .filter_map(|built| match &built.binding {
                FormBinding::Action { form, .. } => {
                    Some((built.form_id.clone(), form.button.text.clone()))
                }
                _ => None,
            })
            .collect();
        let search_texts = ctx
            .guides()
            .iter()
            .enumerate()
            .map(|(idx, guide)| {
                let text = format!("{}\n{}", guide.title, guide.content).to_lowercase();
                ((idx + 1).to_string(), text)
            })
            .collect();
        Self {
            copy_texts,
            resting_labels,
            search_texts,
        }
    }

    fn apply(&self, el: &mut Element) {
        if let Some(index) = el.attr("data-guide-index").map(str::to_string) {
            if let Some(text) = self.search_texts.get(&index) {
                el.set_attr("data-search-text", text.clone());
            }
            if let Some(header) = el.find_by_class_mut("accordion-header") {
                header.set_tag("button");
                submit_control(header, "toggle", &index);
            }
        }
        if el.has_class("form-in-guide") {
            if let Some(form_id) = el.id().map(str::to_string) {
                let resting = self.resting_labels.get(&form_id).cloned();
                if let Some(button) = el.find_mut(&|child| {
                    child.has_class("form-action-btn") && child.attr(COPY_KEY_ATTR).is_none()
                }) {
                    submit_control(button, "generate", &form_id);
                    if let Some(label) = resting {
                        button.set_attr("data-resting-label", label);
                    }
                }
            }
        }
        if matches!(el.tag(), "input" | "select") {
            let name = match el.id() {
                Some(SEARCH_INPUT_ID) => Some("q".to_string()),
                Some(id) => Some(id.to_string()),
                None => None,
            };
            if let Some(name) = name {
                el.set_attr("name", name);
                el.set_attr("form", PAGE_STATE_FORM);
            }
        }
        if let Some(key) = el.attr(COPY_KEY_ATTR).map(str::to_string) {
            if let Some(text) = self.copy_texts.get(&key) {
                el.set_attr("data-copy-text", text.clone());
            }
            if let Some(button) = CopyButton::parse(&key) {
                el.set_attr("data-copied-label", button.copied_label());
                if let Some(class) = button.copied_class() {
                    el.set_attr("data-copied-class", class);
                }
            }
        }
        if el.has_class(VIDEO_HUB_CLASS) {
            el.set_attr("href", "/go/video-hub");
        }
    }
}

fn submit_control(el: &mut Element, name: &str, value: &str) {
    el.set_attr("type", "submit");
    el.set_attr("name", name);
    el.set_attr("value", value);
    el.set_attr("form", PAGE_STATE_FORM);
}

async fn page(
    State(state): State<SharedState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let request = PageRequest::from_params(params);
    let mut session = build_session(&state, &request);
    let enhancement = Enhancement::from_context(session.context());
    session
        .context_mut()
        .walk_mut(&mut |el| enhancement.apply(el));
    let json_ld = MarkupDisplay::new_safe(
        indent_json(&website_json_ld(session.context(), &state.base_url), 4),
        HtmlEscaper,
    );
    let template = PageTemplate {
        chrome: Chrome::new(state.theme),
        title: PAGE_TITLE,
        canonical_url: format!("{}/", state.base_url),
        json_ld,
        notice: session.notice().map(str::to_string),
        ref_id: request.ref_id.clone(),
        open: session.accordion().open_index(),
        body: MarkupDisplay::new_safe(session.html(), HtmlEscaper),
        script: MarkupDisplay::new_safe(page_script(), HtmlEscaper),
    };
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(state.theme, err.to_string())),
    )
}

async fn video_hub(State(state): State<SharedState>) -> Redirect {
    state.counter.increment();
    Redirect::to(&state.playbook.video_hub_url)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "playbook-web" }))
}

#[derive(Debug, Deserialize)]
struct GuideParams {
    refid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    refid: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct GuideSummary {
    index: usize,
    title: String,
    html: String,
    class: ContentClass,
    has_form: bool,
}

#[derive(Debug, Clone, Serialize)]
struct SearchPayload {
    query: String,
    visible: Vec<usize>,
    no_results: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GeneratedPayload {
    form: String,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct ClickPayload {
    count: u64,
    label: String,
}

impl ClickPayload {
    fn from_counter(counter: &ClickCounter) -> Self {
        Self {
            count: counter.count(),
            label: counter.label(),
        }
    }
}

fn load_source(state: &AppState) -> Result<GuideSource, ApiError> {
    state.playbook.load_guides().map_err(|err| {
        error!(error = %err, "failed to load guide document");
        ApiError::unavailable(LOAD_FAILURE_MESSAGE)
    })
}

async fn api_guides(
    State(state): State<SharedState>,
    Query(params): Query<GuideParams>,
) -> Result<Json<Vec<GuideSummary>>, ApiError> {
    let source = load_source(&state)?;
    let ref_id = params.refid.as_deref().and_then(sanitize_ref_id);
    let guides = source
        .instructions
        .iter()
        .enumerate()
        .map(|(idx, guide)| {
            let content = placeholder::resolve(&guide.content, ref_id.as_deref());
            let translation = markup::translate_with_class(&content);
            GuideSummary {
                index: idx + 1,
                title: guide.title.clone(),
                html: translation.html,
                class: translation.class,
                has_form: guide.form.is_some(),
            }
        })
        .collect();
    Ok(Json(guides))
}

async fn api_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPayload>, ApiError> {
    let source = load_source(&state)?;
    let query = params.q.unwrap_or_default();
    let options = state
        .playbook
        .page_options(params.refid.as_deref().and_then(sanitize_ref_id).as_deref());
    let ctx = RenderContext::render(&source, &options, &state.registry);
    let mut accordion = ctx.accordion();
    let SearchOutcome { no_results, .. } = accordion.filter(&query, ctx.guides());
    let visible = accordion
        .items()
        .iter()
        .filter(|item| item.is_visible)
        .map(|item| item.index)
        .collect();
    Ok(Json(SearchPayload {
        query,
        visible,
        no_results,
    }))
}

async fn api_generate(
    State(state): State<SharedState>,
    Path(form_id): Path<String>,
    Json(values): Json<BTreeMap<String, String>>,
) -> Result<Json<GeneratedPayload>, ApiError> {
    let source = load_source(&state)?;
    let options = state.playbook.page_options(None);
    let ctx = RenderContext::render(&source, &options, &state.registry);
    let mut session = PageSession::new(ctx, &options, NoClipboard);
    for (id, value) in &values {
        session.set_field(id, value);
    }
    match session.activate_action(&form_id) {
        Some(Activation::Generated(message)) => Ok(Json(GeneratedPayload {
            form: form_id,
            message,
        })),
        Some(Activation::Rejected(err)) => Err(ApiError::unprocessable(err.message)),
        Some(Activation::Ignored) => Err(ApiError::not_found(format!(
            "Form {form_id:?} has no calculation strategy"
        ))),
        None => Err(ApiError::not_found(format!("No input form with id {form_id:?}"))),
    }
}

async fn api_clicks(State(state): State<SharedState>) -> Json<ClickPayload> {
    Json(ClickPayload::from_counter(&state.counter))
}

async fn api_click(State(state): State<SharedState>) -> Json<ClickPayload> {
    state.counter.increment();
    Json(ClickPayload::from_counter(&state.counter))
}

async fn sitemap_xml(State(state): State<SharedState>) -> impl IntoResponse {
    let mut body = String::with_capacity(1024);
    body.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    body.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    let mut push_url = |loc: String, priority: &str| {
        body.push_str("<url><loc>");
        body.push_str(&xml_escape(&loc));
        body.push_str("</loc><changefreq>weekly</changefreq><priority>");
        body.push_str(priority);
        body.push_str("</priority></url>");
    };
    push_url(format!("{}/", state.base_url), "0.8");
    if let Ok(source) = state.playbook.load_guides() {
        for index in 1..=source.len() {
            push_url(guide_url(&state.base_url, index), "0.5");
        }
    }
    body.push_str("</urlset>");
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

fn guide_url(base_url: &str, index: usize) -> String {
    format!("{base_url}/?guide={index}")
}

fn website_json_ld(ctx: &RenderContext, base_url: &str) -> String {
    let items = ctx
        .guides()
        .iter()
        .enumerate()
        .map(|(idx, guide)| {
            json!({
                "@type": "ListItem",
                "position": idx + 1,
                "name": guide.title,
                "url": guide_url(base_url, idx + 1),
            })
        })
        .collect::<Vec<_>>();
    serde_json::to_string_pretty(&json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": PAGE_TITLE,
        "url": format!("{base_url}/"),
        "mainEntity": {
            "@type": "ItemList",
            "itemListElement": items,
        }
    }))
    .unwrap_or_else(|_| "{}".to_string())
}

fn indent_json(content: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    content
        .lines()
        .map(|line| format!("{padding}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

const PAGE_SCRIPT: &str = r#"(function () {
  var ACK_MS = __ACK_MS__, FADE_MS = __FADE_MS__, HIGHLIGHT_MS = __HIGHLIGHT_MS__;
  document.querySelectorAll('[data-copy-text]').forEach(function (button) {
    var resting = button.innerHTML;
    button.type = 'button';
    button.addEventListener('click', function (event) {
      event.preventDefault();
      event.stopPropagation();
      var copiedClass = button.dataset.copiedClass;
      navigator.clipboard.writeText(button.dataset.copyText).then(function () {
        button.innerHTML = button.dataset.copiedLabel || resting;
        if (copiedClass) { button.classList.add(copiedClass); }
        clearTimeout(button._revert);
        button._revert = setTimeout(function () {
          button.innerHTML = resting;
          if (copiedClass) { button.classList.remove(copiedClass); }
        }, ACK_MS);
      });
    });
  });
  document.querySelectorAll('.form-action-btn.generated').forEach(function (button) {
    setTimeout(function () {
      button.textContent = button.dataset.restingLabel || button.textContent;
      button.classList.remove('generated');
    }, ACK_MS);
  });
  document.querySelectorAll('.deeplink-highlight').forEach(function (item) {
    item.scrollIntoView({ behavior: 'smooth', block: 'center' });
    setTimeout(function () { item.classList.remove('deeplink-highlight'); }, HIGHLIGHT_MS);
  });
  function rotate(texts, interval, fadeOut, apply) {
    var index = 0;
    setInterval(function () {
      fadeOut(true);
      setTimeout(function () {
        index = (index + 1) % texts.length;
        apply(texts[index]);
        fadeOut(false);
      }, FADE_MS);
    }, interval);
  }
  var hubText = document.querySelector('.video-hub-link span');
  if (hubText) {
    rotate(__VIDEO_TEXTS__, __VIDEO_INTERVAL_MS__,
      function (on) { hubText.classList.toggle('text-fade-out', on); },
      function (text) { hubText.textContent = text; });
  }
  var search = document.getElementById('searchInput');
  if (search) {
    var items = document.querySelectorAll('[data-guide-index]');
    var noResults = document.getElementById('no-results-message');
    search.addEventListener('input', function () {
      var term = search.value.toLowerCase();
      var shown = 0;
      items.forEach(function (item) {
        var match = (item.dataset.searchText || '').indexOf(term) !== -1;
        item.hidden = !match;
        if (match) { shown += 1; }
      });
      if (noResults && items.length) { noResults.hidden = shown > 0; }
    });
    rotate(__PROMPTS__, __PROMPT_INTERVAL_MS__,
      function (on) { search.classList.toggle('placeholder-fade-out', on); },
      function (text) { search.placeholder = text; });
  }
})();"#;

fn page_script() -> String {
    let list = |texts: &[&str]| serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string());
    PAGE_SCRIPT
        .replace("__ACK_MS__", &ACK_REVERT.as_millis().to_string())
        .replace("__FADE_MS__", &FADE.as_millis().to_string())
        .replace("__HIGHLIGHT_MS__", &HIGHLIGHT.as_millis().to_string())
        .replace("__VIDEO_TEXTS__", &list(VIDEO_HUB_TEXTS))
        .replace("__VIDEO_INTERVAL_MS__", &VIDEO_HUB_INTERVAL.as_millis().to_string())
        .replace("__PROMPTS__", &list(SEARCH_PROMPTS))
        .replace("__PROMPT_INTERVAL_MS__", &PLACEHOLDER_INTERVAL.as_millis().to_string())
}

fn render_error_page(theme: WebTheme, message: impl Into<String>) -> String {
    let chrome = Chrome::new(theme);
    let css_tag = match theme {
        WebTheme::Tailwind => {
            r#"<script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>"#
        }
        WebTheme::Bootstrap => {
            r#"<link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-sRIl4kxILFvY47J16cr9ZwB07vP4J8+LH7qKQnuqkuIAvNWLzeN8tE5YBujZqJLB" crossorigin="anonymous">"#
        }
    };
    let message = crate::dom::escape_html(&message.into());
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{PAGE_TITLE} • Error</title>
    {css_tag}
  </head>
  <body class="{body_class}">
    <main class="{main_class}">
      <div class="{card_class}">
        <h1 class="{headline_class}">Something went wrong</h1>
        <p class="{lede_class}">{message}</p>
        <a href="/" class="{button_class}">Back to the playbook</a>
      </div>
    </main>
  </body>
</html>"#,
        body_class = chrome.body_class,
        main_class = chrome.main_class,
        card_class = chrome.card_class,
        headline_class = chrome.headline_class,
        lede_class = chrome.lede_class,
        button_class = chrome.button_class,
    )
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ title }}</title>
    {% if chrome.use_tailwind %}
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    {% endif %}
    {% if chrome.use_bootstrap %}
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-sRIl4kxILFvY47J16cr9ZwB07vP4J8+LH7qKQnuqkuIAvNWLzeN8tE5YBujZqJLB" crossorigin="anonymous">
    {% endif %}
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.2/css/all.min.css">
    <link rel="canonical" href="{{ canonical_url }}">
    <script type="application/ld+json">
{{ json_ld|safe }}
    </script>
    <style>
      .accordion-item:not(.active) .accordion-content { display: none; }
      .accordion-item.active .accordion-content { max-height: none !important; }
      .accordion-header { display: flex; width: 100%; align-items: center; gap: 0.75rem; text-align: left; cursor: pointer; }
      .deeplink-highlight { outline: 3px solid #f59e0b; transition: outline-color 2.5s; }
      .copied, .generated { background: #16a34a; color: #fff; }
      .text-fade-out, .placeholder-fade-out::placeholder { opacity: 0; }
      .video-hub-link span, #searchInput::placeholder { transition: opacity 0.5s; }
      .marquee-bar { overflow: hidden; white-space: nowrap; }
      .marquee-content { display: inline-flex; animation: marquee 30s linear infinite; }
      .marquee-content-block { padding-right: 4rem; }
      @keyframes marquee { from { transform: translateX(0); } to { transform: translateX(-50%); } }
    </style>
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <div class="{{ chrome.card_class }}">
        <h1 class="{{ chrome.headline_class }}">{{ title }}</h1>
        <p class="{{ chrome.lede_class }}">Step-by-step guides, ready to share on WhatsApp.</p>
        {% match notice %}
        {% when Some with (message) %}
        <div class="{{ chrome.alert_class }}" role="alert">{{ message }}</div>
        {% when None %}
        {% endmatch %}
        <form id="page-state" method="get" action="/">
          {% match ref_id %}
          {% when Some with (id) %}
          <input type="hidden" name="refid" value="{{ id }}">
          {% when None %}
          {% endmatch %}
          {% match open %}
          {% when Some with (index) %}
          <input type="hidden" name="open" value="{{ index }}">
          {% when None %}
          {% endmatch %}
        </form>
        {{ body|safe }}
      </div>
    </main>
    <script>
{{ script|safe }}
    </script>
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    chrome: Chrome,
    title: &'a str,
    canonical_url: String,
    json_ld: SafeMarkup,
    notice: Option<String>,
    ref_id: Option<String>,
    open: Option<usize>,
    body: SafeMarkup,
    script: SafeMarkup,
}
