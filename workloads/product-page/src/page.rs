//! Loading and streaming a product page.
//!
//! [`load_page`] prefetches everything the page needs and waits for the
//! product; the secondary sections keep making progress meanwhile.
//! [`stream_page`] then writes the shell and the product body with a
//! placeholder per section, and fills each slot as its data resolves.

use std::fmt::Display;
use std::time::Duration;

use edge_sdk::edge_cache::{CacheStatus, QueryHandle};
use edge_sdk::edge_core::WorkloadError;
use edge_sdk::edge_executor::{
    apply_fallback, fill_fragment, FallbackStrategy, FillQueue, SectionScheduler, SectionStatus,
};
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_streaming::{Slot, StreamingSink};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::{pin_mut, select_biased, Sink};

use crate::config::PageConfig;
use crate::context::{ProductContext, ProductScope};
use crate::data::{Comment, RecommendedPick, SizeAvailability};
use crate::route::PageState;
use crate::sections::{
    page_shell, render_picks, render_placeholder, render_product_body, render_reviews,
    render_sizes, PlaceholderMode, SectionKind, SizeSelection,
};
use crate::storefront::Storefront;

/// A secondary query that has settled.
#[derive(Debug)]
pub enum SectionData {
    Sizes(QueryHandle<SizeAvailability>),
    Recommended(QueryHandle<Vec<RecommendedPick>>),
    Reviews(QueryHandle<Vec<Comment>>),
}

impl SectionData {
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Sizes(_) => SectionKind::Sizes,
            Self::Recommended(_) => SectionKind::Recommended,
            Self::Reviews(_) => SectionKind::Reviews,
        }
    }

    /// Render the section, or the error to report when there is nothing to
    /// render. Stale data is rendered.
    pub fn render(&self, selection: &SizeSelection, config: &PageConfig) -> Result<String, String> {
        match self {
            Self::Sizes(q) => rendered(q, |sizes| render_sizes(sizes, selection)),
            Self::Recommended(q) => rendered(q, |picks| render_picks(picks)),
            Self::Reviews(q) => rendered(q, |comments| render_reviews(comments, &config.avatar)),
        }
    }

    pub fn cache_status(&self) -> CacheStatus {
        match self {
            Self::Sizes(q) => q.status(),
            Self::Recommended(q) => q.status(),
            Self::Reviews(q) => q.status(),
        }
    }

    /// Settled without anything to render.
    pub fn is_failed(&self) -> bool {
        fn empty<T>(q: &QueryHandle<T>) -> bool {
            q.data().is_none()
        }
        match self {
            Self::Sizes(q) => empty(q),
            Self::Recommended(q) => empty(q),
            Self::Reviews(q) => empty(q),
        }
    }

    /// The catalog has nothing for this product.
    pub fn is_not_found(&self) -> bool {
        fn missing<T>(q: &QueryHandle<T>) -> bool {
            q.data().is_none() && q.error().is_some_and(|e| e.is_not_found())
        }
        match self {
            Self::Sizes(q) => missing(q),
            Self::Recommended(q) => missing(q),
            Self::Reviews(q) => missing(q),
        }
    }

    /// Error from a refetch whose older data is being shown.
    pub fn stale_error(&self) -> Option<String> {
        fn stale<T>(q: &QueryHandle<T>) -> Option<String> {
            q.data().and(q.error()).map(ToString::to_string)
        }
        match self {
            Self::Sizes(q) => stale(q),
            Self::Recommended(q) => stale(q),
            Self::Reviews(q) => stale(q),
        }
    }
}

fn rendered<T>(query: &QueryHandle<T>, render: impl FnOnce(&T) -> String) -> Result<String, String> {
    match (query.data(), query.error()) {
        (Some(data), _) => Ok(render(data)),
        (None, Some(error)) => Err(error.to_string()),
        (None, None) => Err("no data".to_string()),
    }
}

/// Query the data behind `kind`. The future owns everything it needs.
pub fn section_data(
    store: &Storefront,
    kind: SectionKind,
    product_id: &str,
) -> LocalBoxFuture<'static, SectionData> {
    let store = store.clone();
    let id = product_id.to_string();
    async move {
        match kind {
            SectionKind::Sizes => SectionData::Sizes(store.sizes(&id).await),
            SectionKind::Recommended => SectionData::Recommended(store.recommended(&id).await),
            SectionKind::Reviews => SectionData::Reviews(store.reviews(&id).await),
        }
    }
    .boxed_local()
}

/// A page whose product has loaded, ready to stream.
pub struct ReadyPage {
    pub id: String,
    /// The loaded product and the size selection made for it.
    pub scope: ProductScope,
    /// Server-resolved sections still in flight.
    pub pending: FuturesUnordered<LocalBoxFuture<'static, SectionData>>,
    /// Server-resolved sections that settled before the product did, in
    /// settling order.
    pub early: Vec<SectionData>,
}

impl std::fmt::Debug for ReadyPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyPage")
            .field("id", &self.id)
            .field("pending", &self.pending.len())
            .field("early", &self.early.len())
            .finish_non_exhaustive()
    }
}

/// How loading a page ended.
#[derive(Debug)]
pub enum PageOutcome {
    Ready(Box<ReadyPage>),
    NotFound { id: String },
    Failed { id: String, error: String },
}

impl PageOutcome {
    pub fn state(&self) -> PageState {
        match self {
            Self::Ready(page) => PageState::Loaded {
                id: page.id.clone(),
            },
            Self::NotFound { id } => PageState::NotFound { id: id.clone() },
            Self::Failed { id, error } => PageState::Failed {
                id: id.clone(),
                error: error.clone(),
            },
        }
    }

    pub fn status(&self) -> u16 {
        self.state().status_code()
    }
}

/// Prefetch every query for `id` and wait for the product.
///
/// Server-resolved sections are polled while the product is awaited; any
/// that finish first are kept for streaming.
pub async fn load_page(store: &Storefront, id: &str, size: Option<String>) -> PageOutcome {
    let config = store.config();
    let state = PageState::start(Some(id));

    store.prefetch_all(id);

    let mut pending: FuturesUnordered<_> = SectionKind::ALL
        .into_iter()
        .filter(|kind| !config.is_client_loaded(*kind))
        .map(|kind| section_data(store, kind, id))
        .collect();
    let mut early = Vec::new();

    let product_query = store.product(id).fuse();
    pin_mut!(product_query);

    let product = loop {
        select_biased! {
            handle = product_query => break handle,
            data = pending.select_next_some() => early.push(data),
        }
    };

    let state = state.settle(&product);
    let mut scope = ProductScope::new().with_selection(SizeSelection::new(id).with_size(size));

    match (state, ProductContext::provide(product)) {
        (PageState::Loaded { id }, Some(context)) => {
            scope.enter(context);
            PageOutcome::Ready(Box::new(ReadyPage {
                id,
                scope,
                pending,
                early,
            }))
        }
        (PageState::NotFound { id }, _) => PageOutcome::NotFound { id },
        (PageState::Failed { id, error }, _) => PageOutcome::Failed { id, error },
        (state, _) => PageOutcome::Failed {
            id: id.to_string(),
            error: format!("unexpected page state {:?}", state),
        },
    }
}

/// What was streamed for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// Slots in the order they were filled.
    pub filled: Vec<String>,
    pub failed: Vec<String>,
    /// Sections left to the browser.
    pub deferred: Vec<String>,
    pub bytes_sent: usize,
    pub time_to_shell: Option<Duration>,
}

struct Fills<'a> {
    scheduler: SectionScheduler,
    queue: FillQueue,
    selection: &'a SizeSelection,
    config: &'a PageConfig,
    logger: &'a StructuredLogger,
    product_id: &'a str,
}

impl Fills<'_> {
    /// Render one settled section and write whatever the queue releases.
    async fn settle<S, E>(
        &mut self,
        sink: &mut StreamingSink<S, E>,
        data: SectionData,
    ) -> Result<(), WorkloadError>
    where
        S: Sink<Vec<u8>, Error = E> + Unpin,
        E: Display,
    {
        let kind = data.kind();
        let name = kind.as_str();

        let html = match data.render(self.selection, self.config) {
            Ok(html) => {
                if let Some(error) = data.stale_error() {
                    self.logger
                        .warn_builder("serving stale section")
                        .field("section", name)
                        .field("product_id", self.product_id)
                        .field("error", error)
                        .emit();
                }
                self.scheduler.complete_section(name);
                html
            }
            Err(error) => {
                self.logger
                    .warn_builder("section failed")
                    .field("section", name)
                    .field("product_id", self.product_id)
                    .field("error", error.as_str())
                    .emit();
                self.scheduler.fail_section(name, error.as_str());
                apply_fallback(&FallbackStrategy::ShowError, kind.label(), &error).into_html()
            }
        };

        for (slot, html) in self.queue.push(name, html) {
            sink.fill_slot(&slot, &fill_fragment(&slot, &html)).await?;
        }
        Ok(())
    }
}

/// Stream a loaded page: shell, product body with placeholders, then one
/// fill per server-resolved section, then the closing markup.
pub async fn stream_page<S, E>(
    page: ReadyPage,
    store: &Storefront,
    sink: &mut StreamingSink<S, E>,
) -> Result<StreamSummary, WorkloadError>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    let ReadyPage {
        id,
        scope,
        mut pending,
        early,
    } = page;
    let config = store.config();
    let logger = store.logger();
    let product = scope
        .product()
        .map_err(|e| WorkloadError::StreamError(e.to_string()))?
        .product();

    let shell = page_shell(product, config);
    sink.send_shell(&shell.render_opening()).await?;

    let mut scheduler = SectionScheduler::new();
    let mut streamed = Vec::new();
    for kind in SectionKind::ALL {
        let mode = if config.is_client_loaded(kind) {
            PlaceholderMode::Client
        } else {
            streamed.push(kind.as_str().to_string());
            PlaceholderMode::Streaming
        };
        scheduler.add_slot(
            Slot::new(kind.as_str())
                .with_placeholder(render_placeholder(kind, mode, &id))
                .depends_on(kind.query_kind().name()),
        );
        if mode == PlaceholderMode::Client {
            scheduler.defer_section(kind.as_str());
        }
    }

    let body = render_product_body(product, &id, |kind| {
        scheduler
            .slots()
            .find(|slot| slot.name == kind.as_str())
            .map(Slot::render)
            .unwrap_or_default()
    });
    sink.send_html(&body).await?;

    logger
        .debug_builder("product body sent")
        .field("product_id", id.as_str())
        .field_i64("bytes", sink.bytes_sent() as i64)
        .emit();

    let mut fills = Fills {
        scheduler,
        queue: FillQueue::new(config.ordering.strategy(), streamed),
        selection: scope.selection(),
        config,
        logger,
        product_id: &id,
    };

    for data in early {
        fills.settle(sink, data).await?;
    }
    while let Some(data) = pending.next().await {
        fills.settle(sink, data).await?;
    }

    if !fills.scheduler.is_complete() {
        let stuck = fills.scheduler.pending_sections().join(", ");
        return Err(WorkloadError::StreamError(format!(
            "sections never settled: {}",
            stuck
        )));
    }

    sink.complete(&shell.render_closing()).await?;

    let names = |wanted: fn(&SectionStatus) -> bool| -> Vec<String> {
        SectionKind::ALL
            .iter()
            .map(SectionKind::as_str)
            .filter(|name| fills.scheduler.status(name).is_some_and(wanted))
            .map(str::to_string)
            .collect()
    };
    let summary = StreamSummary {
        filled: sink.slots_filled().to_vec(),
        failed: names(|s| matches!(s, SectionStatus::Failed(_))),
        deferred: names(|s| matches!(s, SectionStatus::Deferred)),
        bytes_sent: sink.bytes_sent(),
        time_to_shell: sink.timing().time_to_shell(),
    };

    let mut log = logger
        .info_builder("page streamed")
        .field("product_id", id.as_str())
        .field_i64("bytes", summary.bytes_sent as i64)
        .field_i64("failed_sections", summary.failed.len() as i64);
    if let Some(ttfs) = summary.time_to_shell {
        log = log.duration_ms("time_to_shell_ms", ttfs);
    }
    log.emit();

    warm_client_sections(store, &id).await;

    Ok(summary)
}

/// Resolve the client-loaded sections after the response is complete so the
/// fragment requests that follow find them cached.
async fn warm_client_sections(store: &Storefront, product_id: &str) {
    for kind in store.config().client_sections.iter().copied() {
        let data = section_data(store, kind, product_id).await;
        store
            .logger()
            .debug_builder("client section cached")
            .field("section", kind.as_str())
            .field("product_id", product_id)
            .field("cache", data.cache_status().to_string())
            .emit();
    }
}
