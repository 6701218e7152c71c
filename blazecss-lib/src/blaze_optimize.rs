use crate::config::{MinifyMode, OptimizerConfig, PageContext};
use crate::error::{OptimizeError, Result};
use crate::fetch::{self, Fetcher, HttpFetcher};
use crate::gate::{Gate, RequestGate};
use crate::parser::page_assets::{Html5everAnalyzer, HtmlAnalyzer, PageAssets};
use crate::splice;
use crate::storage::{CssStorage, NoopStorage};
use crate::style::css_matcher::UsedSelectorSet;
use crate::style::owned_css::{OptimizedStylesheet, StyleSheetSource};
use crate::style::{blaze_css, media, transform};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Result of one optimization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedPage {
    /// The page with the optimized `<style>` spliced in.
    pub html: String,
    pub stylesheet: OptimizedStylesheet,
}

/// Strips unused CSS from pages. One optimizer serves one page context; every
/// call to [`Optimizer::optimize`] owns its own buffers.
pub struct Optimizer {
    config: OptimizerConfig,
    page: PageContext,
    gate: Box<dyn Gate>,
    analyzer: Box<dyn HtmlAnalyzer>,
    fetcher: Box<dyn Fetcher>,
    storage: Box<dyn CssStorage>,
}

impl Optimizer {
    /// An enabled optimizer that fetches over HTTP and stores nothing.
    pub fn new(config: OptimizerConfig, page: PageContext) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout).map_err(OptimizeError::Client)?;
        Ok(Optimizer {
            config,
            page,
            gate: Box::new(RequestGate::enabled()),
            analyzer: Box::new(Html5everAnalyzer),
            fetcher: Box::new(fetcher),
            storage: Box::new(NoopStorage),
        })
    }

    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl HtmlAnalyzer + 'static) -> Self {
        self.analyzer = Box::new(analyzer);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_storage(mut self, storage: impl CssStorage + 'static) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    /// Returns the page with its stylesheets replaced by the optimized CSS.
    ///
    /// Never fails: when the gate says no, or anything goes wrong on the way
    /// (including a panic in one of the passes), the input comes back untouched.
    pub fn optimize(&self, html: &str) -> String {
        self.optimize_page(html)
            .map(|page| page.html)
            .unwrap_or_else(|| html.to_string())
    }

    /// Like [`Optimizer::optimize`], but also returns the stylesheet this run
    /// produced. `None` when the gate said no or the run failed.
    pub fn optimize_page(&self, html: &str) -> Option<OptimizedPage> {
        if !self.gate.should_process() {
            debug!("CSS optimization skipped for {}", self.page.url);
            return None;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(html)))
            .map_err(|payload| OptimizeError::Panic(panic_message(payload)));

        match outcome {
            Ok(page) => Some(page),
            Err(e) => {
                error!("CSS optimization error for {}: {}", self.page.url, e);
                None
            }
        }
    }

    fn run(&self, html: &str) -> OptimizedPage {
        let assets = self.analyzer.analyze(html);
        let sources = self.fetch_sources(&assets);
        let stylesheet = optimize_sources(&sources, &assets.used_selectors, &self.config);
        info!("{}: {}", self.page.url, stylesheet);

        if let Err(e) = self.storage.save(&self.page.storage_key(), &stylesheet.css) {
            warn!("Failed to store optimized CSS for {}: {}", self.page.url, e);
        }
        OptimizedPage {
            html: splice::replace_css_in_html(html, &stylesheet.css),
            stylesheet,
        }
    }

    /// Fetches every linked stylesheet, keeping discovery order. Failed fetches
    /// are logged and skipped.
    fn fetch_sources(&self, assets: &PageAssets) -> Vec<StyleSheetSource> {
        let base_href = assets.base_href.as_deref();
        let urls: Vec<String> = assets
            .stylesheet_urls
            .iter()
            .map(|href| fetch::resolve_url(&self.page.url, base_href, href))
            .collect();

        let fetcher = &self.fetcher;
        let results: Vec<_> = if self.config.concurrent_fetch {
            urls.par_iter().map(|url| fetcher.fetch(url)).collect()
        } else {
            urls.iter().map(|url| fetcher.fetch(url)).collect()
        };

        let mut sources = Vec::with_capacity(urls.len());
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(content) => sources.push(StyleSheetSource::new(url.clone(), content)),
                Err(e) => warn!("Failed to fetch CSS: {}", e),
            }
        }
        if sources.is_empty() && !urls.is_empty() {
            warn!(
                "None of the {} stylesheet(s) of {} could be fetched",
                urls.len(),
                self.page.url
            );
        }
        sources
    }
}

/// The CSS half of the pipeline: responsive media blocks are lifted out of the
/// raw sources first, then each source is minified and filtered, the media
/// blocks are re-filtered and appended, and `@font-face` rules get
/// `font-display: swap`.
pub fn optimize_sources(
    sources: &[StyleSheetSource],
    used_selectors: &UsedSelectorSet,
    config: &OptimizerConfig,
) -> OptimizedStylesheet {
    let media_queries = media::extract(sources);

    let mut optimized_css = String::new();
    for source in sources {
        let css = minify_source(source, config.minify);
        optimized_css.push_str(&blaze_css::filter(&css, used_selectors, &config.safelist));
    }
    optimized_css.push_str(&media::reattach(
        &media_queries,
        used_selectors,
        &config.safelist,
    ));

    OptimizedStylesheet {
        css: transform::apply_font_display_swap(&optimized_css),
        source_bytes: sources.iter().map(|source| source.content.len()).sum(),
        source_count: sources.len(),
    }
}

fn minify_source(source: &StyleSheetSource, mode: MinifyMode) -> String {
    match transform::minify_with(mode, &source.content) {
        Ok(css) => css,
        Err(e) => {
            warn!("{}: {}, using whitespace minifier", source.url, e);
            transform::minify(&source.content)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
