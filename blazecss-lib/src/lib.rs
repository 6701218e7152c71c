//! Unused-CSS elimination for rendered HTML pages.
//!
//! [`blaze_optimize::Optimizer`] takes a page, collects the tags, classes and ids
//! it uses, fetches its linked stylesheets, drops every rule nothing on the page
//! can match and splices the result back in as one inline `<style>` element.

pub mod blaze_optimize;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod splice;
pub mod storage;

pub mod parser {
    pub mod blaze_html;
    pub mod page_assets;
}

pub mod style {
    pub mod blaze_css;
    pub mod css_matcher;
    pub mod media;
    pub mod owned_css;
    pub mod scanner;
    pub mod transform;
}

pub use blaze_optimize::{optimize_sources, OptimizedPage, Optimizer};
pub use config::{DeviceClass, MinifyMode, OptimizerConfig, PageContext};
pub use error::{FetchError, OptimizeError};
pub use style::css_matcher::{Safelist, UsedSelectorSet};
