//! URL handling module for Page-Inspector
//!
//! This module provides validation of crawl targets and the href-level
//! helpers used when resolving links found on a page.

mod resolve;
mod target;

pub use resolve::{has_absolute_scheme, is_mailto, resolve_site_relative, site_origin};
pub use target::parse_target;
