// src/services/normalizer.rs

//! Statement markup normalization.
//!
//! Rewrites an extracted fragment so it renders inside another site:
//! absolute URLs everywhere, external anchors, file badges and classed
//! images. Running it on its own output changes nothing.

use scraper::Selector;
use scraper::node::Element;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, NormalizeConfig, ProblemId, UpstreamConfig};
use crate::utils::dom::{Edit, ElementMut, Fragment, KEEP_WHEN_EMPTY};
use crate::utils::{resolve_image, resolve_link};

const PROBLEM_SCHEME: &str = "problem://";

const BADGE_CLASS: &str = "file-badge";

const PDF_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="12" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2.5" stroke-linecap="round" stroke-linejoin="round"><path d="M14.5 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V7.5L14.5 2z"/><polyline points="14 2 14 8 20 8"/></svg>"#;

const ZIP_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="12" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2.5" stroke-linecap="round" stroke-linejoin="round"><path d="M21 16V8a2 2 0 0 0-1-1.73l-7-4a2 2 0 0 0-2 0l-7 4A2 2 0 0 0 3 8v8a2 2 0 0 0 1 1.73l7 4a2 2 0 0 0 2 0l7-4A2 2 0 0 0 21 16z"/><polyline points="3.27 6.96 12 12.01 20.73 6.96"/><line x1="12" y1="22.08" x2="12" y2="12"/></svg>"#;

const CODE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="12" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2.5" stroke-linecap="round" stroke-linejoin="round"><polyline points="16 18 22 12 16 6"/><polyline points="8 6 2 12 8 18"/></svg>"#;

const CODE_EXTENSIONS: &[&str] = &["cc", "hh", "java", "py", "cpp", "c++"];

/// What an anchor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Pdf,
    Zip,
    Code,
    /// Placeholder links the upstream emits for deleted files
    Trash,
    Plain,
}

/// Classify a resolved link.
///
/// File types come from the lowercased path; trash markers are searched in
/// the whole lowercased URL. Precedence is Pdf, Zip, Code, Trash.
pub fn classify_link(url: &Url, trash_markers: &[String]) -> LinkKind {
    let path = url.path().to_ascii_lowercase();
    let file = path.rsplit('/').next().unwrap_or_default();
    let extension = file.rsplit_once('.').map(|(_, ext)| ext);

    if extension == Some("pdf") || path.ends_with("/pdf") {
        LinkKind::Pdf
    } else if extension == Some("zip") || path.ends_with("/zip") {
        LinkKind::Zip
    } else if extension.is_some_and(|ext| CODE_EXTENSIONS.contains(&ext)) {
        LinkKind::Code
    } else if is_trash(url, trash_markers) {
        LinkKind::Trash
    } else {
        LinkKind::Plain
    }
}

fn is_trash(url: &Url, markers: &[String]) -> bool {
    let lowered = url.as_str().to_ascii_lowercase();
    markers
        .iter()
        .any(|m| !m.is_empty() && lowered.contains(&m.to_ascii_lowercase()))
}

/// Replacement content for a file link.
#[derive(Debug, Clone)]
struct Badge {
    class: &'static str,
    content: Fragment,
}

impl Badge {
    fn new(class: &'static str, label: &'static str, svg: &str, icon_class: &str) -> Result<Self> {
        let mut content = Fragment::parse(&format!("{svg}<span>{label}</span>"), None);
        let mut has_icon = false;
        content.edit(|el| {
            if el.is("svg") {
                el.set_attr("class", icon_class);
                has_icon = true;
            }
            Edit::Keep
        });
        if !has_icon {
            return Err(AppError::config(format!("badge icon for {label} did not parse")));
        }
        Ok(Self { class, content })
    }

    fn apply(&self, anchor: &mut ElementMut<'_>) {
        anchor.add_class(BADGE_CLASS);
        anchor.add_class(self.class);
        anchor.replace_children(&self.content);
    }
}

fn is_badge(element: &Element) -> bool {
    element.name() == "a"
        && element
            .attr("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == BADGE_CLASS))
}

/// Rewrites statement fragments for embedding.
pub struct Normalizer {
    upstream: UpstreamConfig,
    site: Url,
    strip: Selector,
    rules: NormalizeConfig,
    pdf: Badge,
    zip: Badge,
    code: Badge,
}

impl Normalizer {
    pub fn new(config: &Config) -> Result<Self> {
        let site = Url::parse(&format!(
            "{}/",
            config.upstream.site_url.trim_end_matches('/')
        ))?;
        let strip = Selector::parse(&config.normalize.strip_selector).map_err(|e| {
            AppError::selector(&config.normalize.strip_selector, format!("{e:?}"))
        })?;
        let icon_class = &config.normalize.icon_class;

        Ok(Self {
            upstream: config.upstream.clone(),
            site,
            strip,
            rules: config.normalize.clone(),
            pdf: Badge::new("pdf", "PDF", PDF_ICON, icon_class)?,
            zip: Badge::new("zip", "ZIP", ZIP_ICON, icon_class)?,
            code: Badge::new("code", "CODI", CODE_ICON, icon_class)?,
        })
    }

    /// Normalize a raw fragment fetched for `id`.
    pub fn normalize(&self, html: &str, id: &ProblemId) -> String {
        let base = self.base_url(id);
        let mut fragment = Fragment::parse(html, Some(&self.strip));

        fragment.edit(|el| {
            if el.is("img") {
                self.rewrite_image(el, &base)
            } else {
                Edit::Keep
            }
        });
        fragment.edit(|el| {
            if el.is("a") {
                self.rewrite_anchor(el, &base)
            } else {
                Edit::Keep
            }
        });
        fragment.prune_empty(KEEP_WHEN_EMPTY, is_badge);

        fragment.to_html()
    }

    /// Relative URLs resolve against the canonical problem page.
    fn base_url(&self, id: &ProblemId) -> Url {
        self.site
            .join(&format!("problems/{id}"))
            .unwrap_or_else(|_| self.site.clone())
    }

    fn rewrite_image(&self, img: &mut ElementMut<'_>, base: &Url) -> Edit {
        let Some(src) = img.attr("src").and_then(|s| resolve_image(base, s)) else {
            return Edit::Remove;
        };
        let lowered = src.as_str().to_ascii_lowercase();
        if self
            .rules
            .legacy_icon_markers
            .iter()
            .any(|m| !m.is_empty() && lowered.contains(&m.to_ascii_lowercase()))
        {
            return Edit::Remove;
        }
        img.set_attr("src", src.as_str());
        img.add_class(&self.rules.content_image_class);
        Edit::Keep
    }

    fn rewrite_anchor(&self, anchor: &mut ElementMut<'_>, base: &Url) -> Edit {
        if let Some(target) = anchor.attr("href").and_then(|h| self.problem_link(h)) {
            anchor.set_attr("href", &target);
        }
        let Some(href) = anchor.attr("href").and_then(|h| resolve_link(base, h)) else {
            return Edit::Unwrap;
        };
        anchor.set_attr("href", href.as_str());
        anchor.set_attr("target", "_blank");

        let badge = match classify_link(&href, &self.rules.trash_markers) {
            LinkKind::Pdf => &self.pdf,
            LinkKind::Zip => &self.zip,
            LinkKind::Code => &self.code,
            LinkKind::Trash => return Edit::Remove,
            LinkKind::Plain => {
                if anchor.contains("img") {
                    anchor.add_class(&self.rules.image_link_class);
                } else {
                    anchor.add_class(&self.rules.text_link_class);
                }
                return Edit::Keep;
            }
        };
        badge.apply(anchor);
        Edit::Keep
    }

    /// `problem://host/P12345_ca.pdf` becomes the page of `P12345_ca`.
    fn problem_link(&self, href: &str) -> Option<String> {
        let rest = href.trim().strip_prefix(PROBLEM_SCHEME)?;
        let last = rest.rsplit('/').next()?;
        let name = last.split('.').next()?;
        let id = ProblemId::parse(name).ok()?;
        Some(self.upstream.problem_url(id.as_str()))
    }
}
