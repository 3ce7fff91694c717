//! HTML extraction for Jobinja list and detail pages.
//!
//! All functions here are pure: they take page text and return owned data,
//! so `scraper::Html` (which is `!Send`) never crosses an await point.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::job::JobRecord;

/// Technical keywords searched for in the page body when a posting has no
/// skills box.
pub const FALLBACK_KEYWORDS: &[&str] = &[
    "python",
    "django",
    "docker",
    "react",
    "vue",
    "javascript",
    "sql",
    "mysql",
    "postgres",
    "linux",
    "rest",
    "api",
    "microsoft office",
    "office",
    "پشتیبانی",
];

const LINK_SELECTORS: &[&str] = &[
    "a.c-jobListView__titleLink",
    "li.o-listView__item a",
    "h2.o-listView__itemTitle a",
];

const TITLE_SELECTORS: &[&str] = &[
    "h1.c-jobView__title",
    "h1.c-jobSingle__title",
    "h1",
    "h2.c-jobView__title",
    "h2.o-jobView__title",
    "h2.o-listView__itemTitle",
    "h1[itemprop='title']",
];

const INFO_ITEM: &str = "li.c-infoBox__item";
const INFO_TITLE: &str = "h4.c-infoBox__itemTitle";
const META_ITEMS: &str =
    "ul.o-listView__itemComplementInfo li, ul.c-jobListView__meta li, div.c-jobView__meta li";
const BREADCRUMB: &str = ".c-jobView__breadcrumb a, .c-jobView__category, .c-jobView__meta a";
const NEXT_PAGE: &str = "a.c-pagination__next, a[rel='next']";

const SKILLS_TITLE: &str = "مهارت";
const CATEGORY_TITLE: &str = "دسته‌بندی شغلی";
const EDUCATION_TITLES: &[&str] = &["تحصیل", "مدرک", "تحصیلات"];

const MAX_SPLIT_SKILL_CHARS: usize = 80;
const MAX_SKILL_CHARS: usize = 200;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn city_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(تهران|اصفهان|شیراز|مشهد|کرج|ساری|رشت|تبریز)\b").expect("valid regex")
    })
}

fn work_type_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(تمام‌وقت|پاره‌وقت|پاره وقت|فریلنس|ساعتی|پاره)").expect("valid regex")
    })
}

fn skill_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[،,;•\-]").expect("valid regex"))
}

/// Text of an element with each fragment trimmed and concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

/// Text of an element with each non-empty fragment trimmed and joined by a space.
fn spaced_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First info-box item whose title contains any of `needles`, with its title text.
fn find_info_item<'a>(doc: &'a Html, needles: &[&str]) -> Option<(ElementRef<'a>, String)> {
    let item_sel = selector(INFO_ITEM);
    let title_sel = selector(INFO_TITLE);

    doc.select(&item_sel).find_map(|item| {
        let title = item.select(&title_sel).next()?;
        let title_text = stripped_text(title);
        needles
            .iter()
            .any(|n| title_text.contains(n))
            .then_some((item, title_text))
    })
}

/// Job detail links on a list page, resolved against `base` and deduplicated
/// in first-seen order.
pub fn extract_job_links(html: &str, base: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);

    for css in LINK_SELECTORS {
        let sel = selector(css);
        let mut seen = HashSet::new();
        let links: Vec<Url> = doc
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| base.join(href.trim()).ok())
            .filter(|url| seen.insert(url.clone()))
            .collect();

        if !links.is_empty() {
            return links;
        }
    }
    Vec::new()
}

pub fn find_next_page_link(html: &str, base: &Url) -> Option<Url> {
    let doc = Html::parse_document(html);
    let sel = selector(NEXT_PAGE);
    doc.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| base.join(href.trim()).ok())
}

/// Required skills of a posting. Prefers the skills info box; falls back to
/// keyword spotting over the whole page text.
pub fn extract_required_skills(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    skills_from_document(&doc)
}

fn skills_from_document(doc: &Html) -> Vec<String> {
    let mut skills = Vec::new();

    if let Some((item, title_text)) = find_info_item(doc, &[SKILLS_TITLE]) {
        let tags_sel = selector("div.tags");
        let span_sel = selector("span");
        match item.select(&tags_sel).next() {
            Some(tags) => {
                skills.extend(
                    tags.select(&span_sel)
                        .map(stripped_text)
                        .filter(|t| !t.is_empty()),
                );
            }
            None => {
                let text = spaced_text(item).replacen(&title_text, "", 1);
                skills.extend(
                    skill_separator()
                        .split(&text)
                        .map(str::trim)
                        .filter(|p| !p.is_empty() && p.chars().count() < MAX_SPLIT_SKILL_CHARS)
                        .map(str::to_string),
                );
            }
        }
    }

    if skills.is_empty() {
        let body = doc.root_element().text().collect::<Vec<_>>().join(" ").to_lowercase();
        skills.extend(
            FALLBACK_KEYWORDS
                .iter()
                .filter(|kw| body.contains(*kw))
                .map(|kw| kw.to_string()),
        );
    }

    normalize_skills(skills)
}

/// Collapses whitespace, drops empty or oversized entries, and removes
/// duplicates keeping the first occurrence.
pub fn normalize_skills<I>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .map(|s| collapse_whitespace(&s))
        .filter(|s| !s.is_empty() && s.chars().count() < MAX_SKILL_CHARS)
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Parses a job detail page into a `JobRecord`. Missing fields are empty.
pub fn extract_job_details(html: &str, url: &Url) -> JobRecord {
    let doc = Html::parse_document(html);

    JobRecord {
        job_title: extract_title(&doc),
        category: extract_category(&doc),
        min_education: extract_education(&doc),
        location: extract_meta(&doc, city_pattern()),
        work_type: extract_meta(&doc, work_type_pattern()),
        skills: skills_from_document(&doc),
        url: url.to_string(),
    }
}

fn extract_title(doc: &Html) -> String {
    TITLE_SELECTORS
        .iter()
        .find_map(|css| {
            let sel = selector(css);
            doc.select(&sel)
                .next()
                .map(stripped_text)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_default()
}

fn extract_category(doc: &Html) -> String {
    if let Some((item, _)) = find_info_item(doc, &[CATEGORY_TITLE]) {
        let span_sel = selector("div.tags span");
        let parts: Vec<String> = item
            .select(&span_sel)
            .map(stripped_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(" > ");
        }
    }

    let sel = selector(BREADCRUMB);
    doc.select(&sel)
        .map(stripped_text)
        .filter(|t| !t.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(" > ")
}

fn extract_education(doc: &Html) -> String {
    find_info_item(doc, EDUCATION_TITLES)
        .map(|(item, title_text)| spaced_text(item).replacen(&title_text, "", 1).trim().to_string())
        .unwrap_or_default()
}

/// Last meta line matching `pattern`.
fn extract_meta(doc: &Html, pattern: &Regex) -> String {
    let sel = selector(META_ITEMS);
    doc.select(&sel)
        .map(spaced_text)
        .filter(|t| pattern.is_match(t))
        .last()
        .unwrap_or_default()
}
