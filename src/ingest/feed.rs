// src/ingest/feed.rs
//! RSS 2.0, RSS 1.0 (RDF) and Atom documents, reduced to [`FeedEntry`] in
//! document order.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;

use crate::ingest::types::FeedEntry;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

// `media:title`, `atom:link` etc. share local names with the plain elements,
// hence the lists.
#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(rename = "title", default)]
    titles: Vec<TextElem>,
    #[serde(rename = "link", default)]
    links: Vec<LinkElem>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // dc:date
    #[serde(rename = "date")]
    dc_date: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(rename = "title", default)]
    titles: Vec<TextElem>,
    #[serde(rename = "link", default)]
    links: Vec<LinkElem>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextElem {
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

/// RSS puts the URL in the text, Atom in `href`.
#[derive(Debug, Deserialize)]
struct LinkElem {
    #[serde(rename = "@href", default)]
    href: Option<String>,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Rdf,
    Atom,
}

/// Parse a feed body into entries, keeping document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let xml_clean = scrub_html_entities_for_xml(xml.trim_start_matches('\u{feff}'));
    let entries = match detect_format(&xml_clean)? {
        FeedFormat::Rss => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            rss.channel.item.into_iter().map(rss_entry).collect()
        }
        FeedFormat::Rdf => {
            let rdf: Rdf = from_str(&xml_clean).context("parsing rdf xml")?;
            rdf.item.into_iter().map(rss_entry).collect()
        }
        FeedFormat::Atom => {
            let atom: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            atom.entry.into_iter().map(atom_entry).collect()
        }
    };
    Ok(entries)
}

/// Look at the root element only; the namespace prefix is ignored.
pub fn detect_format(xml: &str) -> Result<FeedFormat> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("reading feed xml")? {
            Event::Start(e) | Event::Empty(e) => {
                let root = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                return match root.as_str() {
                    "rss" => Ok(FeedFormat::Rss),
                    "RDF" => Ok(FeedFormat::Rdf),
                    "feed" => Ok(FeedFormat::Atom),
                    other => bail!("unsupported feed root element <{other}>"),
                };
            }
            Event::Eof => bail!("feed document has no root element"),
            _ => {}
        }
    }
}

fn rss_entry(it: RssItem) -> FeedEntry {
    FeedEntry {
        title: first_text(it.titles),
        link: pick_link(it.links),
        published: non_empty(it.pub_date),
        updated: non_empty(it.dc_date).or_else(|| non_empty(it.updated)),
    }
}

fn atom_entry(it: AtomEntry) -> FeedEntry {
    FeedEntry {
        title: first_text(it.titles),
        link: pick_link(it.links),
        published: non_empty(it.published),
        updated: non_empty(it.updated),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn first_text(items: Vec<TextElem>) -> Option<String> {
    items.into_iter().find_map(|t| non_empty(t.value))
}

fn pick_link(links: Vec<LinkElem>) -> Option<String> {
    // Plain <link>url</link> first (RSS)
    if let Some(text) = links.iter().find_map(|l| non_empty(l.value.clone())) {
        return Some(text);
    }
    let alternate = links.iter().find(|l| {
        l.href.is_some()
            && l.rel
                .as_deref()
                .map(|r| r.eq_ignore_ascii_case("alternate"))
                .unwrap_or(true)
    });
    alternate
        .or_else(|| links.iter().find(|l| l.href.is_some()))
        .and_then(|l| non_empty(l.href.clone()))
}

/// Feeds regularly carry HTML entities that are not defined in XML. Known
/// ones are decoded (and re-escaped if they decode to markup), unknown ones
/// are kept as literal text. XML's own five pass through untouched.
fn scrub_html_entities_for_xml(s: &str) -> String {
    static RE_ENTITY: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE_ENTITY.get_or_init(|| regex::Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());
    re.replace_all(s, |caps: &regex::Captures| {
        let name = &caps[1];
        if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
            return caps[0].to_string();
        }
        let decoded = html_escape::decode_html_entities(&caps[0]);
        if decoded == caps[0] {
            format!("&amp;{name};")
        } else {
            html_escape::encode_text(&decoded).into_owned()
        }
    })
    .into_owned()
}
