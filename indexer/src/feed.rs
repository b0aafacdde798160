//! RSS ingestion: turns `<item>` elements into [`Document`]s for the index builder.

use anyhow::{anyhow, Context, Result};
use feedsearch_core::Document;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;
use walkdir::WalkDir;

lazy_static! {
    static ref ITEM_RE: Regex = Regex::new(r"(?is)<item\b[^>]*>(.*?)</item\s*>").expect("valid regex");
    static ref TITLE_RE: Regex = Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid regex");
    static ref DESCRIPTION_RE: Regex = Regex::new(r"(?is)<description\b[^>]*>(.*?)</description\s*>").expect("valid regex");
    static ref PUBDATE_RE: Regex = Regex::new(r"(?is)<pubDate\b[^>]*>(.*?)</pubDate\s*>").expect("valid regex");
    static ref CDATA_RE: Regex = Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid regex");
    static ref SPACE_RE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref OBS_ZONE_RE: Regex = Regex::new(r"\s+(?:GMT|UTC?|Z)$").expect("valid regex");
}

/// Feed files under `input`: the file itself, or every `*.xml` / `*.rss` below a directory in name order.
pub fn collect_feed_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(anyhow!("input {} does not exist", input.display()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() {
            if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                if matches!(ext.to_ascii_lowercase().as_str(), "xml" | "rss") {
                    files.push(p.to_path_buf());
                }
            }
        }
    }
    Ok(files)
}

/// Every item of every feed file, in order. A file that cannot be read yields one error in its place.
pub fn read_feeds(files: &[PathBuf]) -> impl Iterator<Item = Result<Document>> + '_ {
    files.iter().flat_map(|file| {
        let items: Vec<Result<Document>> = match fs::read_to_string(file) {
            Ok(xml) => {
                let items: Vec<_> = parse_items(&xml)
                    .map(|r| r.with_context(|| format!("in {}", file.display())))
                    .collect();
                tracing::debug!(file = %file.display(), items = items.len(), "read feed");
                items
            }
            Err(e) => vec![Err(anyhow::Error::new(e).context(format!("failed to read {}", file.display())))],
        };
        items
    })
}

/// Parse the `<item>` elements of one RSS document.
pub fn parse_items(xml: &str) -> impl Iterator<Item = Result<Document>> + '_ {
    ITEM_RE.captures_iter(xml).enumerate().map(|(n, caps)| parse_item(&caps[1]).with_context(|| format!("item {n}")))
}

fn parse_item(body: &str) -> Result<Document> {
    let title = element_text(&TITLE_RE, body).unwrap_or_default();
    let description = element_text(&DESCRIPTION_RE, body).unwrap_or_default();
    let raw_date = element_text(&PUBDATE_RE, body).ok_or_else(|| anyhow!("missing <pubDate>"))?;
    let published = parse_pub_date(&raw_date)?;
    Ok(Document::new(title, description, published))
}

/// Plain text of an element. CDATA sections carry HTML as is, the text between
/// them carries it XML-escaped; both end up as one HTML fragment.
fn element_text(re: &Regex, body: &str) -> Option<String> {
    let inner = re.captures(body)?.get(1)?.as_str();
    let mut html = String::with_capacity(inner.len());
    let mut last = 0;
    for caps in CDATA_RE.captures_iter(inner) {
        let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else { continue };
        html.push_str(&fragment_text(&inner[last..whole.start()]));
        html.push_str(content.as_str());
        last = whole.end();
    }
    html.push_str(&fragment_text(&inner[last..]));
    Some(html_text(&html))
}

/// Text content of an HTML fragment: tags dropped, entities decoded, whitespace collapsed.
pub fn html_text(fragment: &str) -> String {
    SPACE_RE.replace_all(fragment_text(fragment).trim(), " ").into_owned()
}

// Text nodes are joined with spaces so adjacent block elements don't glue words together.
fn fragment_text(fragment: &str) -> String {
    if !fragment.contains(['<', '&']) {
        return fragment.to_string();
    }
    let doc = Html::parse_fragment(fragment);
    let text: Vec<&str> = doc.root_element().text().collect();
    text.join(" ")
}

/// RFC 2822 as used by `<pubDate>`, accepting obsolete zone names, with RFC 3339 as a fallback.
pub fn parse_pub_date(raw: &str) -> Result<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc2822) {
        return Ok(t);
    }
    let numeric_zone = OBS_ZONE_RE.replace(raw, " +0000");
    if let Ok(t) = OffsetDateTime::parse(&numeric_zone, &Rfc2822) {
        return Ok(t);
    }
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("unrecognized pubDate {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsearch_core::tokenizer::tokenize;
    use time::macros::datetime;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>World news</title>
  <item>
    <title>Kim Jong-il dies, N. Korea &amp; region react</title>
    <description><![CDATA[<p>State media <b>confirms</b> the death.</p>]]></description>
    <pubDate>Mon, 19 Dec 2011 03:52:12 GMT</pubDate>
  </item>
  <item>
    <title><![CDATA[US dawn raid]]></title>
    <description>&lt;a href="x"&gt;American&lt;/a&gt; confession &#38; plan</description>
    <pubDate>Sun, 18 Dec 2011 21:00:00 +0200</pubDate>
  </item>
</channel></rss>"#;

    #[test]
    fn parses_items_in_order() {
        let docs: Vec<Document> = parse_items(FEED).collect::<Result<_>>().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Kim Jong-il dies, N. Korea & region react");
        assert_eq!(docs[0].description, "State media confirms the death.");
        assert_eq!(docs[0].published, datetime!(2011-12-19 03:52:12 UTC));
        assert_eq!(docs[1].title, "US dawn raid");
        assert_eq!(docs[1].description, "American confession & plan");
        assert_eq!(docs[1].published, datetime!(2011-12-18 21:00 +02:00));
    }

    #[test]
    fn channel_title_is_not_an_item() {
        let docs: Vec<_> = parse_items("<rss><channel><title>x</title></channel></rss>").collect();
        assert!(docs.is_empty());
    }

    #[test]
    fn missing_or_bad_date_is_an_item_error() {
        let xml = "<item><title>a</title></item><item><title>b</title><pubDate>yesterday</pubDate></item>";
        let items: Vec<_> = parse_items(xml).collect();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|r| r.is_err()));
    }

    #[test]
    fn missing_text_fields_are_empty() {
        let xml = "<item><pubDate>2011-12-18T10:00:00Z</pubDate></item>";
        let doc = parse_items(xml).next().unwrap().unwrap();
        assert_eq!(doc.title, "");
        assert_eq!(doc.description, "");
        assert_eq!(doc.published, datetime!(2011-12-18 10:00 UTC));
    }

    #[test]
    fn decodes_html_entities_in_cdata_and_escaped_text() {
        let xml = "<item><title>Tom &amp;amp; Jerry</title>\
            <description><![CDATA[<p>Caf&eacute; &amp; bar&nbsp;open &#8217;s</p>]]></description>\
            <pubDate>Sun, 18 Dec 2011 10:00:00 +0000</pubDate></item>\
            <item><title>Caf&amp;eacute; news</title>\
            <description>&lt;b&gt;Caf&amp;eacute;&lt;/b&gt;&amp;nbsp;&amp;#8217;s</description>\
            <pubDate>Sun, 18 Dec 2011 11:00:00 +0000</pubDate></item>";
        let docs: Vec<Document> = parse_items(xml).collect::<Result<_>>().unwrap();
        assert_eq!(docs[0].title, "Tom & Jerry");
        assert_eq!(tokenize(&docs[0].title), vec!["tom", "jerry"]);
        assert_eq!(docs[1].title, "Caf\u{e9} news");
        for doc in &docs {
            let words = tokenize(&doc.description);
            assert!(words.contains(&"caf\u{e9}".to_string()), "{words:?}");
            for junk in ["nbsp", "eacute", "8217", "amp", "caf", "p", "b"] {
                assert!(!words.iter().any(|w| w == junk), "{junk} leaked into {words:?}");
            }
        }
    }

    #[test]
    fn keeps_text_around_cdata_sections() {
        let xml = "<item><description>Lead &amp; <![CDATA[<i>first</i>]]> middle <![CDATA[last]]></description>\
            <pubDate>2011-12-18T10:00:00Z</pubDate></item>";
        let doc = parse_items(xml).next().unwrap().unwrap();
        assert_eq!(doc.description, "Lead & first middle last");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(html_text("  Kim   visits\nKorea "), "Kim visits Korea");
        assert_eq!(html_text("a &lt; b"), "a < b");
    }

    #[test]
    fn collects_feed_files_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.rss"), FEED).unwrap();
        fs::write(dir.path().join("a.xml"), FEED).unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        let files = collect_feed_files(dir.path()).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(names, vec!["a.xml", "b.rss"]);
        assert_eq!(read_feeds(&files).count(), 4);
    }
}
