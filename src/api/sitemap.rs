use axum::{
    Extension,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{api::AppState, management::Freshness, types::Book};

struct UrlEntry {
    loc: String,
    changefreq: &'static str,
    priority: &'static str,
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn render(entries: &[UrlEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str(&format!(
            "  <url><loc>{}</loc><changefreq>{}</changefreq><priority>{}</priority></url>\n",
            escape_xml(&entry.loc),
            entry.changefreq,
            entry.priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// `GET /sitemap.xml`
///
/// Books whose listing fails only contribute their book page.
pub async fn sitemap(Extension(state): Extension<AppState>) -> Response {
    let base = state.settings.site_url.trim_end_matches('/');

    let mut entries = vec![UrlEntry {
        loc: format!("{}/", base),
        changefreq: "weekly",
        priority: "1.0",
    }];
    entries.extend(Book::ALL.into_iter().map(|book| UrlEntry {
        loc: format!("{}/songs/{}", base, book),
        changefreq: "weekly",
        priority: "0.9",
    }));

    for book in Book::ALL {
        match state.catalog.list_songs(book).await {
            Ok(songs) => entries.extend(songs.into_iter().map(|song| UrlEntry {
                loc: format!("{}/songs/{}/{}", base, book, song.number),
                changefreq: "monthly",
                priority: "0.8",
            })),
            Err(e) => tracing::warn!(book = %book, error = %e, "sitemap without song pages"),
        }
    }

    (
        [
            (CONTENT_TYPE, "application/xml".to_string()),
            (CACHE_CONTROL, Freshness::LISTING.cache_control()),
        ],
        render(&entries),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_escaped_locations() {
        let xml = render(&[UrlEntry {
            loc: "http://x/songs/be/1&2".into(),
            changefreq: "monthly",
            priority: "0.8",
        }]);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>http://x/songs/be/1&amp;2</loc>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }
}
