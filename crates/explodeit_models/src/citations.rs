//! Grounding citation filtering.

/// Drop citations whose URL contains any of `ignored_markers`, keeping the
/// order of the rest.
///
/// Grounded responses cite the provider's own redirect and search hosts
/// alongside real sources; those are not useful attributions.
///
/// # Examples
///
/// ```
/// use explodeit_models::filter_citations;
///
/// let urls = vec![
///     "https://en.wikipedia.org/wiki/Escapement".to_string(),
///     "https://vertexaisearch.cloud.google.com/grounding-api-redirect/abc".to_string(),
/// ];
/// let kept = filter_citations(urls, &["vertexaisearch".to_string()]);
/// assert_eq!(kept, vec!["https://en.wikipedia.org/wiki/Escapement".to_string()]);
/// ```
pub fn filter_citations(urls: Vec<String>, ignored_markers: &[String]) -> Vec<String> {
    urls.into_iter()
        .filter(|url| !url.is_empty())
        .filter(|url| !ignored_markers.iter().any(|marker| url.contains(marker.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_duplicates_and_order() {
        let urls = vec!["https://b.org".to_string(), "https://a.org".to_string(), "https://b.org".to_string()];
        assert_eq!(filter_citations(urls.clone(), &[]), urls);
    }

    #[test]
    fn drops_empty_and_provider_urls() {
        let markers = ["google.com".to_string(), "googleusercontent".to_string()];
        let urls = vec![
            String::new(),
            "https://www.google.com/search?q=x".to_string(),
            "https://lh3.googleusercontent.com/img".to_string(),
            "https://britannica.com/topic".to_string(),
        ];
        assert_eq!(filter_citations(urls, &markers), vec!["https://britannica.com/topic".to_string()]);
    }
}
