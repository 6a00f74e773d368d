use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{MetadataProvider, MovieDetails, PosterImage, SearchPage};
use crate::cache::{self, Cache};
use crate::config::MetadataConfig;

/// Search pages are short-lived, the upstream index changes often.
const SEARCH_TTL: Duration = Duration::from_secs(60 * 60);
/// Per-movie payloads are stable, keep them for a day.
const DETAILS_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const LOOKUP_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Empty and failed lookups expire sooner so a transient outage or a gap in
/// the upstream data gets retried within the hour.
const NEGATIVE_TTL: Duration = Duration::from_secs(60 * 60);

/// Caching, fail-soft facade over a [`MetadataProvider`].
///
/// Every read is cache-aside: check the cache, call the provider on a miss,
/// store the result. Provider failures are logged and degrade to empty
/// results; they never propagate to callers.
pub struct MetadataService {
    provider: Arc<dyn MetadataProvider>,
    cache: Arc<dyn Cache>,
    country: String,
    primary_language: String,
}

impl MetadataService {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        cache: Arc<dyn Cache>,
        config: &MetadataConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            country: config.country.clone(),
            primary_language: config.primary_language.clone(),
        }
    }

    /// Searches for movies by free text. Returns an empty page on failure.
    pub async fn search(&self, query: &str, page: u32) -> SearchPage {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return SearchPage::default();
        }

        let key = format!(
            "meta_search_{:x}_{}",
            md5::compute(trimmed.to_lowercase()),
            page
        );
        if let Some(cached) = cache::get_json::<SearchPage>(self.cache.as_ref(), &key) {
            return cached;
        }

        match self.provider.search(trimmed, page).await {
            Ok(result) => {
                let ttl = if result.results.is_empty() {
                    NEGATIVE_TTL
                } else {
                    SEARCH_TTL
                };
                cache::put_json(self.cache.as_ref(), &key, &result, ttl);
                result
            }
            Err(e) => {
                warn!(query = %trimmed, error = %e, "metadata search failed");
                SearchPage::default()
            }
        }
    }

    /// Fetches full details and merges in the IMDB id, the certification for
    /// the configured country and the director names. Each merge source fails
    /// soft independently: a dead credits endpoint still yields details, just
    /// without a director.
    pub async fn details(&self, movie_id: i64) -> Option<MovieDetails> {
        let key = format!("meta_movie_{movie_id}");
        if let Some(value) = self.cache.get(&key) {
            if value.is_null() {
                return None;
            }
            if let Ok(details) = serde_json::from_value(value) {
                return Some(details);
            }
        }

        let mut details = match self.provider.movie_details(movie_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(movie_id, error = %e, "metadata details lookup failed");
                self.cache
                    .set(&key, serde_json::Value::Null, NEGATIVE_TTL);
                return None;
            }
        };

        details.imdb_id = self.cross_reference(movie_id).await;
        details.certification = self.certification(movie_id).await;
        details.director = self.director(movie_id).await;

        cache::put_json(self.cache.as_ref(), &key, &details, DETAILS_TTL);
        Some(details)
    }

    /// Looks up the IMDB id for a movie.
    pub async fn cross_reference(&self, movie_id: i64) -> Option<String> {
        let key = format!("meta_external_{movie_id}");
        if let Some(value) = self.cache.get(&key) {
            return serde_json::from_value::<Option<String>>(value)
                .ok()
                .flatten();
        }

        let imdb_id = match self.provider.external_ids(movie_id).await {
            Ok(ids) => ids.imdb_id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!(movie_id, error = %e, "external id lookup failed");
                None
            }
        };

        let ttl = if imdb_id.is_some() { LOOKUP_TTL } else { NEGATIVE_TTL };
        cache::put_json(self.cache.as_ref(), &key, &imdb_id, ttl);
        imdb_id
    }

    /// Certification for the configured country: among that country's release
    /// entries, the first non-empty certification in source order wins.
    pub async fn certification(&self, movie_id: i64) -> Option<String> {
        let key = format!("meta_cert_{movie_id}");
        if let Some(value) = self.cache.get(&key) {
            return serde_json::from_value::<Option<String>>(value)
                .ok()
                .flatten();
        }

        let certification = match self.provider.release_dates(movie_id).await {
            Ok(releases) => releases
                .iter()
                .filter(|release| release.country.eq_ignore_ascii_case(&self.country))
                .flat_map(|release| release.certifications.iter())
                .map(|cert| cert.trim())
                .find(|cert| !cert.is_empty())
                .map(str::to_string),
            Err(e) => {
                warn!(movie_id, error = %e, "certification lookup failed");
                None
            }
        };

        let ttl = if certification.is_some() {
            LOOKUP_TTL
        } else {
            NEGATIVE_TTL
        };
        cache::put_json(self.cache.as_ref(), &key, &certification, ttl);
        certification
    }

    /// Director credit(s), joined with ", " when a movie has more than one.
    pub async fn director(&self, movie_id: i64) -> Option<String> {
        let key = format!("meta_credits_{movie_id}");
        if let Some(value) = self.cache.get(&key) {
            return serde_json::from_value::<Option<String>>(value)
                .ok()
                .flatten();
        }

        let director = match self.provider.credits(movie_id).await {
            Ok(credits) => {
                let names: Vec<&str> = credits
                    .crew
                    .iter()
                    .filter(|member| member.job == "Director")
                    .map(|member| member.name.as_str())
                    .collect();
                if names.is_empty() {
                    None
                } else {
                    Some(names.join(", "))
                }
            }
            Err(e) => {
                warn!(movie_id, error = %e, "credits lookup failed");
                None
            }
        };

        let ttl = if director.is_some() { LOOKUP_TTL } else { NEGATIVE_TTL };
        cache::put_json(self.cache.as_ref(), &key, &director, ttl);
        director
    }

    /// Poster variants, best first: the configured primary language ranks
    /// ahead of language-neutral posters, which rank ahead of everything
    /// else; ties break on descending vote average.
    pub async fn poster_images(&self, movie_id: i64) -> Vec<PosterImage> {
        let key = format!("meta_images_{movie_id}");
        if let Some(cached) = cache::get_json::<Vec<PosterImage>>(self.cache.as_ref(), &key) {
            return cached;
        }

        match self.provider.images(movie_id).await {
            Ok(images) => {
                let mut posters = images.posters;
                posters.sort_by(|a, b| {
                    language_rank(a.language.as_deref(), &self.primary_language)
                        .cmp(&language_rank(b.language.as_deref(), &self.primary_language))
                        .then_with(|| {
                            b.vote_average
                                .partial_cmp(&a.vote_average)
                                .unwrap_or(Ordering::Equal)
                        })
                });
                for poster in &mut posters {
                    poster.full_url = Some(self.provider.image_url(&poster.file_path));
                }
                let ttl = if posters.is_empty() {
                    NEGATIVE_TTL
                } else {
                    DETAILS_TTL
                };
                cache::put_json(self.cache.as_ref(), &key, &posters, ttl);
                posters
            }
            Err(e) => {
                warn!(movie_id, error = %e, "poster lookup failed");
                Vec::new()
            }
        }
    }

    pub fn poster_url(&self, path: &str) -> String {
        self.provider.image_url(path)
    }

    /// Downloads an image, or None when the fetch fails.
    pub async fn download_poster(&self, url: &str) -> Option<Vec<u8>> {
        match self.provider.download_image(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(url, error = %e, "poster download failed");
                None
            }
        }
    }
}

fn language_rank(language: Option<&str>, primary: &str) -> u8 {
    match language {
        Some(lang) if lang == primary => 0,
        None => 1,
        Some(_) => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::metadata::{CountryRelease, CrewMember, MovieCredits, MovieImages};
    use crate::testing::{fixtures, MockMetadataProvider};

    fn service_with(provider: MockMetadataProvider) -> (MetadataService, Arc<MockMetadataProvider>) {
        let provider = Arc::new(provider);
        let service = MetadataService::new(
            provider.clone(),
            Arc::new(MemoryCache::new()),
            &MetadataConfig::default(),
        );
        (service, provider)
    }

    #[tokio::test]
    async fn test_search_returns_results() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::movie_details(603, "The Matrix", 1999));
        let (service, _) = service_with(provider);

        let page = service.search("matrix", 1).await;
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].title, "The Matrix");
    }

    #[tokio::test]
    async fn test_search_blank_query_short_circuits() {
        let provider = MockMetadataProvider::new();
        let (service, provider) = service_with(provider);

        let page = service.search("   ", 1).await;
        assert!(page.results.is_empty());
        assert!(provider.search_queries().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_cached() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::movie_details(603, "The Matrix", 1999));
        let (service, provider) = service_with(provider);

        service.search("matrix", 1).await;
        service.search("matrix", 1).await;
        assert_eq!(provider.search_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_search_cache_key_includes_page() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::movie_details(603, "The Matrix", 1999));
        let (service, provider) = service_with(provider);

        service.search("matrix", 1).await;
        service.search("matrix", 2).await;
        assert_eq!(provider.search_queries().len(), 2);
    }

    #[tokio::test]
    async fn test_search_fails_soft_on_provider_error() {
        let provider = MockMetadataProvider::new();
        provider.set_next_error("boom");
        let (service, _) = service_with(provider);

        let page = service.search("matrix", 1).await;
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_details_merges_cross_endpoint_fields() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::movie_details(603, "The Matrix", 1999));
        provider.set_imdb_id(603, "tt0133093");
        provider.set_releases(
            603,
            vec![
                CountryRelease {
                    country: "US".to_string(),
                    certifications: vec!["R".to_string()],
                },
                CountryRelease {
                    country: "GB".to_string(),
                    certifications: vec!["".to_string(), " 15 ".to_string()],
                },
            ],
        );
        provider.set_credits(
            603,
            MovieCredits {
                crew: vec![
                    CrewMember {
                        name: "Lana Wachowski".to_string(),
                        job: "Director".to_string(),
                    },
                    CrewMember {
                        name: "Bill Pope".to_string(),
                        job: "Director of Photography".to_string(),
                    },
                    CrewMember {
                        name: "Lilly Wachowski".to_string(),
                        job: "Director".to_string(),
                    },
                ],
            },
        );
        let (service, _) = service_with(provider);

        let details = service.details(603).await.unwrap();
        assert_eq!(details.imdb_id.as_deref(), Some("tt0133093"));
        // first non-empty GB entry, trimmed, case preserved
        assert_eq!(details.certification.as_deref(), Some("15"));
        assert_eq!(
            details.director.as_deref(),
            Some("Lana Wachowski, Lilly Wachowski")
        );
    }

    #[tokio::test]
    async fn test_details_merge_sources_fail_independently() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::movie_details(603, "The Matrix", 1999));
        provider.set_imdb_id(603, "tt0133093");
        // no releases, no credits configured
        let (service, _) = service_with(provider);

        let details = service.details(603).await.unwrap();
        assert_eq!(details.imdb_id.as_deref(), Some("tt0133093"));
        assert_eq!(details.certification, None);
        assert_eq!(details.director, None);
    }

    #[tokio::test]
    async fn test_details_unknown_movie_is_none_and_negatively_cached() {
        let provider = MockMetadataProvider::new();
        let (service, provider) = service_with(provider);

        assert!(service.details(999).await.is_none());
        assert!(service.details(999).await.is_none());
        assert_eq!(provider.details_calls(), 1);
    }

    #[tokio::test]
    async fn test_details_cached_after_first_fetch() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::movie_details(603, "The Matrix", 1999));
        let (service, provider) = service_with(provider);

        service.details(603).await;
        service.details(603).await;
        assert_eq!(provider.details_calls(), 1);
    }

    #[tokio::test]
    async fn test_certification_ignores_other_countries() {
        let provider = MockMetadataProvider::new();
        provider.set_releases(
            603,
            vec![CountryRelease {
                country: "US".to_string(),
                certifications: vec!["PG-13".to_string()],
            }],
        );
        let (service, _) = service_with(provider);

        assert_eq!(service.certification(603).await, None);
    }

    #[tokio::test]
    async fn test_poster_images_sorted_and_resolved() {
        let provider = MockMetadataProvider::new();
        provider.set_images(
            603,
            MovieImages {
                posters: vec![
                    fixtures::poster("/de.jpg", Some("de"), 9.0),
                    fixtures::poster("/en_low.jpg", Some("en"), 3.0),
                    fixtures::poster("/neutral.jpg", None, 8.0),
                    fixtures::poster("/en_high.jpg", Some("en"), 7.0),
                ],
            },
        );
        let (service, _) = service_with(provider);

        let posters = service.poster_images(603).await;
        let paths: Vec<&str> = posters.iter().map(|p| p.file_path.as_str()).collect();
        assert_eq!(paths, vec!["/en_high.jpg", "/en_low.jpg", "/neutral.jpg", "/de.jpg"]);
        assert!(posters[0].full_url.as_deref().unwrap().ends_with("/en_high.jpg"));
    }
}
