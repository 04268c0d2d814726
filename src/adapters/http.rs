use crate::domain::model::{Category, CategoryId, Domain, FlatMapData, Location, MapConfig};
use crate::domain::ports::{
    ConfigProvider, LocationSource, DEFAULT_CATEGORIES_ENDPOINT, DEFAULT_DOMAINS_ENDPOINT,
    DEFAULT_LOCATIONS_ENDPOINT, DEFAULT_MAP_CONFIG_ENDPOINT, DEFAULT_MAP_DATA_ENDPOINT,
    DEFAULT_SEARCH_ENDPOINT,
};
use crate::domain::wire::{
    CategoriesResponse, DomainsResponse, FeatureCollection, FlatMapDataDto, MapConfigDto,
    SearchResponse,
};
use crate::utils::error::{MapError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub domains: String,
    pub categories: String,
    pub locations: String,
    pub search: String,
    pub map_config: String,
    pub map_data: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            domains: DEFAULT_DOMAINS_ENDPOINT.to_string(),
            categories: DEFAULT_CATEGORIES_ENDPOINT.to_string(),
            locations: DEFAULT_LOCATIONS_ENDPOINT.to_string(),
            search: DEFAULT_SEARCH_ENDPOINT.to_string(),
            map_config: DEFAULT_MAP_CONFIG_ENDPOINT.to_string(),
            map_data: DEFAULT_MAP_DATA_ENDPOINT.to_string(),
        }
    }
}

/// Backend client over plain HTTP GET + JSON.
#[derive(Debug, Clone)]
pub struct HttpLocationSource {
    client: Client,
    base_url: Url,
    endpoints: Endpoints,
}

impl HttpLocationSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: Self::parse_base_url(base_url)?,
            endpoints: Endpoints::default(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds() {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: Self::parse_base_url(config.base_url())?,
            endpoints: Endpoints {
                domains: config.domains_endpoint().to_string(),
                categories: config.categories_endpoint().to_string(),
                locations: config.locations_endpoint().to_string(),
                search: config.search_endpoint().to_string(),
                map_config: config.map_config_endpoint().to_string(),
                map_data: config.map_data_endpoint().to_string(),
            },
        })
    }

    /// A trailing slash keeps a prefix such as `/maps` when endpoints are joined.
    fn parse_base_url(raw: &str) -> Result<Url> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Endpoint paths resolve under the base URL's path, not the host root.
    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// URL of the location feed for a domain and an ordered category list.
    pub fn locations_url(&self, domain_id: &str, category_ids: &[CategoryId]) -> Result<Url> {
        let mut url = self.url(&self.endpoints.locations)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("domain", domain_id);
            for (index, category_id) in category_ids.iter().enumerate() {
                query.append_pair(&format!("categories[{}]", index), category_id);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("Making API request to: {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(MapError::Backend {
                endpoint: url.path().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl LocationSource for HttpLocationSource {
    async fn fetch_domains(&self) -> Result<Option<Vec<Domain>>> {
        let response: DomainsResponse = self.get_json(self.url(&self.endpoints.domains)?).await?;
        Ok(response
            .domains
            .map(|domains| domains.into_iter().map(Domain::from).collect()))
    }

    async fn fetch_categories(&self, domain_id: &str) -> Result<Option<Vec<Category>>> {
        let mut url = self.url(&self.endpoints.categories)?;
        url.query_pairs_mut().append_pair("domain", domain_id);

        let response: CategoriesResponse = self.get_json(url).await?;
        Ok(response
            .categories
            .map(|categories| categories.into_iter().map(Category::from).collect()))
    }

    async fn fetch_locations(
        &self,
        domain_id: &str,
        category_ids: &[CategoryId],
    ) -> Result<Option<Vec<Location>>> {
        let url = self.locations_url(domain_id, category_ids)?;
        let response: FeatureCollection = self.get_json(url).await?;
        Ok(response
            .features
            .map(|features| features.into_iter().map(Location::from).collect()))
    }

    async fn search_locations(
        &self,
        query: &str,
        domain_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Location>> {
        let mut url = self.url(&self.endpoints.search)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(domain_id) = domain_id {
                pairs.append_pair("domain", domain_id);
            }
            pairs.append_pair("limit", &limit.to_string());
        }

        let response: SearchResponse = self.get_json(url).await?;
        Ok(response.locations.into_iter().map(Location::from).collect())
    }

    async fn fetch_map_config(&self) -> Result<MapConfig> {
        let dto: MapConfigDto = self.get_json(self.url(&self.endpoints.map_config)?).await?;
        Ok(MapConfig::from(dto))
    }

    async fn fetch_map_data(&self) -> Result<FlatMapData> {
        let dto: FlatMapDataDto = self.get_json(self.url(&self.endpoints.map_data)?).await?;
        Ok(FlatMapData::from(dto))
    }
}
