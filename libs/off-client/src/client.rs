use crate::{
    ClientConfig, ConfigError,
    card::DisplayCard,
    errors::{OffError, Result},
    models::{
        CategorySearch, DataSubmission, ProductEnvelope, ProductLookup, ProductRecord,
        QueryRequest, SearchEnvelope, SearchResult,
    },
    query::{fields_param, normalize_category},
};
use reqwest::{Client as HttpClient, Url};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

const SUBMIT_PATH: &str = "/cgi/product_jqm2.pl";

/// Result of one executed [`QueryRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Product(ProductRecord),
    Search(SearchResult),
    Submitted(Value),
}

/// Thin client for the remote product database. Each call issues exactly one
/// HTTP request and never retries.
#[derive(Debug, Clone)]
pub struct OffClient {
    http: HttpClient,
    base_url: String,
    base: Url,
}

impl OffClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        let base = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidVariable {
            name: "OFF_BASE_URL".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            base,
        })
    }

    /// Product-lookup URL with the barcode encoded as a single path segment.
    fn product_url(&self, barcode: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| OffError::NotFound(format!("cannot build lookup URL for {}", barcode)))?
            .pop_if_empty()
            .extend(["api", "v2", "product", barcode]);
        Ok(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Projects a record with brand links pointing at this client's site.
    pub fn card(&self, record: &ProductRecord) -> DisplayCard {
        DisplayCard::project(record, &self.base_url)
    }

    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        match request {
            QueryRequest::FetchByBarcode(lookup) => {
                self.fetch_product(lookup).await.map(QueryOutcome::Product)
            }
            QueryRequest::SearchByCategory(search) => self
                .search_by_category(search)
                .await
                .map(QueryOutcome::Search),
            QueryRequest::SubmitData(submission) => self
                .submit_data(submission)
                .await
                .map(QueryOutcome::Submitted),
        }
    }

    #[instrument(skip(self, lookup), fields(code = %lookup.barcode.trim()))]
    pub async fn fetch_product(&self, lookup: &ProductLookup) -> Result<ProductRecord> {
        lookup.validate().map_err(|e| {
            warn!("Rejected product lookup: {}", e);
            OffError::from(e)
        })?;

        let barcode = lookup.barcode.trim();
        let url = self.product_url(barcode)?;
        let fields = fields_param(&lookup.fields);
        debug!("Fetching product from: {} (fields: {})", url, fields);

        let resp = self
            .http
            .get(url)
            .query(&[("fields", fields.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Product lookup request failed: {}", e);
                OffError::NotFound(format!("request for {} failed: {}", barcode, e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Product lookup returned status {}", status);
            return Err(OffError::NotFound(format!(
                "lookup of {} returned status {}",
                barcode,
                status.as_u16()
            )));
        }

        let envelope = resp.json::<ProductEnvelope>().await.map_err(|e| {
            error!("Failed to deserialize product lookup JSON: {}", e);
            OffError::NotFound(format!("unreadable response for {}: {}", barcode, e))
        })?;

        let found = envelope.is_found();
        match envelope.product {
            Some(product) if found => {
                info!("Product found ({} fields)", product.len());
                Ok(product)
            }
            _ => {
                info!("Product not found");
                Err(OffError::NotFound(format!(
                    "no product with barcode {}",
                    barcode
                )))
            }
        }
    }

    #[instrument(skip(self, search), fields(category = %search.category.trim()))]
    pub async fn search_by_category(&self, search: &CategorySearch) -> Result<SearchResult> {
        search.validate().map_err(|e| {
            warn!("Rejected category search: {}", e);
            OffError::from(e)
        })?;

        let url = format!("{}/api/v2/search", self.base_url);
        let mut params = vec![
            ("categories_tags_en", normalize_category(&search.category)),
            ("fields", fields_param(&search.fields)),
        ];
        if let Some(grade) = search.grade {
            params.push(("nutrition_grades_tags", grade.to_string()));
        }
        debug!("Searching products at: {} with {:?}", url, params);

        let resp = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Search request failed: {}", e);
                OffError::Search(format!("request failed: {}", e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Search returned status {}", status);
            return Err(OffError::Search(format!(
                "upstream returned status {}",
                status.as_u16()
            )));
        }

        let envelope = resp.json::<SearchEnvelope>().await.map_err(|e| {
            error!("Failed to deserialize search JSON: {}", e);
            OffError::Search(format!("unreadable response: {}", e))
        })?;
        let result = SearchResult::from(envelope);
        info!(
            "Search matched {} products ({} returned)",
            result.count,
            result.products.len()
        );
        Ok(result)
    }

    /// Writes nutrient values to the shared database. Not idempotent, so it is
    /// sent once and any failure is returned as is.
    #[instrument(skip(self, submission), fields(code = %submission.barcode.trim(), user_id = %submission.user_id))]
    pub async fn submit_data(&self, submission: &DataSubmission) -> Result<Value> {
        submission.validate().map_err(|e| {
            warn!("Rejected data submission: {}", e);
            OffError::from(e)
        })?;

        let url = format!("{}{}", self.base_url, SUBMIT_PATH);
        let form = submission_form(submission);
        debug!(
            "Submitting {} nutrient updates to: {}",
            submission.nutrient_updates.len(),
            url
        );

        let resp = self.http.post(&url).form(&form).send().await.map_err(|e| {
            error!("Submission request failed: {}", e);
            OffError::Submission(format!("request failed: {}", e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Submission returned status {}", status);
            return Err(OffError::Submission(format!(
                "upstream returned status {}",
                status.as_u16()
            )));
        }

        let body = resp.text().await.map_err(|e| {
            error!("Failed to read submission response: {}", e);
            OffError::Submission(format!("unreadable response: {}", e))
        })?;
        info!("Submission accepted");
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn submission_form(submission: &DataSubmission) -> Vec<(String, String)> {
    let mut form = vec![
        ("user_id".to_string(), submission.user_id.clone()),
        ("password".to_string(), submission.password.clone()),
        ("code".to_string(), submission.barcode.trim().to_string()),
    ];
    for (name, update) in &submission.nutrient_updates {
        let name = name.trim();
        form.push((format!("nutriment_{}", name), update.value.to_string()));
        form.push((format!("nutriment_{}_unit", name), update.unit.clone()));
    }
    form
}
