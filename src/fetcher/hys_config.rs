//! "Have your Say" endpoint configuration
//!
//! All endpoints hang off the better-regulation portal:
//! <https://ec.europa.eu/info/law/better-regulation/>

/// Endpoint paths relative to a base URL
///
/// Kept as configuration so tests can point the client at a mock server while
/// reusing the production paths.
#[derive(Debug, Clone)]
pub struct HysEndpoints {
    /// Production base URL, including the trailing slash
    pub base_url: &'static str,

    /// Initiative short title (`?publicationId=`)
    pub short_title_endpoint: &'static str,

    /// Paginated feedback listing (`?publicationId=&page=&size=`)
    pub feedback_endpoint: &'static str,

    /// Feedback counts per country (`?publicationId=`)
    pub by_country_endpoint: &'static str,

    /// Feedback counts per category of respondent (`?publicationId=`)
    ///
    /// The typo in the path is the platform's.
    pub by_category_endpoint: &'static str,

    /// Attachment download, followed by the document id
    pub download_endpoint: &'static str,
}

/// Production endpoints of the better-regulation portal
pub const HYS_ENDPOINTS: HysEndpoints = HysEndpoints {
    base_url: "https://ec.europa.eu/info/law/better-regulation/",
    short_title_endpoint: "brpapi/shortTitleByPublicationId",
    feedback_endpoint: "brpapi/allFeedback",
    by_country_endpoint: "brpapi/feedBackByCountry",
    by_category_endpoint: "brpapi/feedbackByCategorOfRespondent",
    download_endpoint: "api/download/",
};

/// Join a base URL and an endpoint path with exactly one slash between them
pub fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
