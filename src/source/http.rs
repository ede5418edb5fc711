//! A blocking HTTP client for the contact service.
//!
//! The service exposes three JSON endpoints below a base URL:
//!
//! - `GET {base}/summary`: the dataset [`Summary`].
//! - `GET {base}/contacts`: `{"items": [[a, b, value], ...]}`.
//! - `GET {base}/fragments`: `{"items": [{"start", "stop", "fragmentId"}, ...]}`.
//!
//! Any response carrying an `error` field is turned into a fetch error.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::contact::ContactQuery;
use crate::contact::ContactTuple;
use crate::contact::Region;
use crate::coordinate::fragment::Fragment;
use crate::coordinate::fragment::FragmentQuery;
use crate::resolution::ResolutionRequest;
use crate::source;
use crate::source::Source;
use crate::summary::Summary;

/// The body of a list response.
#[derive(Debug, Deserialize)]
struct Items<T> {
    /// The items.
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// The part of any response that reports a failure.
#[derive(Debug, Deserialize)]
struct Failure {
    /// The message, if the request failed.
    #[serde(default)]
    error: Option<String>,
}

/// A blocking client for the contact service.
#[derive(Clone, Debug)]
pub struct Http {
    /// The HTTP client.
    client: Client,

    /// The base URL, without a trailing slash.
    base: String,
}

impl Http {
    /// Creates a client for the service rooted at `base`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::source::Http;
    ///
    /// let http = Http::new("http://localhost:8000/hic/");
    /// assert_eq!(http.base(), "http://localhost:8000/hic");
    /// ```
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base)
    }

    /// Creates a client from a preconfigured [`Client`].
    pub fn with_client(client: Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { client, base }
    }

    /// Gets the base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Performs a `GET` request and decodes the body.
    fn get<T>(&self, endpoint: &str, params: &[(&str, String)]) -> source::Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base, endpoint);
        debug!(%url, ?params, "GET");

        let text = self
            .client
            .get(&url)
            .query(params)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(source::Error::Http)?;

        if let Ok(Failure {
            error: Some(message),
        }) = serde_json::from_str::<Failure>(&text)
        {
            return Err(source::Error::Service(message));
        }

        serde_json::from_str(&text).map_err(source::Error::Json)
    }
}

/// Appends the parameters describing one side of a contact query.
fn region(params: &mut Vec<(&str, String)>, keys: [&'static str; 3], region: &Region) {
    let [chromosome, start, stop] = keys;
    params.push((chromosome, region.chromosome().to_string()));

    if let Some((from, to)) = region.window() {
        params.push((start, from.to_string()));
        params.push((stop, to.to_string()));
    }
}

/// Encodes a contact query as URL parameters.
fn contact_params(query: &ContactQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(12);

    region(&mut params, ["chrA", "startA", "stopA"], query.a());
    region(&mut params, ["chrB", "startB", "stopB"], query.b());

    params.push(("normalization", query.normalization().to_string()));
    params.push(("unit", query.resolution().unit().to_string()));
    params.push(("resolution", query.resolution().resolution().to_string()));

    if let ResolutionRequest::Fragment { a, b, .. } = query.resolution() {
        params.push(("fragmentMinA", a.min().to_string()));
        params.push(("fragmentMaxA", a.max().to_string()));
        params.push(("fragmentMinB", b.min().to_string()));
        params.push(("fragmentMaxB", b.max().to_string()));
    }

    params
}

impl Source for Http {
    fn summary(&self) -> source::Result<Summary> {
        self.get("summary", &[])
    }

    fn contacts(&self, query: &ContactQuery) -> source::Result<Vec<ContactTuple>> {
        self.get::<Items<ContactTuple>>("contacts", &contact_params(query))
            .map(|body| body.items)
    }

    fn fragments(&self, query: &FragmentQuery) -> source::Result<Vec<Fragment>> {
        let params = [
            ("enzyme", query.enzyme().to_string()),
            ("chr", query.chromosome().to_string()),
            ("start", query.start().to_string()),
            ("stop", query.stop().to_string()),
        ];

        self.get::<Items<Fragment>>("fragments", &params)
            .map(|body| body.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Normalization;
    use crate::coordinate::FragmentRange;
    use crate::genome::Locus;

    #[test]
    fn it_encodes_contact_queries() -> Result<(), Box<dyn std::error::Error>> {
        let x = Locus::try_new("chr1", 0, 5_000)?;
        let query = ContactQuery::regions(
            Region::from(&x),
            Region::whole("chr2"),
            Normalization::VcSqrt,
            ResolutionRequest::Fragment {
                resolution: 5,
                a: FragmentRange::new(3, 9),
                b: FragmentRange::new(0, 4),
            },
        );

        let params = contact_params(&query)
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>();

        assert_eq!(
            params,
            vec![
                "chrA=chr1",
                "startA=0",
                "stopA=5000",
                "chrB=chr2",
                "normalization=VC_SQRT",
                "unit=FRAG",
                "resolution=5",
                "fragmentMinA=3",
                "fragmentMaxA=9",
                "fragmentMinB=0",
                "fragmentMaxB=4",
            ]
        );
        Ok(())
    }

    #[test]
    fn it_decodes_list_bodies() -> Result<(), Box<dyn std::error::Error>> {
        let body = serde_json::from_str::<Items<ContactTuple>>(r#"{"items": [[0, 5000, 2]]}"#)?;
        assert_eq!(body.items, vec![ContactTuple::new(0, 5_000, 2.0)]);

        let body = serde_json::from_str::<Items<Fragment>>("{}")?;
        assert!(body.items.is_empty());

        let failure = serde_json::from_str::<Failure>(r#"{"error": "no such file"}"#)?;
        assert_eq!(failure.error.as_deref(), Some("no such file"));
        Ok(())
    }
}
