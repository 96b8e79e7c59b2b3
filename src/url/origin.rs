use crate::UrlError;
use std::fmt;
use url::Url;

/// Scheme + host + port of a URL, the unit of politeness serialization
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

impl Origin {
    /// Derives the origin of a URL
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use toytoons_scraper::url::Origin;
    ///
    /// let origin = Origin::of(&Url::parse("https://Example.com/a/b").unwrap()).unwrap();
    /// assert_eq!(origin.to_string(), "https://example.com:443");
    /// ```
    pub fn of(url: &Url) -> Result<Self, UrlError> {
        let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| UrlError::InvalidScheme(url.scheme().to_string()))?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Location of this origin's robots.txt
    pub fn robots_url(&self) -> Result<Url, UrlError> {
        Url::parse(&format!("{}/robots.txt", self.base()))
            .map_err(|e| UrlError::Parse(e.to_string()))
    }

    fn base(&self) -> String {
        let default_port = match self.scheme.as_str() {
            "http" => 80,
            "https" => 443,
            _ => 0,
        };
        if self.port == default_port {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
