use review_core::CountryLookup;

/// Address-prefix table standing in for a real geolocation service.
#[derive(Debug, Clone)]
pub struct PrefixCountryLookup {
    prefixes: Vec<(String, String)>,
    fallback: String,
}

impl PrefixCountryLookup {
    pub fn new(
        prefixes: impl IntoIterator<Item = (String, String)>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
            fallback: fallback.into(),
        }
    }
}

impl Default for PrefixCountryLookup {
    fn default() -> Self {
        Self::new(
            [
                ("192.168.1.", "Ukraine"),
                ("10.0.0.", "Poland"),
                ("172.16.0.", "Spain"),
            ]
            .map(|(p, c)| (p.to_string(), c.to_string())),
            "Unknown",
        )
    }
}

impl CountryLookup for PrefixCountryLookup {
    fn country_for(&self, ip: &str) -> Option<String> {
        let country = self
            .prefixes
            .iter()
            .find(|(prefix, _)| ip.starts_with(prefix.as_str()))
            .map(|(_, country)| country.as_str())
            .unwrap_or(&self.fallback);
        Some(country.to_string())
    }
}
