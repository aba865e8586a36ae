use crate::domain::currency::Cryptocurrency;

/// A destination address a contributor wrote into a pull request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAddress {
    pub currency: Cryptocurrency,
    /// The full `SYMBOL{...}` text that matched, when one did.
    pub raw_text_match: Option<String>,
    pub address: Option<String>,
}

impl CandidateAddress {
    pub fn absent(currency: Cryptocurrency) -> Self {
        Self {
            currency,
            raw_text_match: None,
            address: None,
        }
    }

    pub fn found(&self) -> bool {
        self.address.is_some()
    }
}

/// Finds the first `TICKER{alphanumerics}` in `body`.
///
/// Occurrences whose braces contain anything other than ASCII letters and
/// digits are not matches and the search moves on. The first complete match
/// wins even when it is empty (`BTC{}`), in which case nothing is found.
pub fn find_address(body: &str, ticker: &str) -> Option<(String, String)> {
    let opener = format!("{ticker}{{");
    for (start, _) in body.match_indices(&opener) {
        let rest = &body[start + opener.len()..];
        let len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        if rest[len..].starts_with('}') {
            let address = &rest[..len];
            if address.is_empty() {
                return None;
            }
            let raw = &body[start..start + opener.len() + len + 1];
            return Some((raw.to_string(), address.to_string()));
        }
    }
    None
}

/// One candidate per supported currency, in [`Cryptocurrency::ALL`] order.
pub fn extract_candidates(body: &str) -> Vec<CandidateAddress> {
    Cryptocurrency::ALL
        .into_iter()
        .map(|currency| match find_address(body, &currency.ticker()) {
            Some((raw, address)) => CandidateAddress {
                currency,
                raw_text_match: Some(raw),
                address: Some(address),
            },
            None => CandidateAddress::absent(currency),
        })
        .collect()
}
