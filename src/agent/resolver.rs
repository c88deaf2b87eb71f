//! Agent resolution capability.

use isbot::Bots;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use woothee::parser::{Parser, WootheeResult};

/// woothee's placeholder for fields it could not determine.
const UNKNOWN: &str = "UNKNOWN";
const CRAWLER: &str = "crawler";

/// Names woothee assigns when it only recognised the agent's category.
const GENERIC_NAMES: &[&str] = &[UNKNOWN, "misc crawler", "HTTP Library"];

/// Compatibility prefix carried by nearly every browser and many crawlers.
const MOZILLA: &str = "Mozilla";

lazy_static! {
    static ref BOTS: Bots = Bots::default();
    /// A parenthesised comment, or one whitespace-delimited product token.
    static ref SEGMENT: Regex = Regex::new(r"\(([^)]*)\)|([^\s()]+)").unwrap();
}

/// Identity extracted from a raw User-Agent header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedAgent {
    /// Canonical agent name, e.g. `Googlebot` or `Chrome`. Empty when the
    /// header was absent or blank.
    pub name: String,
    pub version: Option<String>,
    pub bot: bool,
}

impl ResolvedAgent {
    /// Agent with only a canonical name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name.is_empty()
    }
}

/// Maps a raw header value to a canonical agent.
///
/// Implementations must be total and deterministic: every input resolves to
/// some agent (possibly unknown), and the same input always resolves to the
/// same agent.
pub trait AgentResolver: Send + Sync {
    fn resolve(&self, raw: &str) -> ResolvedAgent;
}

impl<F> AgentResolver for F
where
    F: Fn(&str) -> ResolvedAgent + Send + Sync,
{
    fn resolve(&self, raw: &str) -> ResolvedAgent {
        self(raw)
    }
}

/// Default resolver.
///
/// Names come from woothee's agent dataset and the bot flag from isbot's
/// crawler patterns. Order of precedence:
///
/// 1. a crawler woothee knows by name (`Googlebot`, `bingbot`, ...)
/// 2. for bot traffic, the first product token isbot flags on its own, so
///    `SpamBot/1.0 Chrome/120.0` resolves to `SpamBot` rather than `Chrome`
/// 3. any other agent woothee knows by name (`Chrome`, `Firefox`, ...)
/// 4. the first product token other than `Mozilla`, verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureResolver;

impl AgentResolver for SignatureResolver {
    fn resolve(&self, raw: &str) -> ResolvedAgent {
        let raw = raw.trim();
        if raw.is_empty() {
            return ResolvedAgent::default();
        }

        let parsed = Parser::new().parse(raw);
        let known = parsed
            .as_ref()
            .filter(|result| !GENERIC_NAMES.iter().any(|name| result.name == *name));
        let bot = BOTS.is_bot(raw) || parsed.as_ref().is_some_and(|result| result.category == CRAWLER);

        if let Some(result) = known.filter(|result| result.category == CRAWLER) {
            return from_dataset(result, true);
        }

        let (products, commented) = split_products(raw);

        if bot {
            let flagged = products
                .iter()
                .chain(&commented)
                .filter(|product| product.name != MOZILLA)
                .find(|product| BOTS.is_bot(product.name));
            if let Some(product) = flagged {
                return product.to_agent(true);
            }
        }

        if let Some(result) = known {
            return from_dataset(result, bot);
        }

        products
            .iter()
            .find(|product| product.name != MOZILLA)
            .or_else(|| products.first())
            .map(|product| product.to_agent(bot))
            .unwrap_or(ResolvedAgent {
                bot,
                ..ResolvedAgent::default()
            })
    }
}

fn from_dataset(result: &WootheeResult<'_>, bot: bool) -> ResolvedAgent {
    let version = result.version.to_string();
    ResolvedAgent {
        name: result.name.to_string(),
        version: (!version.is_empty() && version != UNKNOWN).then_some(version),
        bot,
    }
}

/// `Name/Version` item of a header.
struct Product<'a> {
    name: &'a str,
    version: Option<&'a str>,
}

impl Product<'_> {
    fn parse(item: &str) -> Option<Product<'_>> {
        let item = item.trim();
        if item.starts_with('+') || item.contains("://") {
            return None;
        }
        let (name, version) = match item.split_once('/') {
            Some((name, version)) => (name.trim(), Some(version).filter(|v| !v.is_empty())),
            None => (item, None),
        };
        (!name.is_empty()).then_some(Product { name, version })
    }

    fn to_agent(&self, bot: bool) -> ResolvedAgent {
        ResolvedAgent {
            name: self.name.to_string(),
            version: self.version.map(str::to_string),
            bot,
        }
    }
}

/// Top-level product tokens, then `Name/Version` items found in comments.
fn split_products(raw: &str) -> (Vec<Product<'_>>, Vec<Product<'_>>) {
    let mut products = Vec::new();
    let mut commented = Vec::new();

    for caps in SEGMENT.captures_iter(raw) {
        if let Some(comment) = caps.get(1) {
            commented.extend(
                comment
                    .as_str()
                    .split(';')
                    .filter(|item| item.contains('/'))
                    .filter_map(Product::parse),
            );
        } else if let Some(token) = caps.get(2) {
            products.extend(Product::parse(token.as_str()));
        }
    }

    (products, commented)
}
