//! English → Polish term lookup across Wikipedia, Wikidata, Diki and ProZ.

pub mod cache;
pub mod config;
pub mod lookup;
pub mod scrape;
pub mod text;
pub mod transport;
pub mod wiki;

pub const USER_AGENT: &str = concat!(
    "en2pl/",
    env!("CARGO_PKG_VERSION"),
    " (+https://localhost) reqwest"
);
