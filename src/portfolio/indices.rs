//! NSE indices tracked by the market health and sector rotation views.

use crate::models::Instrument;

/// Yahoo ticker and display name of every tracked index, in report order.
pub const MARKET_INDICES: [(&str, &str); 18] = [
    // Broad market
    ("^NSEI", "Nifty 50"),
    ("^NSEMDCP50", "Nifty Midcap 150"),
    // Sectoral
    ("^NSEBANK", "Bank Nifty"),
    ("^CNXIT", "Nifty IT"),
    ("^CNXAUTO", "Nifty Auto"),
    ("^CNXPHARMA", "Nifty Pharma"),
    ("^CNXFMCG", "Nifty FMCG"),
    ("^CNXMETAL", "Nifty Metal"),
    ("^CNXREALTY", "Nifty Realty"),
    ("^CNXENERGY", "Nifty Energy"),
    ("^CNXINFRA", "Nifty Infrastructure"),
    ("^CNXPSE", "Nifty PSE"),
    ("^CNXPSUBANK", "Nifty PSU Bank"),
    ("^CNXMEDIA", "Nifty Media"),
    ("^CNXCMDT", "Nifty Commodities"),
    ("^CNXCONSUM", "Nifty Consumption"),
    ("^CNXSERVICE", "Nifty Services"),
    ("^CNXMNC", "Nifty MNC"),
];

/// Benchmark the sector indices rotate against.
pub const ROTATION_BENCHMARK: (&str, &str) = ("^NSEI", "Nifty 50");

/// Sector indices placed on the rotation graph.
pub const SECTOR_INDICES: [(&str, &str); 9] = [
    ("^NSEBANK", "Bank Nifty"),
    ("^CNXIT", "Nifty IT"),
    ("^CNXAUTO", "Nifty Auto"),
    ("^CNXMETAL", "Nifty Metal"),
    ("^CNXFMCG", "Nifty FMCG"),
    ("^CNXPHARMA", "Nifty Pharma"),
    ("^CNXREALTY", "Nifty Realty"),
    ("^CNXENERGY", "Nifty Energy"),
    ("^CNXINFRA", "Nifty Infrastructure"),
];

fn to_instruments(list: &[(&str, &str)]) -> Vec<Instrument> {
    list.iter()
        .map(|(symbol, name)| Instrument::index(*symbol, *name))
        .collect()
}

pub fn market_indices() -> Vec<Instrument> {
    to_instruments(&MARKET_INDICES)
}

pub fn sector_indices() -> Vec<Instrument> {
    to_instruments(&SECTOR_INDICES)
}

pub fn rotation_benchmark() -> Instrument {
    Instrument::index(ROTATION_BENCHMARK.0, ROTATION_BENCHMARK.1)
}
