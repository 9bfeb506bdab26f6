//! Extended zone abbreviation table
//!
//! Archived mail uses military letters and regional abbreviations that no
//! standard date grammar knows about. Offsets are in seconds east of UTC.

use std::collections::HashMap;
use std::sync::LazyLock;

const HOUR: i32 = 3600;

#[rustfmt::skip]
const ZONE_ROWS: &[(i32, &[&str])] = &[
    (-12 * HOUR, &["Y"]),
    (-11 * HOUR, &["X", "NUT", "SST"]),
    (-10 * HOUR, &["W", "CKT", "HAST", "HST", "TAHT", "TKT"]),
    (-9 * HOUR, &["V", "AKST", "GAMT", "GIT", "HADT", "HNY"]),
    (-8 * HOUR, &["U", "AKDT", "CIST", "HAY", "HNP", "PST", "PT"]),
    (-7 * HOUR, &["T", "HAP", "HNR", "MST", "PDT"]),
    (-6 * HOUR, &["S", "CST", "EAST", "GALT", "HAR", "HNC", "MDT"]),
    (-5 * HOUR, &["R", "CDT", "COT", "EASST", "ECT", "EST", "ET", "HAC", "HNE", "PET"]),
    (-4 * HOUR, &["Q", "AST", "BOT", "CLT", "COST", "EDT", "FKT", "GYT", "HAE", "HNA", "PYT"]),
    (-3 * HOUR, &["P", "ADT", "ART", "BRT", "CLST", "FKST", "GFT", "HAA", "PMST", "PYST", "SRT", "UYT", "WGT"]),
    (-2 * HOUR, &["O", "BRST", "FNT", "PMDT", "UYST", "WGST"]),
    (-HOUR, &["N", "AZOT", "CVT", "EGT"]),
    (0, &["Z", "EGST", "GMT", "UTC", "WET", "WT"]),
    (HOUR, &["A", "CET", "DFT", "WAT", "WEDT", "WEST"]),
    (2 * HOUR, &["B", "CAT", "CEDT", "CEST", "EET", "SAST", "WAST"]),
    (3 * HOUR, &["C", "EAT", "EEDT", "EEST", "IDT", "MSK"]),
    (4 * HOUR, &["D", "AMT", "AZT", "GET", "GST", "KUYT", "MSD", "MUT", "RET", "SAMT", "SCT"]),
    (5 * HOUR, &["E", "AMST", "AQTT", "AZST", "HMT", "MAWT", "MVT", "PKT", "TFT", "TJT", "TMT", "UZT", "YEKT"]),
    (6 * HOUR, &["F", "ALMT", "BIOT", "BTT", "IOT", "KGT", "NOVT", "OMST", "YEKST"]),
    (7 * HOUR, &["G", "CXT", "DAVT", "HOVT", "ICT", "KRAT", "NOVST", "OMSST", "THA", "WIB"]),
    (8 * HOUR, &["H", "ACT", "AWST", "BDT", "BNT", "CAST", "HKT", "IRKT", "KRAST", "MYT", "PHT", "SGT", "ULAT", "WITA", "WST"]),
    (9 * HOUR, &["I", "AWDT", "IRKST", "JST", "KST", "PWT", "TLT", "WDT", "WIT", "YAKT"]),
    (10 * HOUR, &["K", "AEST", "ChST", "PGT", "VLAT", "YAKST", "YAPT"]),
    (11 * HOUR, &["L", "AEDT", "LHDT", "MAGT", "NCT", "PONT", "SBT", "VLAST", "VUT"]),
    (12 * HOUR, &["M", "ANAST", "ANAT", "FJT", "GILT", "MAGST", "MHT", "NZST", "PETST", "PETT", "TVT", "WFT"]),
    (13 * HOUR, &["FJST", "NZDT"]),
    (11 * HOUR + 1800, &["NFT"]),
    (10 * HOUR + 1800, &["ACDT", "LHST"]),
    (9 * HOUR + 1800, &["ACST"]),
    (6 * HOUR + 1800, &["CCT", "MMT"]),
    (5 * HOUR + 2700, &["NPT"]),
    (5 * HOUR + 1800, &["SLT"]),
    (4 * HOUR + 1800, &["AFT", "IRDT"]),
    (3 * HOUR + 1800, &["IRST"]),
    (-2 * HOUR - 1800, &["HAT", "NDT"]),
    (-3 * HOUR - 1800, &["HNT", "NST", "NT"]),
    (-4 * HOUR - 1800, &["HLV", "VET"]),
    (-9 * HOUR - 1800, &["MART", "MIT"]),
];

static ZONE_OFFSETS: LazyLock<HashMap<&'static str, i32>> = LazyLock::new(|| {
    ZONE_ROWS
        .iter()
        .flat_map(|(offset, codes)| codes.iter().map(move |code| (*code, *offset)))
        .collect()
});

/// Offset in seconds for a zone abbreviation
///
/// Codes are case-sensitive: `PST` is a zone, `pst` is not.
#[must_use]
pub fn zone_offset(code: &str) -> Option<i32> {
    ZONE_OFFSETS.get(code).copied()
}
