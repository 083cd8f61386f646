use rust_decimal::Decimal;
use std::str::FromStr;

const FULL_WIDTH_ZERO: u32 = 0xFF10;
const FULL_WIDTH_NINE: u32 = 0xFF19;
const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// Parses a number written with full-width digits (`０`–`９`) and a full-width
/// point (`．`). Any other character is ignored.
pub fn parse_full_width_number(s: &str) -> Option<Decimal> {
    let half: String = s
        .chars()
        .filter_map(|c| match c {
            '．' => Some('.'),
            c if (FULL_WIDTH_ZERO..=FULL_WIDTH_NINE).contains(&(c as u32)) => {
                char::from_u32(c as u32 - FULL_WIDTH_ZERO + '0' as u32)
            }
            _ => None,
        })
        .collect();

    if half.is_empty() {
        return None;
    }
    Decimal::from_str(&half).ok()
}

/// Maps the country codes card statements print to a flag emoji.
/// Codes without a known mapping come back as `cc:<code>`.
pub fn country_flag(code: &str) -> String {
    let alpha2 = match code {
        "DEU" | "FRA" | "GBR" | "NLD" | "SGP" | "USA" => &code[..2],
        "IRL" => "IE",
        "SWE" => "SE",
        // not seen on a statement yet
        "LND" => "GB",
        "TOK" => "JP",
        "HH" => "HK",
        _ => return format!("cc:{code}"),
    };
    alpha2
        .chars()
        .filter_map(|letter| char::from_u32(letter as u32 - 'A' as u32 + REGIONAL_INDICATOR_A))
        .collect()
}

/// Replaces full-width spaces with ASCII spaces and trims the result.
pub fn normalize_cell(s: &str) -> String {
    s.replace('　', " ").trim().to_string()
}
