//! Country-name resolution to ISO 3166-1 alpha-2 codes.
//!
//! Hint records carry free-text country names from the guide site while the
//! current location's country comes from a reverse geocoder. Both sides are
//! resolved to a code before comparing. Territories the guide site lists as
//! countries of their own resolve to ISO 3166-2 subdivision codes, so they
//! never match their parent country.

/// Guide-site names, common English variants and a few native spellings
/// reverse geocoders return.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("alaska", "US-AK"),
    ("albania", "AL"),
    ("american samoa", "AS"),
    ("andorra", "AD"),
    ("antarctica", "AQ"),
    ("argentina", "AR"),
    ("australia", "AU"),
    ("austria", "AT"),
    ("osterreich", "AT"),
    ("azores", "PT-20"),
    ("bangladesh", "BD"),
    ("belarus", "BY"),
    ("belgium", "BE"),
    ("belgie", "BE"),
    ("belgique", "BE"),
    ("bermuda", "BM"),
    ("bhutan", "BT"),
    ("bolivia", "BO"),
    ("botswana", "BW"),
    ("brazil", "BR"),
    ("brasil", "BR"),
    ("british indian ocean territory", "IO"),
    ("bulgaria", "BG"),
    ("cambodia", "KH"),
    ("canada", "CA"),
    ("chile", "CL"),
    ("china", "CN"),
    ("christmas island", "CX"),
    ("cocos islands", "CC"),
    ("cocos (keeling) islands", "CC"),
    ("colombia", "CO"),
    ("costa rica", "CR"),
    ("croatia", "HR"),
    ("hrvatska", "HR"),
    ("curacao", "CW"),
    ("cyprus", "CY"),
    ("czechia", "CZ"),
    ("czech republic", "CZ"),
    ("cesko", "CZ"),
    ("denmark", "DK"),
    ("danmark", "DK"),
    ("dominican republic", "DO"),
    ("ecuador", "EC"),
    ("egypt", "EG"),
    ("estonia", "EE"),
    ("eesti", "EE"),
    ("eswatini", "SZ"),
    ("swaziland", "SZ"),
    ("falkland islands", "FK"),
    ("faroe islands", "FO"),
    ("finland", "FI"),
    ("suomi", "FI"),
    ("france", "FR"),
    ("germany", "DE"),
    ("deutschland", "DE"),
    ("ghana", "GH"),
    ("gibraltar", "GI"),
    ("greece", "GR"),
    ("greenland", "GL"),
    ("guam", "GU"),
    ("guatemala", "GT"),
    ("hawaii", "US-HI"),
    ("hong kong", "HK"),
    ("hungary", "HU"),
    ("magyarorszag", "HU"),
    ("iceland", "IS"),
    ("island", "IS"),
    ("india", "IN"),
    ("indonesia", "ID"),
    ("iraq", "IQ"),
    ("ireland", "IE"),
    ("isle of man", "IM"),
    ("israel & the west bank", "IL"),
    ("israel", "IL"),
    ("italy", "IT"),
    ("italia", "IT"),
    ("japan", "JP"),
    ("jersey", "JE"),
    ("jordan", "JO"),
    ("kazakhstan", "KZ"),
    ("kenya", "KE"),
    ("kyrgyzstan", "KG"),
    ("laos", "LA"),
    ("latvia", "LV"),
    ("latvija", "LV"),
    ("lebanon", "LB"),
    ("lesotho", "LS"),
    ("liechtenstein", "LI"),
    ("lithuania", "LT"),
    ("lietuva", "LT"),
    ("luxembourg", "LU"),
    ("macau", "MO"),
    ("macao", "MO"),
    ("madagascar", "MG"),
    ("madeira", "PT-30"),
    ("malaysia", "MY"),
    ("mali", "ML"),
    ("malta", "MT"),
    ("martinique", "MQ"),
    ("mexico", "MX"),
    ("monaco", "MC"),
    ("mongolia", "MN"),
    ("montenegro", "ME"),
    ("namibia", "NA"),
    ("nepal", "NP"),
    ("netherlands", "NL"),
    ("the netherlands", "NL"),
    ("nederland", "NL"),
    ("new zealand", "NZ"),
    ("aotearoa", "NZ"),
    ("nigeria", "NG"),
    ("north macedonia", "MK"),
    ("macedonia", "MK"),
    ("northern mariana islands", "MP"),
    ("norway", "NO"),
    ("norge", "NO"),
    ("oman", "OM"),
    ("pakistan", "PK"),
    ("panama", "PA"),
    ("peru", "PE"),
    ("philippines", "PH"),
    ("pilipinas", "PH"),
    ("pitcairn islands", "PN"),
    ("poland", "PL"),
    ("polska", "PL"),
    ("portugal", "PT"),
    ("puerto rico", "PR"),
    ("qatar", "QA"),
    ("reunion", "RE"),
    ("romania", "RO"),
    ("russia", "RU"),
    ("russian federation", "RU"),
    ("rwanda", "RW"),
    ("saint pierre and miquelon", "PM"),
    ("san marino", "SM"),
    ("sao tome and principe", "ST"),
    ("senegal", "SN"),
    ("serbia", "RS"),
    ("srbija", "RS"),
    ("singapore", "SG"),
    ("slovakia", "SK"),
    ("slovensko", "SK"),
    ("slovenia", "SI"),
    ("slovenija", "SI"),
    ("south africa", "ZA"),
    ("south georgia & sandwich islands", "GS"),
    ("south georgia and the south sandwich islands", "GS"),
    ("south korea", "KR"),
    ("korea", "KR"),
    ("republic of korea", "KR"),
    ("spain", "ES"),
    ("espana", "ES"),
    ("sri lanka", "LK"),
    ("svalbard", "SJ"),
    ("sweden", "SE"),
    ("sverige", "SE"),
    ("switzerland", "CH"),
    ("schweiz", "CH"),
    ("suisse", "CH"),
    ("svizzera", "CH"),
    ("taiwan", "TW"),
    ("tanzania", "TZ"),
    ("thailand", "TH"),
    ("tunisia", "TN"),
    ("turkey", "TR"),
    ("turkiye", "TR"),
    ("us minor outlying islands", "UM"),
    ("us virgin islands", "VI"),
    ("united states virgin islands", "VI"),
    ("uganda", "UG"),
    ("ukraine", "UA"),
    ("united arab emirates", "AE"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("great britain", "GB"),
    ("united states of america", "US"),
    ("united states", "US"),
    ("usa", "US"),
    ("uruguay", "UY"),
    ("vanuatu", "VU"),
    ("vietnam", "VN"),
    ("viet nam", "VN"),
];

/// Lowercases, folds common Latin diacritics, turns `-`/`_` into spaces and
/// collapses whitespace.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => 'a',
            'ç' | 'č' | 'ć' => 'c',
            'é' | 'è' | 'ê' | 'ë' | 'ě' | 'ē' => 'e',
            'í' | 'ì' | 'î' | 'ï' | 'ī' => 'i',
            'ñ' | 'ń' => 'n',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' => 'o',
            'š' | 'ś' => 's',
            'ú' | 'ù' | 'û' | 'ü' | 'ū' => 'u',
            'ý' | 'ÿ' => 'y',
            'ž' | 'ź' | 'ż' => 'z',
            'ř' => 'r',
            '-' | '_' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ISO 3166-1 alpha-2 code for a country name, if known, or an ISO 3166-2
/// code for a guide-site territory. Two-letter input is taken to already be a
/// country code.
#[must_use]
pub fn country_code(name: &str) -> Option<&'static str> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return None;
    }
    if let Some((_, code)) = COUNTRY_CODES.iter().find(|(n, _)| *n == normalized) {
        return Some(code);
    }
    if normalized.len() == 2 {
        let upper = normalized.to_ascii_uppercase();
        return COUNTRY_CODES
            .iter()
            .map(|(_, code)| *code)
            .find(|code| *code == upper);
    }
    if normalized.contains("sao tome") {
        return Some("ST");
    }
    None
}

/// Code comparison when both sides resolve, otherwise normalized names.
#[must_use]
pub fn same_country(a: &str, b: &str) -> bool {
    match (country_code(a), country_code(b)) {
        (Some(x), Some(y)) => x == y,
        _ => {
            let a = normalize_name(a);
            !a.is_empty() && a == normalize_name(b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_guide_names_and_geocoder_variants() {
        assert_eq!(country_code("Kenya"), Some("KE"));
        assert_eq!(country_code("São Tomé and Príncipe"), Some("ST"));
        assert_eq!(country_code("  Curaçao "), Some("CW"));
        assert_eq!(country_code("Deutschland"), Some("DE"));
        assert_eq!(country_code("United States"), Some("US"));
        assert_eq!(country_code("Hawaii"), Some("US-HI"));
        assert_eq!(country_code("de"), Some("DE"));
        assert_eq!(country_code("Atlantis"), None);
        assert_eq!(country_code(""), None);
    }

    #[test]
    fn same_country_uses_codes_then_names() {
        assert!(same_country("United States of America", "USA"));
        assert!(!same_country("Hawaii", "United States"));
        assert!(!same_country("Alaska", "USA"));
        assert!(!same_country("Madeira", "Portugal"));
        assert!(!same_country("Azores", "Madeira"));
        assert!(same_country("Türkiye", "Turkey"));
        assert!(same_country("Atlantis", " atlantis "));
        assert!(!same_country("Kenya", "Uganda"));
        assert!(!same_country("", ""));
    }
}
