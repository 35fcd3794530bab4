// ISO 639 language table
//
// Comment LANGUAGE values come as 639-2 codes, 639-1 codes or plain English
// names. Everything is normalised to the 639-2 bibliographic code.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iso639Language {
    pub english_name: &'static str,
    /// ISO 639-2/B code
    pub iso639_2_code: &'static str,
    /// ISO 639-2/T code where it differs from the bibliographic one
    pub terminology_code: Option<&'static str>,
    pub iso639_1_code: Option<&'static str>,
}

const fn lang(
    english_name: &'static str,
    iso639_2_code: &'static str,
    terminology_code: Option<&'static str>,
    iso639_1_code: Option<&'static str>,
) -> Iso639Language {
    Iso639Language {
        english_name,
        iso639_2_code,
        terminology_code,
        iso639_1_code,
    }
}

pub static ISO639_LANGUAGES: &[Iso639Language] = &[
    lang("Afrikaans", "afr", None, Some("af")),
    lang("Albanian", "alb", Some("sqi"), Some("sq")),
    lang("Amharic", "amh", None, Some("am")),
    lang("Arabic", "ara", None, Some("ar")),
    lang("Armenian", "arm", Some("hye"), Some("hy")),
    lang("Basque", "baq", Some("eus"), Some("eu")),
    lang("Belarusian", "bel", None, Some("be")),
    lang("Bengali", "ben", None, Some("bn")),
    lang("Bosnian", "bos", None, Some("bs")),
    lang("Breton", "bre", None, Some("br")),
    lang("Bulgarian", "bul", None, Some("bg")),
    lang("Burmese", "bur", Some("mya"), Some("my")),
    lang("Catalan", "cat", None, Some("ca")),
    lang("Chinese", "chi", Some("zho"), Some("zh")),
    lang("Croatian", "hrv", None, Some("hr")),
    lang("Czech", "cze", Some("ces"), Some("cs")),
    lang("Danish", "dan", None, Some("da")),
    lang("Dutch", "dut", Some("nld"), Some("nl")),
    lang("English", "eng", None, Some("en")),
    lang("Esperanto", "epo", None, Some("eo")),
    lang("Estonian", "est", None, Some("et")),
    lang("Faroese", "fao", None, Some("fo")),
    lang("Filipino", "fil", None, None),
    lang("Finnish", "fin", None, Some("fi")),
    lang("French", "fre", Some("fra"), Some("fr")),
    lang("Galician", "glg", None, Some("gl")),
    lang("Georgian", "geo", Some("kat"), Some("ka")),
    lang("German", "ger", Some("deu"), Some("de")),
    lang("Greek", "gre", Some("ell"), Some("el")),
    lang("Hebrew", "heb", None, Some("he")),
    lang("Hindi", "hin", None, Some("hi")),
    lang("Hungarian", "hun", None, Some("hu")),
    lang("Icelandic", "ice", Some("isl"), Some("is")),
    lang("Indonesian", "ind", None, Some("id")),
    lang("Irish", "gle", None, Some("ga")),
    lang("Italian", "ita", None, Some("it")),
    lang("Japanese", "jpn", None, Some("ja")),
    lang("Kazakh", "kaz", None, Some("kk")),
    lang("Khmer", "khm", None, Some("km")),
    lang("Korean", "kor", None, Some("ko")),
    lang("Kurdish", "kur", None, Some("ku")),
    lang("Lao", "lao", None, Some("lo")),
    lang("Latin", "lat", None, Some("la")),
    lang("Latvian", "lav", None, Some("lv")),
    lang("Lithuanian", "lit", None, Some("lt")),
    lang("Luxembourgish", "ltz", None, Some("lb")),
    lang("Macedonian", "mac", Some("mkd"), Some("mk")),
    lang("Malay", "may", Some("msa"), Some("ms")),
    lang("Malayalam", "mal", None, Some("ml")),
    lang("Maltese", "mlt", None, Some("mt")),
    lang("Maori", "mao", Some("mri"), Some("mi")),
    lang("Marathi", "mar", None, Some("mr")),
    lang("Mongolian", "mon", None, Some("mn")),
    lang("Nepali", "nep", None, Some("ne")),
    lang("Norwegian", "nor", None, Some("no")),
    lang("Persian", "per", Some("fas"), Some("fa")),
    lang("Polish", "pol", None, Some("pl")),
    lang("Portuguese", "por", None, Some("pt")),
    lang("Punjabi", "pan", None, Some("pa")),
    lang("Romanian", "rum", Some("ron"), Some("ro")),
    lang("Russian", "rus", None, Some("ru")),
    lang("Serbian", "srp", None, Some("sr")),
    lang("Sinhala", "sin", None, Some("si")),
    lang("Slovak", "slo", Some("slk"), Some("sk")),
    lang("Slovenian", "slv", None, Some("sl")),
    lang("Somali", "som", None, Some("so")),
    lang("Spanish", "spa", None, Some("es")),
    lang("Swahili", "swa", None, Some("sw")),
    lang("Swedish", "swe", None, Some("sv")),
    lang("Tagalog", "tgl", None, Some("tl")),
    lang("Tamil", "tam", None, Some("ta")),
    lang("Telugu", "tel", None, Some("te")),
    lang("Thai", "tha", None, Some("th")),
    lang("Tibetan", "tib", Some("bod"), Some("bo")),
    lang("Turkish", "tur", None, Some("tr")),
    lang("Ukrainian", "ukr", None, Some("uk")),
    lang("Urdu", "urd", None, Some("ur")),
    lang("Uzbek", "uzb", None, Some("uz")),
    lang("Vietnamese", "vie", None, Some("vi")),
    lang("Welsh", "wel", Some("cym"), Some("cy")),
    lang("Yiddish", "yid", None, Some("yi")),
    lang("Zulu", "zul", None, Some("zu")),
    lang("Undetermined", "und", None, None),
];

/// Find the table entry for a code or English name
pub fn find_language(value: &str) -> Option<&'static Iso639Language> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    ISO639_LANGUAGES.iter().find(|l| {
        l.iso639_2_code.eq_ignore_ascii_case(value)
            || l.terminology_code.is_some_and(|c| c.eq_ignore_ascii_case(value))
            || l.iso639_1_code.is_some_and(|c| c.eq_ignore_ascii_case(value))
            || l.english_name.eq_ignore_ascii_case(value)
    })
}

/// Map a language code or name to its ISO 639-2 code
pub fn map_to_iso639_2_code(value: &str) -> Option<&'static str> {
    find_language(value).map(|l| l.iso639_2_code)
}
