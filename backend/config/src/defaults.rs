//! Config defaults: built-in vocabulary tables and default scalar values.
//!
//! The vocabulary covers Korean labels (the primary target) plus common
//! English spellings. Any table supplied in the config file replaces the
//! built-in one wholesale.

use labelscan_core::{AllergenCategory, NutrientField, Unit};

use crate::schema::{
    AllergenCategoryConfig, AnalysisConfig, GatewayConfig, LabelScanConfig, LoggingConfig,
    NegationConfig, NutrientFieldConfig, OcrConfig, TranslationConfig, UnitSpellingConfig,
};

pub const DEFAULT_MAX_TOKEN_DISTANCE: usize = 3;
pub const DEFAULT_NEGATION_WINDOW: usize = 3;
/// English prefix markers bind to the word right after them ("no milk").
pub const DEFAULT_PREFIX_NEGATION_WINDOW: usize = 0;

pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OCR_LANGUAGES: &[&str] = &["kor", "eng"];
/// 6 = single block, 4 = single column (tables), 3 = auto, 11 = sparse text.
pub const DEFAULT_PAGE_SEG_MODES: &[u8] = &[6, 4, 3, 11];
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

pub const DEFAULT_TARGET_LANG: &str = "en";
pub const DEFAULT_TRANSLATION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAPAGO_ENDPOINT: &str =
    "https://naveropenapi.apigw.ntruss.com/nmt/v1/translation";

pub const DEFAULT_GATEWAY_HOST: &str = "0.0.0.0";
pub const DEFAULT_GATEWAY_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_REPORTS: usize = 500;
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 30;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Largest believable value per field, in the field's default unit.
pub fn default_max_plausible(field: NutrientField) -> f64 {
    match field {
        NutrientField::Sodium => 50_000.0,
        NutrientField::Cholesterol => 10_000.0,
        _ => 1_000.0,
    }
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: LabelScanConfig) -> LabelScanConfig {
    let config = apply_analysis_defaults(config);
    let config = apply_ocr_defaults(config);
    let config = apply_translation_defaults(config);
    let config = apply_gateway_defaults(config);
    apply_logging_defaults(config)
}

/// Fill empty vocabulary tables and matching limits.
fn apply_analysis_defaults(mut config: LabelScanConfig) -> LabelScanConfig {
    let analysis = &mut config.analysis;
    analysis
        .max_token_distance
        .get_or_insert(DEFAULT_MAX_TOKEN_DISTANCE);
    analysis.negation_window.get_or_insert(DEFAULT_NEGATION_WINDOW);
    analysis
        .prefix_negation_window
        .get_or_insert(DEFAULT_PREFIX_NEGATION_WINDOW);
    if analysis.nutrients.is_empty() {
        analysis.nutrients = default_nutrients();
    }
    if analysis.allergens.is_empty() {
        analysis.allergens = default_allergens();
    }
    if analysis.negation.is_empty() {
        analysis.negation = default_negation();
    }
    if analysis.units.is_empty() {
        analysis.units = default_units();
    }
    config
}

fn apply_ocr_defaults(mut config: LabelScanConfig) -> LabelScanConfig {
    let ocr = &mut config.ocr;
    if ocr.languages.is_empty() {
        ocr.languages = DEFAULT_OCR_LANGUAGES.iter().map(|s| s.to_string()).collect();
    }
    if ocr.page_seg_modes.is_empty() {
        ocr.page_seg_modes = DEFAULT_PAGE_SEG_MODES.to_vec();
    }
    ocr.timeout_secs.get_or_insert(DEFAULT_OCR_TIMEOUT_SECS);
    ocr.tesseract_cmd
        .get_or_insert_with(|| DEFAULT_TESSERACT_CMD.to_string());
    config
}

fn apply_translation_defaults(mut config: LabelScanConfig) -> LabelScanConfig {
    let translation = &mut config.translation;
    translation
        .provider
        .get_or_insert_with(|| "papago".to_string());
    translation
        .target_lang
        .get_or_insert_with(|| DEFAULT_TARGET_LANG.to_string());
    translation
        .timeout_secs
        .get_or_insert(DEFAULT_TRANSLATION_TIMEOUT_SECS);
    translation.source.get_or_insert_with(Default::default);
    config
}

fn apply_gateway_defaults(mut config: LabelScanConfig) -> LabelScanConfig {
    let gateway = &mut config.gateway;
    gateway
        .host
        .get_or_insert_with(|| DEFAULT_GATEWAY_HOST.to_string());
    gateway.port.get_or_insert(DEFAULT_GATEWAY_PORT);
    gateway
        .upload_dir
        .get_or_insert_with(|| DEFAULT_UPLOAD_DIR.into());
    gateway.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    gateway.max_reports.get_or_insert(DEFAULT_MAX_REPORTS);
    gateway.rate_limit.get_or_insert_with(Default::default);
    config
}

fn apply_logging_defaults(mut config: LabelScanConfig) -> LabelScanConfig {
    let logging = &mut config.logging;
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.into());
    config
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn nutrient(field: NutrientField, keywords: &[&str]) -> NutrientFieldConfig {
    NutrientFieldConfig {
        field,
        keywords: words(keywords),
        canonical_unit: Some(field.default_unit()),
        accepted_units: Unit::ALL.to_vec(),
        max_plausible: Some(default_max_plausible(field)),
    }
}

/// Built-in nutrient field table.
///
/// "당" alone is deliberately absent: "30g당" means "per 30 g".
pub fn default_nutrients() -> Vec<NutrientFieldConfig> {
    vec![
        nutrient(
            NutrientField::Sugar,
            &["당류", "총당류", "설탕", "sugar", "sugars", "total sugars"],
        ),
        nutrient(
            NutrientField::Sodium,
            &["나트륨", "나트름", "소금", "염분", "Na", "sodium"],
        ),
        nutrient(
            NutrientField::Carbohydrate,
            &["탄수화물", "carbohydrate", "carbohydrates", "total carbohydrate", "carbs"],
        ),
        nutrient(NutrientField::Protein, &["단백질", "protein"]),
        nutrient(NutrientField::Fat, &["지방", "fat", "total fat"]),
        nutrient(NutrientField::SaturatedFat, &["포화지방", "saturated fat"]),
        nutrient(NutrientField::TransFat, &["트랜스지방", "trans fat"]),
        nutrient(NutrientField::Cholesterol, &["콜레스테롤", "cholesterol"]),
    ]
}

fn allergen(
    category: AllergenCategory,
    keywords: &[&str],
    exclusions: &[&str],
) -> AllergenCategoryConfig {
    AllergenCategoryConfig {
        category,
        keywords: words(keywords),
        exclusions: words(exclusions),
        negation: NegationConfig::default(),
    }
}

/// Built-in allergen category table.
pub fn default_allergens() -> Vec<AllergenCategoryConfig> {
    use AllergenCategory::*;
    vec![
        allergen(
            Milk,
            &[
                "우유", "유청", "분유", "치즈", "버터", "밀크", "연유", "유당", "카제인", "milk",
                "cheese", "butter", "whey", "casein", "lactose", "cream",
            ],
            &["땅콩버터", "코코아버터", "카카오버터", "천연유"],
        ),
        allergen(
            Egg,
            &["계란", "달걀", "난류", "난백", "난황", "egg", "eggs"],
            &[],
        ),
        allergen(Peanut, &["땅콩", "peanut", "peanuts"], &[]),
        allergen(
            TreeNut,
            &[
                "호두", "아몬드", "잣", "캐슈넛", "피스타치오", "헤이즐넛", "walnut", "walnuts",
                "almond", "almonds", "cashew", "cashews", "hazelnut", "hazelnuts", "pecan",
                "pecans", "pistachio", "pistachios", "tree nut", "tree nuts",
            ],
            &[],
        ),
        allergen(
            Wheat,
            &["밀", "밀가루", "통밀", "소맥", "글루텐", "wheat", "gluten"],
            &["밀폐", "밀봉", "밀리", "밀도"],
        ),
        allergen(
            Soy,
            &["대두", "콩", "두유", "간장", "된장", "soy", "soya", "soybean", "soybeans"],
            &[],
        ),
        allergen(
            Fish,
            &["고등어", "연어", "참치", "멸치", "어류", "fish", "anchovy", "salmon", "tuna", "mackerel"],
            &[],
        ),
        allergen(
            Crustacean,
            &[
                "새우", "게", "꽃게", "대게", "랍스터", "가재", "shrimp", "prawn", "prawns", "crab",
                "lobster",
            ],
            &["게임"],
        ),
        allergen(
            Mollusc,
            &[
                "오징어", "조개", "굴", "전복", "홍합", "squid", "clam", "clams", "oyster",
                "oysters", "mussel", "mussels", "abalone",
            ],
            &[],
        ),
        allergen(Sesame, &["깨", "참깨", "들깨", "검정깨", "sesame"], &["깨끗"]),
        allergen(Buckwheat, &["메밀", "buckwheat"], &[]),
    ]
}

/// Built-in negation markers.
///
/// Korean places the negation after the allergen ("우유 함유하지 않음");
/// English mostly before it ("contains no milk") or after ("gluten free").
pub fn default_negation() -> NegationConfig {
    NegationConfig {
        prefix: words(&[
            "no",
            "free of",
            "without",
            "does not contain",
            "do not contain",
        ]),
        suffix: words(&[
            "함유하지 않",
            "함유하지않",
            "미함유",
            "무첨가",
            "불포함",
            "포함하지 않",
            "포함하지않",
            "들어있지 않",
            "사용하지 않",
            "사용하지않",
            "없음",
            "free",
        ]),
        positive: words(&[
            "함유",
            "포함",
            "사용",
            "들어있",
            "contains",
            "contain",
            "includes",
            "made with",
        ]),
    }
}

/// Built-in unit spellings.
pub fn default_units() -> Vec<UnitSpellingConfig> {
    vec![
        UnitSpellingConfig {
            unit: Unit::G,
            spellings: words(&["g", "gram", "grams", "그램"]),
        },
        UnitSpellingConfig {
            unit: Unit::Mg,
            spellings: words(&["mg", "milligram", "milligrams", "밀리그램"]),
        },
        UnitSpellingConfig {
            unit: Unit::Mcg,
            spellings: words(&["mcg", "μg", "µg", "ug", "microgram", "micrograms", "마이크로그램"]),
        },
    ]
}

/// Ready-to-use config with every default applied.
pub fn default_config() -> LabelScanConfig {
    apply_all_defaults(LabelScanConfig {
        analysis: AnalysisConfig::default(),
        ocr: OcrConfig::default(),
        translation: TranslationConfig::default(),
        gateway: GatewayConfig::default(),
        logging: LoggingConfig::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_empty_tables() {
        let config = apply_all_defaults(LabelScanConfig::default());
        assert_eq!(config.analysis.nutrients.len(), NutrientField::ALL.len());
        assert_eq!(config.analysis.allergens.len(), AllergenCategory::ALL.len());
        assert!(!config.analysis.negation.suffix.is_empty());
        assert!(config.analysis.negation.positive.iter().any(|w| w == "함유"));
        assert_eq!(config.analysis.prefix_negation_window, Some(0));
        assert_eq!(config.ocr.page_seg_modes, DEFAULT_PAGE_SEG_MODES);
        assert_eq!(config.gateway.port, Some(DEFAULT_GATEWAY_PORT));
    }

    #[test]
    fn keeps_user_tables() {
        let mut config = LabelScanConfig::default();
        config.analysis.nutrients = vec![nutrient(NutrientField::Sodium, &["sodium"])];
        config.analysis.max_token_distance = Some(5);
        let config = apply_all_defaults(config);
        assert_eq!(config.analysis.nutrients.len(), 1);
        assert_eq!(config.analysis.max_token_distance(), 5);
    }

    #[test]
    fn sodium_defaults_to_milligrams() {
        let table = default_nutrients();
        let sodium = table
            .iter()
            .find(|n| n.field == NutrientField::Sodium)
            .unwrap();
        assert_eq!(sodium.canonical_unit(), Unit::Mg);
        assert!(sodium.keywords.iter().any(|k| k == "나트름"));
    }
}
