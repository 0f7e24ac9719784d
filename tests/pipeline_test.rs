//! End-to-end tests for extraction, scoring and packing

use shoplens::compare::analyze_page_at;
use shoplens::config::ExtractionConfig;
use shoplens::extract::extract_fragments;
use shoplens::fetch::PageContent;
use shoplens::fragment::Category;
use shoplens::normalize::char_len;
use shoplens::pack::{pack_fragments, NO_CONTENT};
use shoplens::page::Page;
use shoplens::score::score_fragments;
use shoplens::value::ValueLabel;

const FILLERS: [&str; 10] = [
    "The morning light came slowly over the hills behind the old barn.",
    "We walked along the river until the path turned into soft sand.",
    "Her grandmother kept a small garden of herbs near the kitchen door.",
    "Every autumn the town held a fair with music and painted lanterns.",
    "The library closed early on Sundays so we read on the steps outside.",
    "A narrow bridge crossed the canal just past the bakery on the corner.",
    "Clouds gathered in the west and the wind picked up before evening.",
    "They told stories around the fire long after the sun had gone down.",
    "The train station smelled of coffee and rain on warm stone floors.",
    "Old maps hung on the walls of the cafe where the students gathered.",
];

fn product_page() -> String {
    let fillers: String = FILLERS.iter().map(|p| format!("<p>{}</p>\n", p)).collect();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Summit Tent | Outdoor Store</title>
    <script type="application/ld+json">
    {{
        "@context": "https://schema.org",
        "@type": "Product",
        "name": "Summit 2 Person Tent",
        "description": "Freestanding three season tent with two doors",
        "brand": {{"@type": "Brand", "name": "Ridgeline"}},
        "offers": {{"@type": "Offer", "price": "249.00", "priceCurrency": "USD"}},
        "aggregateRating": {{"@type": "AggregateRating", "ratingValue": "4.4", "reviewCount": "86"}}
    }}
    </script>
</head>
<body>
    <h1 class="product-title">Summit 2 Person Tent</h1>
    {}
</body>
</html>"#,
        fillers
    )
}

fn page() -> Page {
    Page::parse("https://outdoor.example/summit-tent", &product_page())
}

#[test]
fn test_first_block_is_title_or_structured_data() {
    let config = ExtractionConfig::default();
    let page = page();

    let fragments = extract_fragments(&page, &config);
    let packed = pack_fragments(score_fragments(fragments, &config), &config);

    let first = packed.blocks.first().expect("packed content should not be empty");
    assert!(
        matches!(first.category, Category::Title | Category::StructuredData),
        "first block was {:?}",
        first.category
    );
    assert!(packed.blocks.iter().any(|b| b.category == Category::General));
    assert_ne!(first.category, Category::General);
}

#[test]
fn test_title_and_structured_data_outscore_fillers() {
    let config = ExtractionConfig::default();
    let scored = score_fragments(extract_fragments(&page(), &config), &config);

    let best_general = scored
        .iter()
        .filter(|s| s.fragment.category == Category::General)
        .map(|s| s.score)
        .fold(0.0, f64::max);
    let title = scored
        .iter()
        .find(|s| s.fragment.category == Category::Title)
        .expect("h1.product-title should be extracted");
    let structured = scored
        .iter()
        .find(|s| s.fragment.category == Category::StructuredData)
        .expect("JSON-LD product should be extracted");

    assert!(title.score > best_general);
    assert!(structured.score > best_general);
    assert!(structured.fragment.text.starts_with("Product: Summit 2 Person Tent"));
}

#[test]
fn test_output_never_exceeds_budget() {
    let page = page();

    for max_content_length in (120..=1200).step_by(35) {
        for max_section_length in [40, 90, 300] {
            let config = ExtractionConfig {
                max_content_length,
                max_section_length,
                ..ExtractionConfig::default()
            };
            let packed = pack_fragments(score_fragments(extract_fragments(&page, &config), &config), &config);
            let output = packed.render();

            assert!(
                char_len(&output) <= max_content_length,
                "{} chars over budget {} (sections {})",
                char_len(&output),
                max_content_length,
                max_section_length
            );
            for block in &packed.blocks {
                for section in &block.sections {
                    assert!(char_len(section) <= max_section_length);
                }
            }
        }
    }
}

#[test]
fn test_fillers_are_not_duplicated() {
    let config = ExtractionConfig::default();
    let output = pack_fragments(score_fragments(extract_fragments(&page(), &config), &config), &config).render();

    for filler in FILLERS {
        assert_eq!(output.matches(filler).count(), 1, "filler repeated: {}", filler);
    }
}

#[test]
fn test_empty_page_gives_sentinel() {
    let config = ExtractionConfig::default();
    let page = Page::parse("https://outdoor.example/empty", "<html><body></body></html>");
    let packed = pack_fragments(score_fragments(extract_fragments(&page, &config), &config), &config);

    assert!(packed.is_empty());
    assert_eq!(packed.render(), NO_CONTENT);
}

#[test]
fn test_analyze_page_record_and_value() {
    let content = PageContent {
        url: "https://outdoor.example/summit-tent".to_string(),
        html: product_page(),
    };
    let analysis = analyze_page_at(&content, &ExtractionConfig::default(), 1_700_000_000_000);

    let record = &analysis.record;
    assert_eq!(record.title, "Summit 2 Person Tent");
    assert_eq!(record.price, Some(249.0));
    assert_eq!(record.currency, "USD");
    assert_eq!(record.rating, Some(4.4));
    assert_eq!(record.review_count, Some(86));

    // 5 + 1.517 (price) + 2.64 (rating) + 0.486 (reviews)
    let score = analysis.value_score.unwrap();
    assert!(score > 9.5 && score < 9.8, "score {}", score);
    assert_eq!(analysis.value_label, Some(ValueLabel::Excellent));
    assert!(analysis.content.starts_with("Summit 2 Person Tent"));
}
