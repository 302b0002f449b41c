//! Profile schema shared by the extraction prompt and the normalizer.

use std::sync::LazyLock;

/// Fields the model is asked to extract for every profile card, in column order.
pub const PROFILE_FIELDS: [&str; 4] = [
    "name",
    "title_or_role",
    "organization_or_context",
    "education_or_tagline",
];

/// Fields whose value may be missing on a card.
pub const OPTIONAL_FIELDS: [&str; 1] = ["education_or_tagline"];

pub const SOURCE_FILE_FIELD: &str = "source_file";
pub const PROCESSED_AT_FIELD: &str = "processed_at";

/// Stamped by the sink on receipt; never populated by the pipeline.
pub const INGESTED_AT_FIELD: &str = "ingested_at";

/// Top-level key wrapping a batch in the sink request body.
pub const SINK_PAYLOAD_KEY: &str = "data";

pub fn is_provenance_field(field: &str) -> bool {
    field == SOURCE_FILE_FIELD || field == PROCESSED_AT_FIELD
}

static EXTRACTION_PROMPT: LazyLock<String> = LazyLock::new(build_prompt);

fn build_prompt() -> String {
    let mut prompt = String::from(
        "You are an expert at analyzing screenshots containing multiple person profile cards.\n\n\
         For EACH visible profile card, extract:\n",
    );
    for field in PROFILE_FIELDS {
        prompt.push_str("- ");
        prompt.push_str(field);
        if OPTIONAL_FIELDS.contains(&field) {
            prompt.push_str(" (if visible)");
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "\nReturn ONLY a JSON array.\n\
         Each object must represent ONE person.\n\
         Do not include explanations or markdown.\n",
    );
    prompt
}

/// Instruction sent with every screenshot.
pub fn extraction_prompt() -> &'static str {
    EXTRACTION_PROMPT.as_str()
}
