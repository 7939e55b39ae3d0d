// All generation prompt constants for the content pipelines.

use crate::models::job::GenerationJobRow;

/// System prompt for podcast script generation — enforces JSON-only output.
pub const PODCAST_SYSTEM: &str =
    "You are an agricultural extension broadcaster writing weekly radio-style \
    podcasts for smallholder farmers. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Write in plain, practical language a farmer can act on this week.";

/// Podcast script prompt template.
/// Replace: {language}, {crop}, {region}, {stage}
pub const PODCAST_PROMPT_TEMPLATE: &str = r#"Write this week's farming podcast episode in language "{language}" for {crop} growers in the {region} region, currently in the "{stage}" growth stage.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Episode title, one line",
  "summary": "2-3 sentence episode summary",
  "script": "Full spoken script, 600-900 words, conversational, single narrator",
  "tags": ["practice or topic keywords"],
  "starter_questions": ["3 short follow-up questions a listener might ask"]
}

Rules:
1. Focus on what to do THIS week of the "{stage}" stage — field tasks, pest and disease watch, weather caution.
2. Mention the crop and region by name early in the script.
3. No prices, no brand names, no chemical dosages without a "consult your local extension officer" caveat.
4. starter_questions must be answerable from the script content."#;

/// System prompt for image article generation — enforces JSON-only output.
pub const ARTICLE_SYSTEM: &str =
    "You are an agricultural extension editor writing short illustrated \
    articles for smallholder farmers. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Write in plain, practical language a farmer can act on this week.";

/// Image article prompt template.
/// Replace: {language}, {crop}, {region}, {stage}
pub const ARTICLE_PROMPT_TEMPLATE: &str = r#"Write this week's illustrated farming article in language "{language}" for {crop} growers in the {region} region, currently in the "{stage}" growth stage.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Article title, one line",
  "summary": "2-3 sentence article summary",
  "sections": [
    {
      "heading": "Section heading",
      "body": "2-4 paragraphs of practical guidance",
      "image_prompt": "Optional: a concrete visual to illustrate this section, described for an image model. Omit for sections that need no image."
    }
  ],
  "tags": ["practice or topic keywords"],
  "starter_questions": ["3 short follow-up questions a reader might ask"]
}

Rules:
1. 3-5 sections, each covering one actionable topic for the "{stage}" stage.
2. image_prompt, when present, must describe a realistic field photo — no text overlays, no diagrams.
3. No prices, no brand names, no chemical dosages without a "consult your local extension officer" caveat.
4. starter_questions must be answerable from the article content."#;

/// Fills a prompt template with job metadata.
pub fn fill_template(template: &str, job: &GenerationJobRow) -> String {
    template
        .replace("{language}", &job.language)
        .replace("{crop}", &job.crop_code)
        .replace("{region}", &job.region_code)
        .replace("{stage}", job.growth_stage.as_deref().unwrap_or("general"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_job(stage: Option<&str>) -> GenerationJobRow {
        GenerationJobRow {
            id: Uuid::new_v4(),
            content_type: "podcast".to_string(),
            region_code: "mekong-delta".to_string(),
            crop_code: "rice".to_string(),
            growth_stage: stage.map(|s| s.to_string()),
            language: "vi".to_string(),
            status: "pending".to_string(),
            attempt_count: 0,
            content_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_fill_template_substitutes_all_placeholders() {
        let prompt = fill_template(PODCAST_PROMPT_TEMPLATE, &make_job(Some("growing")));
        assert!(prompt.contains("rice"));
        assert!(prompt.contains("mekong-delta"));
        assert!(prompt.contains("\"growing\""));
        assert!(prompt.contains("\"vi\""));
        assert!(!prompt.contains("{crop}"));
        assert!(!prompt.contains("{stage}"));
    }

    #[test]
    fn test_missing_growth_stage_falls_back_to_general() {
        let prompt = fill_template(ARTICLE_PROMPT_TEMPLATE, &make_job(None));
        assert!(prompt.contains("\"general\""));
    }
}
