// src/fetch/prompt.rs
// Builds the request payload sent to the generative data source. Pure
// string assembly so it stays trivially unit-testable.

use crate::trend::FetchParams;

/// Lower/upper bound on total result size when watched names are present.
pub const TRACKED_RESULT_MIN: usize = 5;
pub const TRACKED_RESULT_MAX: usize = 7;

/// Render the full instruction for one fetch.
///
/// `organic_count` sizes the result when the watch registry is empty;
/// with watched names present, every one of them must appear and the
/// total is bounded by [`TRACKED_RESULT_MIN`]..=[`TRACKED_RESULT_MAX`].
pub fn build_prompt(params: &FetchParams, watched: &[String], organic_count: usize) -> String {
    let platform_context = if params.platform == "All Platforms" {
        "across major social media platforms".to_string()
    } else {
        format!("on \"{}\"", params.platform)
    };

    let country_context = if !params.region.is_empty() {
        format!("in the state/province of {}, {}", params.region, params.country)
    } else if params.country == "Worldwide" {
        "globally".to_string()
    } else {
        format!("in {}", params.country)
    };

    let category_context = if params.category == "All" {
        String::new()
    } else {
        format!(" within the \"{}\" category", params.category)
    };

    let tracking_context = if watched.is_empty() {
        format!("Generate a list of {organic_count} currently trending topics.")
    } else {
        format!(
            "In addition to the organic trends, you MUST provide data for the following \
             specific trends: {}. The total number of trends should be between {} and {}.",
            watched.join(", "),
            TRACKED_RESULT_MIN,
            TRACKED_RESULT_MAX,
        )
    };

    format!(
        "You are a social media trend analysis engine. Your task is to generate a list of \
         currently trending topics {country_context} {platform_context}{category_context}.\n\
         {tracking_context}\n\
         For each topic, provide a plausible-sounding name (like a hashtag), a one-sentence \
         summary, a realistic \"posts per minute\" volume (between 500 and 20,000), a sentiment \
         ('Positive', 'Neutral', or 'Negative'), a sentiment score (an integer from 0 for very \
         negative to 100 for very positive, with 50 being neutral), a plausible URL to the trend \
         on a social media site (e.g., https://x.com/search?q=HASHTAG), and a small change value \
         (between -500 and +500) indicating its recent momentum.\n\
         Ensure the output is a valid JSON array of trend objects matching the provided schema. \
         Do not include any markdown formatting or the ```json wrapper. Avoid duplicating trends."
    )
}
